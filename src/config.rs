/* Licensed to the Apache Software Foundation (ASF) under one
 * or more contributor license agreements.  See the NOTICE file
 * distributed with this work for additional information
 * regarding copyright ownership.  The ASF licenses this file
 * to you under the Apache License, Version 2.0 (the
 * "License"); you may not use this file except in compliance
 * with the License.  You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing,
 * software distributed under the License is distributed on an
 * "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
 * KIND, either express or implied.  See the License for the
 * specific language governing permissions and limitations
 * under the License.
 */

use serde::{Deserialize, Serialize};

use crate::assignment::Strategy;
use crate::error::MusterError;

/// Fallback sentinel: resume from the newest available offset.
pub const OFFSET_NEWEST: i64 = -1;

/// Fallback sentinel: resume from the oldest retained offset.
pub const OFFSET_OLDEST: i64 = -2;

/// Consumer-group configuration carried by the external coordination layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerGroupConfig {
    /// Partition-assignment strategy handed to the external assignment
    /// procedure.
    pub strategy: Strategy,
    /// Offset to resume from when a partition has no committed offset or the
    /// committed offset is no longer retained. Must be one of the sentinels,
    /// which the stream provider resolves to a concrete position.
    pub fallback_offset: i64,
    /// Capacity of the shared outbound message and error channels.
    pub channel_capacity: usize,
}

impl Default for ConsumerGroupConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Range,
            fallback_offset: OFFSET_NEWEST,
            channel_capacity: 256,
        }
    }
}

impl ConsumerGroupConfig {
    pub fn validate(&self) -> Result<(), MusterError> {
        if self.fallback_offset != OFFSET_NEWEST && self.fallback_offset != OFFSET_OLDEST {
            return Err(MusterError::InvalidConfiguration(format!(
                "fallback offset must be {OFFSET_NEWEST} (newest) or {OFFSET_OLDEST} (oldest), got {}",
                self.fallback_offset
            )));
        }

        if self.channel_capacity == 0 {
            return Err(MusterError::InvalidConfiguration(
                "channel capacity must be greater than zero".to_owned(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ConsumerGroupConfig::default().validate().is_ok());
    }

    #[test]
    fn test_oldest_fallback_is_valid() {
        let config = ConsumerGroupConfig {
            fallback_offset: OFFSET_OLDEST,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_concrete_fallback_offset_is_rejected() {
        let config = ConsumerGroupConfig {
            fallback_offset: 100,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MusterError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_zero_channel_capacity_is_rejected() {
        let config = ConsumerGroupConfig {
            channel_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MusterError::InvalidConfiguration(_))
        ));
    }
}
