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

//! Vocabulary for the external partition-assignment procedure.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Strategy for assigning partitions to group members.
///
/// The assignment algorithm itself lives in the external group-coordination
/// protocol; this crate only carries the choice as configuration.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Strategy {
    /// Assigns contiguous partition ranges to members.
    /// Example with six partitions and two consumers:
    ///   C1: [0, 1, 2]
    ///   C2: [3, 4, 5]
    #[default]
    Range,
    /// Assigns partitions by alternating over members.
    /// Example with six partitions and two consumers:
    ///   C1: [0, 2, 4]
    ///   C2: [1, 3, 5]
    RoundRobin,
}

/// Returns the partition ids present in `current` but absent from
/// `assigned`.
///
/// Both sequences must be ascending and deduplicated; `assigned` is probed
/// by binary search. The external rebalance procedure uses this to determine
/// which partitions must be torn down when the assigned set changes.
pub fn diff(current: &[i32], assigned: &[i32]) -> Vec<i32> {
    current
        .iter()
        .copied()
        .filter(|id| assigned.binary_search(id).is_err())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(&[0, 1, 2, 3, 4, 5], &[1, 3, 5], &[0, 2, 4]; "removes interleaved ids")]
    #[test_case(&[0, 1, 2], &[0, 1, 2], &[]; "identical sequences")]
    #[test_case(&[], &[1, 3, 5], &[]; "empty current")]
    #[test_case(&[0, 1, 2], &[], &[0, 1, 2]; "empty assigned")]
    fn test_diff(current: &[i32], assigned: &[i32], expected: &[i32]) {
        assert_eq!(diff(current, assigned), expected);
    }

    #[test]
    fn test_strategy_defaults_to_range() {
        assert_eq!(Strategy::default(), Strategy::Range);
    }

    #[test]
    fn test_strategy_round_trips_through_strings() {
        assert_eq!(Strategy::Range.to_string(), "range");
        assert_eq!(Strategy::RoundRobin.to_string(), "roundrobin");
        assert_eq!("range".parse::<Strategy>().unwrap(), Strategy::Range);
        assert_eq!(
            "roundrobin".parse::<Strategy>().unwrap(),
            Strategy::RoundRobin
        );
    }

    #[test]
    fn test_strategy_serde_uses_lowercase_names() {
        let serialized = serde_json::to_string(&Strategy::RoundRobin).unwrap();
        assert_eq!(serialized, "\"roundrobin\"");
        let deserialized: Strategy = serde_json::from_str("\"range\"").unwrap();
        assert_eq!(deserialized, Strategy::Range);
    }
}
