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

//! Per-partition offset bookkeeping.
//!
//! The ledger keeps two representations of the out-of-order acknowledgements:
//! a structured set for local mutation and a delimited string for opaque
//! transport through the external commit API. Only one side is authoritative
//! at rest; [`PartitionConsumer::state`](crate::PartitionConsumer::state)
//! reconciles them lazily when exposing a snapshot.

use ahash::AHashSet;
use tracing::warn;

const METADATA_DELIMITER: char = ',';

/// Record of the last confirmed offset plus offsets acknowledged out of order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetLedger {
    /// Last confirmed offset, `-1` when nothing has been confirmed yet.
    pub offset: i64,
    /// Offsets acknowledged out of order, not yet folded into `offset`
    /// because a lower offset is still outstanding.
    pub pending: AHashSet<i64>,
    /// Serialized form of `pending`, exchanged opaquely through the external
    /// commit API.
    pub metadata: String,
}

impl Default for OffsetLedger {
    fn default() -> Self {
        Self {
            offset: -1,
            pending: AHashSet::new(),
            metadata: String::new(),
        }
    }
}

impl OffsetLedger {
    /// Creates a ledger resuming from a previously committed offset and its
    /// opaque metadata, as recovered from the external commit store.
    pub fn new(offset: i64, metadata: String) -> Self {
        Self {
            offset,
            pending: AHashSet::new(),
            metadata,
        }
    }

    /// Renders the pending set into `metadata` as a delimited decimal list,
    /// with a trailing delimiter after the last entry and an empty string for
    /// an empty set.
    pub fn serialize(&mut self) {
        self.metadata = self
            .pending
            .iter()
            .map(|offset| format!("{offset}{METADATA_DELIMITER}"))
            .collect();
    }

    /// Parses `metadata` back into the pending set.
    ///
    /// Malformed tokens are skipped: the metadata originates from the
    /// external commit store and may have been produced by a mismatched
    /// client version, and a corrupt entry must never block consumption.
    pub fn deserialize(&mut self) {
        for token in self.metadata.split(METADATA_DELIMITER) {
            if token.is_empty() {
                continue;
            }

            match token.parse::<i64>() {
                Ok(offset) => {
                    self.pending.insert(offset);
                }
                Err(_) => {
                    warn!("Skipping malformed offset token in commit metadata: {token}");
                }
            }
        }
    }

    /// Selects the offset to resume consumption from.
    ///
    /// With a confirmed offset and a non-empty pending set this returns an
    /// *unspecified* member of the pending set, not necessarily the minimum.
    /// Resuming past an unacknowledged offset can lose messages after a crash
    /// between partial acknowledgements; deployments that need a
    /// deterministic resume point should use [`Self::next_offset_min`].
    pub fn next_offset(&self, fallback: i64) -> i64 {
        if self.offset > -1 {
            if let Some(&pending) = self.pending.iter().next() {
                return pending;
            }
            return self.offset;
        }
        fallback
    }

    /// Like [`Self::next_offset`], but resumes from the minimum pending
    /// offset so no pending acknowledgement is ever skipped on restart.
    pub fn next_offset_min(&self, fallback: i64) -> i64 {
        if self.offset > -1 {
            if let Some(&pending) = self.pending.iter().min() {
                return pending;
            }
            return self.offset;
        }
        fallback
    }
}

/// Snapshot of a partition's offset state.
///
/// `dirty` is true when a confirmed offset or pending-set update has not yet
/// been acknowledged as committed upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionState {
    pub ledger: OffsetLedger,
    pub dirty: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_ledger(offset: i64, pending: &[i64]) -> OffsetLedger {
        OffsetLedger {
            offset,
            pending: pending.iter().copied().collect(),
            metadata: String::new(),
        }
    }

    #[test]
    fn test_next_offset_returns_fallback_without_confirmed_offset() {
        let ledger = OffsetLedger::default();
        assert_eq!(ledger.next_offset(-1), -1);
        assert_eq!(ledger.next_offset(-2), -2);
        assert_eq!(ledger.next_offset(42), 42);
    }

    #[test]
    fn test_next_offset_returns_confirmed_offset_without_pending() {
        let ledger = create_test_ledger(100, &[]);
        assert_eq!(ledger.next_offset(-1), 100);
        assert_eq!(ledger.next_offset(7), 100);
    }

    #[test]
    fn test_next_offset_returns_a_pending_member() {
        let ledger = create_test_ledger(100, &[101, 103, 105]);
        let next = ledger.next_offset(-1);
        assert!(ledger.pending.contains(&next));
    }

    #[test]
    fn test_next_offset_min_returns_minimum_pending_member() {
        let ledger = create_test_ledger(100, &[105, 101, 103]);
        assert_eq!(ledger.next_offset_min(-1), 101);
    }

    #[test]
    fn test_serialize_empty_pending_set_yields_empty_metadata() {
        let mut ledger = OffsetLedger::default();
        ledger.serialize();
        assert_eq!(ledger.metadata, "");
    }

    #[test]
    fn test_serialize_appends_trailing_delimiter() {
        let mut ledger = create_test_ledger(0, &[5]);
        ledger.serialize();
        assert_eq!(ledger.metadata, "5,");
    }

    #[test]
    fn test_round_trip_reproduces_pending_set() {
        let mut ledger = create_test_ledger(9, &[10, 12, 15, 9_000_000_000]);
        ledger.serialize();

        let mut restored = OffsetLedger::new(9, ledger.metadata.clone());
        restored.deserialize();
        assert_eq!(restored.pending, ledger.pending);
    }

    #[test]
    fn test_deserialize_skips_malformed_tokens() {
        let mut ledger = OffsetLedger::new(0, "10,garbage,12,".to_owned());
        ledger.deserialize();
        assert_eq!(ledger.pending, [10, 12].into_iter().collect());
    }

    #[test]
    fn test_deserialize_of_empty_metadata_is_a_noop() {
        let mut ledger = OffsetLedger::default();
        ledger.deserialize();
        assert!(ledger.pending.is_empty());
    }
}
