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

//! Registry of active partition consumers.
//!
//! The external rebalance procedure stores consumers here one at a time and
//! tears them down in bulk: `stop` closes every held consumer concurrently
//! behind a join barrier, then `clear` removes the entries.

use std::sync::Arc;

use ahash::AHashMap;
use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::debug;

use super::TopicPartition;
use super::consumer::PartitionConsumer;
use crate::offsets::PartitionState;

/// Concurrency-safe map from topic-partition to its consumer.
///
/// Lookups, snapshots and aggregate queries take the read side of the lock;
/// insertion and bulk removal take the write side. Per-consumer state has its
/// own lock, so operations on different partitions never contend.
#[derive(Debug, Default)]
pub struct PartitionRegistry {
    partitions: RwLock<AHashMap<TopicPartition, Arc<PartitionConsumer>>>,
}

impl PartitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the consumer for a partition.
    ///
    /// Always succeeds: an absent partition yields an empty handle whose
    /// accessors return zero-value state and whose mutations are no-ops.
    pub async fn fetch(&self, topic: &str, partition: i32) -> PartitionHandle {
        let partitions = self.partitions.read().await;
        let key = TopicPartition::new(topic, partition);
        PartitionHandle(partitions.get(&key).cloned())
    }

    /// Inserts or replaces the consumer for a partition.
    pub async fn store(&self, topic: &str, partition: i32, consumer: PartitionConsumer) {
        let mut partitions = self.partitions.write().await;
        partitions.insert(TopicPartition::new(topic, partition), Arc::new(consumer));
    }

    /// Returns true when any held consumer has local state not yet
    /// acknowledged by the external committer.
    pub async fn has_dirty(&self) -> bool {
        let partitions = self.partitions.read().await;
        for consumer in partitions.values() {
            if consumer.state().await.dirty {
                return true;
            }
        }
        false
    }

    /// Returns an immutable copy of every held partition's state, for batch
    /// offset-commit construction.
    pub async fn snapshot(&self) -> AHashMap<TopicPartition, PartitionState> {
        let partitions = self.partitions.read().await;
        let mut snapshot = AHashMap::with_capacity(partitions.len());
        for (key, consumer) in partitions.iter() {
            snapshot.insert(key.clone(), consumer.state().await);
        }
        snapshot
    }

    /// Closes every held consumer concurrently and returns once all
    /// forwarding loops have exited.
    ///
    /// Total latency is bounded by the slowest single partition, not the sum
    /// of all partitions.
    pub async fn stop(&self) {
        let partitions = self.partitions.read().await;
        join_all(partitions.values().map(|consumer| consumer.close())).await;
        debug!("Stopped {} partition consumers", partitions.len());
    }

    /// Removes all entries. Called after [`Self::stop`] during a rebalance.
    pub async fn clear(&self) {
        let mut partitions = self.partitions.write().await;
        partitions.clear();
    }

    /// Returns, per topic, the ascending list of held partition ids.
    pub async fn info(&self) -> AHashMap<String, Vec<i32>> {
        let partitions = self.partitions.read().await;
        let mut info: AHashMap<String, Vec<i32>> = AHashMap::new();
        for key in partitions.keys() {
            info.entry(key.topic.clone()).or_default().push(key.partition);
        }
        for ids in info.values_mut() {
            ids.sort_unstable();
        }
        info
    }

    pub async fn len(&self) -> usize {
        self.partitions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.partitions.read().await.is_empty()
    }
}

/// A non-owning lookup result from [`PartitionRegistry::fetch`].
///
/// Wraps the consumer when the partition is held; otherwise every accessor
/// returns a zero-value result, so callers can query any partition, present
/// or not, without branching.
#[derive(Debug, Clone, Default)]
pub struct PartitionHandle(Option<Arc<PartitionConsumer>>);

impl PartitionHandle {
    /// An empty handle, equivalent to fetching an absent partition.
    pub fn empty() -> Self {
        Self(None)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Snapshot of the partition's state, or the zero-value state when the
    /// partition is absent.
    pub async fn state(&self) -> PartitionState {
        match &self.0 {
            Some(consumer) => consumer.state().await,
            None => PartitionState::default(),
        }
    }

    pub async fn mark_offset(&self, offset: i64, metadata: &str) {
        if let Some(consumer) = &self.0 {
            consumer.mark_offset(offset, metadata).await;
        }
    }

    pub async fn mark_committed(&self, offset: i64) {
        if let Some(consumer) = &self.0 {
            consumer.mark_committed(offset).await;
        }
    }

    pub async fn add_pending_offset(&self, offset: i64) {
        if let Some(consumer) = &self.0 {
            consumer.add_pending_offset(offset).await;
        }
    }

    pub async fn remove_pending_offset(&self, offset: i64) {
        if let Some(consumer) = &self.0 {
            consumer.remove_pending_offset(offset).await;
        }
    }

    pub fn set_offset(&self, offset: i64) {
        if let Some(consumer) = &self.0 {
            consumer.set_offset(offset);
        }
    }
}
