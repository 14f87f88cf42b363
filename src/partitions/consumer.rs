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

//! Single-partition consumption.
//!
//! Each consumer owns one partition stream and runs a dedicated forwarding
//! task that fans messages and stream errors into the consumer-global
//! channels. Shutdown is cooperative and two-phase: `close` disconnects the
//! `dying` signal and then waits on `dead` until the forwarding task has
//! observably exited, so no delivery can race past a completed close.

use std::fmt;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::MusterError;
use crate::message::ConsumerMessage;
use crate::offsets::{OffsetLedger, PartitionState};
use crate::stream::{PartitionStream, StreamControl, StreamProvider};

/// Consumes a single partition of a topic.
pub struct PartitionConsumer {
    topic: String,
    partition: i32,
    control: Box<dyn StreamControl>,
    state: Mutex<PartitionState>,
    shutdown: Mutex<Shutdown>,
    dead: flume::Receiver<()>,
}

struct Shutdown {
    /// Dropped on close; the forwarding task observes the disconnect.
    dying: Option<flume::Sender<()>>,
    /// Result of the first close, returned by every subsequent close.
    result: Option<Result<(), MusterError>>,
}

impl PartitionConsumer {
    /// Opens a stream for the partition and spawns its forwarding task.
    ///
    /// The stream starts at `ledger.next_offset(fallback_offset)`. If the
    /// provider reports that offset as out of the retained range, the
    /// ledger's confirmed offset is reset and the request is retried once at
    /// `fallback_offset`. Any other provider error aborts construction.
    pub async fn open<P: StreamProvider>(
        provider: &P,
        topic: &str,
        partition: i32,
        mut ledger: OffsetLedger,
        fallback_offset: i64,
        messages: flume::Sender<ConsumerMessage>,
        errors: flume::Sender<MusterError>,
    ) -> Result<Self, MusterError> {
        let start_offset = ledger.next_offset(fallback_offset);
        let stream = match provider.open_stream(topic, partition, start_offset).await {
            Ok(stream) => stream,
            Err(MusterError::OffsetOutOfRange { .. }) => {
                warn!(
                    "Offset {start_offset} for partition {partition} of topic {topic} is out of the retained range, resuming from the fallback offset"
                );
                ledger.offset = -1;
                provider.open_stream(topic, partition, fallback_offset).await?
            }
            Err(err) => return Err(err),
        };

        let PartitionStream {
            messages: inbound_messages,
            errors: inbound_errors,
            control,
        } = stream;

        let (dying_tx, dying_rx) = flume::bounded(0);
        let (dead_tx, dead_rx) = flume::bounded(0);
        tokio::spawn(forward_loop(
            inbound_messages,
            inbound_errors,
            messages,
            errors,
            dying_rx,
            dead_tx,
        ));
        debug!("Opened consumer for partition {partition} of topic {topic}");

        Ok(Self {
            topic: topic.to_owned(),
            partition,
            control,
            state: Mutex::new(PartitionState {
                ledger,
                dirty: false,
            }),
            shutdown: Mutex::new(Shutdown {
                dying: Some(dying_tx),
                result: None,
            }),
            dead: dead_rx,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn partition(&self) -> i32 {
        self.partition
    }

    /// Closes the underlying stream, signals the forwarding task and waits
    /// until it has exited.
    ///
    /// Idempotent: the first call's result is memoized and returned by every
    /// later call, and a later call never blocks past the first close's
    /// completion.
    pub async fn close(&self) -> Result<(), MusterError> {
        let mut shutdown = self.shutdown.lock().await;
        if let Some(result) = shutdown.result.clone() {
            return result;
        }

        let result = self.control.close();
        shutdown.dying.take();
        let _ = self.dead.recv_async().await;
        debug!(
            "Closed consumer for partition {} of topic {}",
            self.partition, self.topic
        );

        shutdown.result = Some(result.clone());
        result
    }

    /// Returns a snapshot of the partition's offset state.
    ///
    /// Reconciles the dual pending-offset representation on the returned
    /// copy: serializes the pending set when metadata is empty, otherwise
    /// deserializes metadata when the pending set is empty.
    pub async fn state(&self) -> PartitionState {
        let mut snapshot = self.state.lock().await.clone();
        if snapshot.ledger.metadata.is_empty() {
            snapshot.ledger.serialize();
        } else if snapshot.ledger.pending.is_empty() {
            snapshot.ledger.deserialize();
        }
        snapshot
    }

    /// Advances the confirmed offset.
    ///
    /// Only strictly greater offsets take effect; the confirmed offset never
    /// moves backwards. A non-empty `metadata` is adopted alongside the
    /// advance.
    pub async fn mark_offset(&self, offset: i64, metadata: &str) {
        let mut state = self.state.lock().await;
        if offset > state.ledger.offset {
            state.ledger.offset = offset;
            if !metadata.is_empty() {
                state.ledger.metadata = metadata.to_owned();
            }
            state.dirty = true;
        }
    }

    /// Records that the external committer has persisted `offset`.
    ///
    /// The dirty flag is cleared only when the committed offset still equals
    /// the confirmed offset, or when a pending-set commit is in flight
    /// (non-empty metadata): a plain-offset commit must not clear dirty once
    /// a newer, not-yet-committed mark has superseded it.
    pub async fn mark_committed(&self, offset: i64) {
        let mut state = self.state.lock().await;
        if offset == state.ledger.offset || !state.ledger.metadata.is_empty() {
            state.dirty = false;
        }
    }

    /// Adds an offset acknowledged out of order to the pending set.
    pub async fn add_pending_offset(&self, offset: i64) {
        let mut state = self.state.lock().await;
        state.ledger.pending.insert(offset);
    }

    /// Removes an offset from the pending set.
    pub async fn remove_pending_offset(&self, offset: i64) {
        let mut state = self.state.lock().await;
        state.ledger.pending.remove(&offset);
    }

    /// Repositions the underlying stream cursor. Offset bookkeeping is left
    /// untouched; used when resuming after rebuilding a ledger out of band.
    pub fn set_offset(&self, offset: i64) {
        self.control.set_offset(offset);
    }
}

impl fmt::Debug for PartitionConsumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionConsumer")
            .field("topic", &self.topic)
            .field("partition", &self.partition)
            .finish_non_exhaustive()
    }
}

/// Forwards inbound messages and stream errors to the shared outbound
/// channels until the stream disconnects or `dying` fires.
///
/// Every forward races `dying` so a send in progress cannot block shutdown.
/// The `dead` sender is dropped on exit, releasing any `close` caller
/// blocked on it.
async fn forward_loop(
    inbound_messages: flume::Receiver<ConsumerMessage>,
    inbound_errors: flume::Receiver<MusterError>,
    messages: flume::Sender<ConsumerMessage>,
    errors: flume::Sender<MusterError>,
    dying: flume::Receiver<()>,
    _dead: flume::Sender<()>,
) {
    loop {
        tokio::select! {
            message = inbound_messages.recv_async() => {
                let Ok(message) = message else {
                    return;
                };
                tokio::select! {
                    sent = messages.send_async(message) => {
                        if sent.is_err() {
                            return;
                        }
                    }
                    _ = dying.recv_async() => return,
                }
            }
            error = inbound_errors.recv_async() => {
                let Ok(error) = error else {
                    return;
                };
                tokio::select! {
                    sent = errors.send_async(error) => {
                        if sent.is_err() {
                            return;
                        }
                    }
                    _ = dying.recv_async() => return,
                }
            }
            _ = dying.recv_async() => return,
        }
    }
}
