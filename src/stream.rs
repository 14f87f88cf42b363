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

//! The capability seam between this crate and the underlying log client.

use std::future::Future;

use crate::error::MusterError;
use crate::message::ConsumerMessage;

/// Capability required from the underlying log-streaming client.
///
/// Implementations open a live stream over one partition starting at the
/// given offset. A request below the retained range must fail with
/// [`MusterError::OffsetOutOfRange`] so the consumer can retry once at its
/// fallback offset; any other error aborts the partition's startup.
pub trait StreamProvider: Send + Sync {
    fn open_stream(
        &self,
        topic: &str,
        partition: i32,
        start_offset: i64,
    ) -> impl Future<Output = Result<PartitionStream, MusterError>> + Send;
}

/// Control half of an open partition stream.
///
/// Held by the [`PartitionConsumer`](crate::PartitionConsumer) for the
/// stream's lifetime; the message and error halves are consumed by the
/// forwarding loop.
pub trait StreamControl: Send + Sync {
    /// Closes the stream. The provider stops producing and disconnects the
    /// message and error channels.
    fn close(&self) -> Result<(), MusterError>;

    /// Repositions the stream's read cursor.
    fn set_offset(&self, offset: i64);
}

/// An open stream over a single partition.
///
/// The stream yields messages in partition order on `messages` and
/// stream-level errors separately on `errors`; both channels disconnect when
/// the stream ends or is closed through `control`.
pub struct PartitionStream {
    pub messages: flume::Receiver<ConsumerMessage>,
    pub errors: flume::Receiver<MusterError>,
    pub control: Box<dyn StreamControl>,
}
