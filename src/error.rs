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

use thiserror::Error;

/// The error type for partition consumption.
///
/// `OffsetOutOfRange` is the only recoverable variant during stream startup:
/// the consumer retries once at the fallback offset and never surfaces it.
/// Every other variant either aborts construction or travels through the
/// shared error channel for application-level handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MusterError {
    /// Requested offset is no longer retained by the partition.
    #[error("Offset {offset} is out of range for partition {partition} of topic {topic}")]
    OffsetOutOfRange {
        topic: String,
        partition: i32,
        offset: i64,
    },
    /// Stream could not be opened for any other reason.
    #[error("Cannot open stream for partition {partition} of topic {topic}: {reason}")]
    CannotOpenStream {
        topic: String,
        partition: i32,
        reason: String,
    },
    /// Runtime error reported by an open partition stream.
    #[error("Stream error on partition {partition} of topic {topic}: {reason}")]
    Stream {
        topic: String,
        partition: i32,
        reason: String,
    },
    /// The partition stream has been closed.
    #[error("Partition stream is closed")]
    StreamClosed,
    /// Configuration validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
