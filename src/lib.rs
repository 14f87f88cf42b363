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

//! Partition consumption and offset tracking core for distributed log
//! consumer groups.
//!
//! The crate manages, per topic-partition, a live message stream with
//! at-least-once commit semantics: a [`PartitionConsumer`] forwards one
//! partition's messages and errors to consumer-global channels while an
//! [`OffsetLedger`] tracks confirmed and out-of-order acknowledged offsets,
//! and the [`PartitionRegistry`] lets an external group-coordination
//! protocol add, remove and tear down partitions during rebalances.

mod assignment;
mod config;
mod error;
mod message;
mod offsets;
mod partitions;
mod stream;

pub use assignment::{Strategy, diff};
pub use config::{ConsumerGroupConfig, OFFSET_NEWEST, OFFSET_OLDEST};
pub use error::MusterError;
pub use message::ConsumerMessage;
pub use offsets::{OffsetLedger, PartitionState};
pub use partitions::{PartitionConsumer, PartitionHandle, PartitionRegistry, TopicPartition};
pub use stream::{PartitionStream, StreamControl, StreamProvider};
