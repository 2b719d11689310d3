// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Broadcast fan-out from one output to every attached consumer.
//!
//! Each consumer gets its own unbounded queue (a tokio `mpsc` channel), so a
//! slow consumer never holds up the producer or its siblings. `emit` walks the
//! queues in attachment order in a single pass, which gives every consumer the
//! same relative order of records. `signal_end` drops the senders: consumers
//! drain what is buffered, then see the end of their stream.
//!
//! There is no back-pressure. A producer that outpaces a consumer grows that
//! consumer's queue without limit.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use crate::config::consts::EMIT_PROGRESS_INTERVAL;
use crate::data::Frozen;
use crate::engine::ports::{first_open_slot, InputStream};
use crate::errors::PipelineError;
use crate::observability::messages::adapter::{
    ConsumerAttached, ConsumerGone, DuplicateEndSignal, EmitProgress, FirstItemEmitted,
    StreamEnded,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{NodeId, NodeWithInput};

/// Type-erased view of an adapter, used by the process for bookkeeping.
pub trait IoAdapter: Send + Sync {
    fn output_node(&self) -> NodeId;

    /// Name of the record type flowing through this adapter.
    fn item_type(&self) -> &'static str;

    fn emitted(&self) -> u64;

    fn is_ended(&self) -> bool;

    fn consumer_count(&self) -> usize;

    /// Signal the end on behalf of the producer.
    fn end_stream(&self) -> bool;

    /// Release every queue and any stream nobody claimed.
    fn dispose(&self);

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

struct AdapterState<T> {
    /// Attachment order; `emit` walks this list front to back.
    queues: Vec<(NodeId, mpsc::UnboundedSender<Frozen<T>>)>,
    consumers: Vec<NodeId>,
    unclaimed: HashMap<NodeId, InputStream<T>>,
    ended: bool,
}

/// Fan-out channel owned by exactly one output-bearing node.
pub struct BroadcastAdapter<T> {
    output: NodeId,
    output_name: String,
    state: Mutex<AdapterState<T>>,
    emitted: AtomicU64,
}

impl<T: Send + Sync + 'static> BroadcastAdapter<T> {
    pub fn new(output: NodeId, output_name: impl Into<String>) -> Self {
        Self {
            output,
            output_name: output_name.into(),
            state: Mutex::new(AdapterState {
                queues: Vec::new(),
                consumers: Vec::new(),
                unclaimed: HashMap::new(),
                ended: false,
            }),
            emitted: AtomicU64::new(0),
        }
    }

    /// Register a dedicated queue for `consumer`.
    ///
    /// Fails with [`PipelineError::DuplicateInput`] when the consumer has no
    /// unbound input slot left. Returns `Ok(false)` without changing anything
    /// when the consumer already has a queue on this adapter.
    pub fn attach_consumer<I>(&self, consumer: &mut I) -> Result<bool, PipelineError>
    where
        I: NodeWithInput<T> + ?Sized,
    {
        if first_open_slot(consumer).is_none() {
            return Err(PipelineError::DuplicateInput {
                node: consumer.id(),
                name: consumer.name().to_string(),
            });
        }

        let consumer_id = consumer.id();
        let mut state = self.lock();
        if state.consumers.contains(&consumer_id) {
            return Ok(false);
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        state.queues.push((consumer_id, sender));
        state.consumers.push(consumer_id);
        state
            .unclaimed
            .insert(consumer_id, InputStream::new(self.output, receiver));

        ConsumerAttached {
            output: &self.output_name,
            consumer: consumer.name(),
            consumer_count: state.consumers.len(),
        }
        .log();
        Ok(true)
    }

    /// Hand out the consuming end of `consumer`'s queue. Each stream can be
    /// claimed once.
    pub fn consuming_stream(&self, consumer: NodeId) -> Result<InputStream<T>, PipelineError> {
        self.lock()
            .unclaimed
            .remove(&consumer)
            .ok_or(PipelineError::UnknownConsumer {
                output: self.output,
                consumer,
            })
    }

    /// Freeze `item` and push the same shared record into every queue.
    pub fn emit(&self, item: T) -> Result<(), PipelineError> {
        let mut state = self.lock();
        if state.ended {
            return Err(PipelineError::EmitAfterEnd {
                output: format!("{} {}", self.output_name, self.output),
            });
        }

        let frozen = Frozen::new(item);
        let count = self.emitted.fetch_add(1, Ordering::Relaxed) + 1;
        if count == 1 {
            FirstItemEmitted {
                output: &self.output_name,
            }
            .log();
        }

        // A closed queue means its consumer dropped the stream; the others
        // still get the record.
        let mut gone = Vec::new();
        for (consumer, queue) in &state.queues {
            if queue.send(frozen.clone()).is_err() {
                gone.push(*consumer);
            }
        }
        if !gone.is_empty() {
            state.queues.retain(|(consumer, _)| !gone.contains(consumer));
            for consumer in gone {
                ConsumerGone {
                    output: &self.output_name,
                    consumer,
                }
                .log();
            }
        }

        if count % EMIT_PROGRESS_INTERVAL == 0 {
            EmitProgress {
                output: &self.output_name,
                emitted: count,
            }
            .log();
        }
        Ok(())
    }

    /// Mark every queue complete. Returns `false` if the end was already
    /// signalled.
    pub fn signal_end(&self) -> bool {
        let mut state = self.lock();
        if state.ended {
            DuplicateEndSignal {
                output: &self.output_name,
            }
            .log();
            return false;
        }
        state.ended = true;
        state.queues.clear();

        StreamEnded {
            output: &self.output_name,
            emitted: self.emitted(),
            consumer_count: state.consumers.len(),
        }
        .log();
        true
    }

    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    pub fn consumers(&self) -> Vec<NodeId> {
        self.lock().consumers.clone()
    }

    fn lock(&self) -> MutexGuard<'_, AdapterState<T>> {
        // Every critical section leaves the state consistent, so a poisoned
        // lock is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Send + Sync + 'static> IoAdapter for BroadcastAdapter<T> {
    fn output_node(&self) -> NodeId {
        self.output
    }

    fn item_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn emitted(&self) -> u64 {
        BroadcastAdapter::emitted(self)
    }

    fn is_ended(&self) -> bool {
        self.lock().ended
    }

    fn consumer_count(&self) -> usize {
        self.lock().consumers.len()
    }

    fn end_stream(&self) -> bool {
        self.signal_end()
    }

    fn dispose(&self) {
        let mut state = self.lock();
        state.queues.clear();
        state.unclaimed.clear();
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl<T> fmt::Debug for BroadcastAdapter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BroadcastAdapter")
            .field("output", &self.output)
            .field("output_name", &self.output_name)
            .field("emitted", &self.emitted.load(Ordering::Relaxed))
            .finish()
    }
}
