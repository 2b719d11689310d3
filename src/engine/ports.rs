// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Input and output ports embedded in nodes.
//!
//! Ports start out unwired. The process wires them while the graph is built:
//! an output port receives the broadcast adapter it emits into, an input port
//! receives the consumer end of one of that adapter's queues.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::data::Frozen;
use crate::engine::adapter::BroadcastAdapter;
use crate::errors::PipelineError;
use crate::traits::{NodeId, NodeWithInput};

/// Lazy, single-pass stream of records from one producer.
///
/// `next` waits while the queue is empty and the producer has not yet
/// signalled the end. Records buffered before the end are always delivered;
/// `None` is only returned once the queue is closed and drained.
pub struct InputStream<T> {
    producer: NodeId,
    receiver: mpsc::UnboundedReceiver<Frozen<T>>,
    received: u64,
}

impl<T> InputStream<T> {
    pub(crate) fn new(producer: NodeId, receiver: mpsc::UnboundedReceiver<Frozen<T>>) -> Self {
        Self {
            producer,
            receiver,
            received: 0,
        }
    }

    pub async fn next(&mut self) -> Option<Frozen<T>> {
        let item = self.receiver.recv().await;
        if item.is_some() {
            self.received += 1;
        }
        item
    }

    /// Drain the rest of the stream into memory.
    pub async fn collect(mut self) -> Vec<Frozen<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await {
            items.push(item);
        }
        items
    }

    /// The node whose output feeds this stream.
    pub fn producer(&self) -> NodeId {
        self.producer
    }

    /// Records taken from the stream so far.
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Records buffered and not yet taken.
    pub fn buffered(&self) -> usize {
        self.receiver.len()
    }
}

impl<T> fmt::Debug for InputStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputStream")
            .field("producer", &self.producer)
            .field("received", &self.received)
            .finish()
    }
}

/// Which input slot of a consumer a stream lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSlot {
    Primary,
    Secondary,
}

impl fmt::Display for InputSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSlot::Primary => write!(f, "#1"),
            InputSlot::Secondary => write!(f, "#2"),
        }
    }
}

/// An input slot: bound exactly once, then owned by the node.
pub struct InputPort<T> {
    stream: Option<InputStream<T>>,
    bound: bool,
}

impl<T> InputPort<T> {
    pub fn new() -> Self {
        Self {
            stream: None,
            bound: false,
        }
    }

    /// True once the port has been wired, even after the stream was taken.
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn bind(&mut self, stream: InputStream<T>) -> Result<(), PipelineError> {
        if self.bound {
            return Err(PipelineError::InputAlreadyBound);
        }
        self.stream = Some(stream);
        self.bound = true;
        Ok(())
    }

    /// Borrow the bound stream.
    pub fn stream(&mut self) -> Result<&mut InputStream<T>, PipelineError> {
        self.stream.as_mut().ok_or(PipelineError::InputNotBound)
    }

    /// Move the bound stream out, e.g. to read two inputs concurrently.
    pub fn take(&mut self) -> Result<InputStream<T>, PipelineError> {
        self.stream.take().ok_or(PipelineError::InputNotBound)
    }

    /// Producer feeding this port, if bound.
    pub fn producer(&self) -> Option<NodeId> {
        self.stream.as_ref().map(InputStream::producer)
    }
}

impl<T> Default for InputPort<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for InputPort<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputPort")
            .field("bound", &self.bound)
            .field("producer", &self.producer())
            .finish()
    }
}

/// First unbound slot of a consumer, primary before secondary.
pub(crate) fn first_open_slot<T, I>(node: &mut I) -> Option<InputSlot>
where
    I: NodeWithInput<T> + ?Sized,
{
    if !node.input_port().is_bound() {
        return Some(InputSlot::Primary);
    }
    match node.input2_port() {
        Some(port) if !port.is_bound() => Some(InputSlot::Secondary),
        _ => None,
    }
}

/// The port behind `slot`, if the node has one.
pub(crate) fn slot_port<T, I>(node: &mut I, slot: InputSlot) -> Option<&mut InputPort<T>>
where
    I: NodeWithInput<T> + ?Sized,
{
    match slot {
        InputSlot::Primary => Some(node.input_port()),
        InputSlot::Secondary => node.input2_port(),
    }
}

/// The emitting side of a node.
///
/// Emitting moves the record into the adapter, which freezes it; the producer
/// cannot touch it afterwards. A port nobody attached to discards what it is
/// given.
pub struct OutputPort<T> {
    adapter: Option<Arc<BroadcastAdapter<T>>>,
    ended: bool,
    discarded: u64,
}

impl<T: Send + Sync + 'static> OutputPort<T> {
    pub fn new() -> Self {
        Self {
            adapter: None,
            ended: false,
            discarded: 0,
        }
    }

    pub(crate) fn set_emitter(&mut self, adapter: Arc<BroadcastAdapter<T>>) {
        self.adapter = Some(adapter);
    }

    /// True once at least one consumer was attached to this output.
    pub fn is_wired(&self) -> bool {
        self.adapter.is_some()
    }

    /// Push one record to every attached consumer. Never waits.
    pub fn emit(&mut self, item: T) -> Result<(), PipelineError> {
        match &self.adapter {
            Some(adapter) => adapter.emit(item),
            None if self.ended => Err(PipelineError::EmitAfterEnd {
                output: "unwired output".to_string(),
            }),
            None => {
                self.discarded += 1;
                if self.discarded == 1 {
                    tracing::trace!("Output port has no consumers; discarding emitted records");
                }
                Ok(())
            }
        }
    }

    /// Declare that no further records will be emitted.
    pub fn signal_end(&mut self) {
        match &self.adapter {
            Some(adapter) => {
                adapter.signal_end();
            }
            None if self.ended => {
                tracing::warn!("signal_end called more than once on an unwired output port");
            }
            None => {}
        }
        self.ended = true;
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Records delivered to the adapter, or discarded when unwired.
    pub fn emitted(&self) -> u64 {
        self.adapter
            .as_ref()
            .map(|adapter| adapter.emitted())
            .unwrap_or(self.discarded)
    }
}

impl<T: Send + Sync + 'static> Default for OutputPort<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for OutputPort<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputPort")
            .field("wired", &self.adapter.is_some())
            .field("ended", &self.ended)
            .finish()
    }
}
