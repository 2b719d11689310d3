// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The node contract.
//!
//! A node is described by the capabilities it implements rather than by a
//! class hierarchy:
//!
//! * every node implements [`Node`] (identity, context binding, `execute`)
//! * a node with an output port implements [`NodeWithOutput<T>`]
//! * a node with an input port implements [`NodeWithInput<T>`]; join/merge
//!   style nodes also override [`NodeWithInput::input2_port`]
//!
//! A sink has only an input, a source only an output, a transform both.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::context::PipelineContext;
use crate::engine::{InputPort, OutputPort};

/// Process-unique node identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a fresh id. Ids are never reused within a process.
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lets the orchestrator recover a node's concrete type from `dyn Node`.
///
/// Implemented for every `'static + Send` type; nodes never implement it by
/// hand. Call it on `&mut dyn Node`, not on `Box<dyn Node>`, or the box
/// itself is what gets downcast.
pub trait AsAny: Any + Send {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + Send> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Identity, context binding and the unit of work every node performs.
#[async_trait]
pub trait Node: AsAny {
    fn id(&self) -> NodeId;

    /// Human-readable label used in logs and reports.
    fn name(&self) -> &str;

    /// Called once by the process, after the context initializer has run and
    /// before the node's task is spawned.
    fn bind_context(&mut self, context: Arc<PipelineContext>);

    /// Run the node to completion inside its own task.
    ///
    /// Read every input stream to exhaustion, emit zero or more records, then
    /// call [`OutputPort::signal_end`] exactly once, even when nothing was
    /// emitted. Consumers block until they see that end.
    async fn execute(&mut self) -> anyhow::Result<()>;

    /// Terminal result published into the process report.
    fn summary(&self) -> Option<serde_json::Value> {
        None
    }
}

/// Output capability: the node emits `T` records through a broadcast adapter.
pub trait NodeWithOutput<T>: Node {
    fn output_port(&mut self) -> &mut OutputPort<T>;
}

/// Input capability: the node consumes one (or two) streams of `T`.
pub trait NodeWithInput<T>: Node {
    fn input_port(&mut self) -> &mut InputPort<T>;

    /// Second input slot for dual-input nodes. Slots are filled in attachment
    /// order: the primary slot first, then this one.
    fn input2_port(&mut self) -> Option<&mut InputPort<T>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_ids_are_unique_and_increasing() {
        let first = NodeId::next();
        let second = NodeId::next();
        assert_ne!(first, second);
        assert!(second > first);
        assert_eq!(format!("{}", first), format!("#{}", first.as_u64()));
    }
}
