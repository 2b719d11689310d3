// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for process lifecycle and node task events.
//!
//! This module contains message types for logging events related to:
//! * Graph wiring (attachments, skipped duplicates)
//! * Process start, completion and failure
//! * Node task start, completion, faults and cancellation
//! * Teardown (adapter disposal, pool reclaim)

use crate::engine::InputSlot;
use crate::observability::messages::StructuredLog;
use crate::traits::NodeId;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A consumer slot was wired to an output.
///
/// # Log Level
/// `debug!`
pub struct InputAttached<'a> {
    pub output: &'a str,
    pub input: &'a str,
    pub slot: InputSlot,
}

impl Display for InputAttached<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Attached input {} of {} to the output of {}",
            self.slot, self.input, self.output
        )
    }
}

impl StructuredLog for InputAttached<'_> {
    fn log(&self) {
        tracing::debug!(
            output = self.output,
            input = self.input,
            slot = %self.slot,
            "{}", self
        );
    }
}

/// The same output/input pair was attached again; nothing changed.
///
/// # Log Level
/// `debug!`
pub struct AttachmentSkipped<'a> {
    pub output: &'a str,
    pub input: &'a str,
}

impl Display for AttachmentSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} is already attached to the output of {}; skipping",
            self.input, self.output
        )
    }
}

impl StructuredLog for AttachmentSkipped<'_> {
    fn log(&self) {
        tracing::debug!(output = self.output, input = self.input, "{}", self);
    }
}

/// Running the one-shot context initializer.
///
/// # Log Level
/// `debug!`
pub struct ContextInitializerRunning<'a> {
    pub process: &'a str,
}

impl Display for ContextInitializerRunning<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Running context initializer for ETL process '{}'", self.process)
    }
}

impl StructuredLog for ContextInitializerRunning<'_> {
    fn log(&self) {
        tracing::debug!(process = self.process, "{}", self);
    }
}

/// Every node task is about to be spawned.
///
/// # Log Level
/// `info!`
///
/// # Example
/// ```
/// use etlflow::observability::messages::process::ProcessStarted;
///
/// let msg = ProcessStarted {
///     process: "orders",
///     node_count: 4,
///     adapter_count: 3,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ProcessStarted<'a> {
    pub process: &'a str,
    pub node_count: usize,
    pub adapter_count: usize,
}

impl Display for ProcessStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting ETL process '{}' with {} node(s) and {} adapter(s)",
            self.process, self.node_count, self.adapter_count
        )
    }
}

impl StructuredLog for ProcessStarted<'_> {
    fn log(&self) {
        tracing::info!(
            process = self.process,
            node_count = self.node_count,
            adapter_count = self.adapter_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "process",
            span_name = name,
            process = self.process,
            node_count = self.node_count,
        )
    }
}

/// Every node task completed.
///
/// # Log Level
/// `info!`
pub struct ProcessCompleted<'a> {
    pub process: &'a str,
    pub node_count: usize,
    pub elapsed: Duration,
}

impl Display for ProcessCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "ETL process '{}' completed: {} node(s) in {:?}",
            self.process, self.node_count, self.elapsed
        )
    }
}

impl StructuredLog for ProcessCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            process = self.process,
            node_count = self.node_count,
            elapsed_ms = self.elapsed.as_millis() as u64,
            "{}", self
        );
    }
}

/// One or more node tasks did not complete.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ProcessFailed<'a> {
    pub process: &'a str,
    pub failed_count: usize,
    pub node_count: usize,
    pub elapsed: Duration,
}

impl Display for ProcessFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "ETL process '{}' failed: {} of {} node(s) did not complete ({:?})",
            self.process, self.failed_count, self.node_count, self.elapsed
        )
    }
}

impl StructuredLog for ProcessFailed<'_> {
    fn log(&self) {
        tracing::error!(
            process = self.process,
            failed_count = self.failed_count,
            node_count = self.node_count,
            "{}", self
        );
    }
}

/// A node task began executing.
///
/// # Log Level
/// `debug!`
pub struct NodeStarted<'a> {
    pub node: &'a str,
    pub id: NodeId,
}

impl Display for NodeStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node {} ({}) started", self.node, self.id)
    }
}

impl StructuredLog for NodeStarted<'_> {
    fn log(&self) {
        tracing::debug!(node = self.node, id = self.id.as_u64(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("node", span_name = name, node = self.node, id = self.id.as_u64())
    }
}

/// A node task finished successfully.
///
/// # Log Level
/// `info!`
pub struct NodeCompleted<'a> {
    pub node: &'a str,
    pub id: NodeId,
    pub elapsed: Duration,
}

impl Display for NodeCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node {} ({}) completed in {:?}",
            self.node, self.id, self.elapsed
        )
    }
}

impl StructuredLog for NodeCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            node = self.node,
            id = self.id.as_u64(),
            elapsed_ms = self.elapsed.as_millis() as u64,
            "{}", self
        );
    }
}

/// A node task returned an error or panicked.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct NodeFailed<'a> {
    pub node: &'a str,
    pub id: NodeId,
    pub error: &'a dyn Display,
}

impl Display for NodeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node {} ({}) {}", self.node, self.id, self.error)
    }
}

impl StructuredLog for NodeFailed<'_> {
    fn log(&self) {
        tracing::error!(
            node = self.node,
            id = self.id.as_u64(),
            error = %self.error,
            "{}", self
        );
    }
}

/// A node task was stopped because another node failed.
///
/// # Log Level
/// `warn!`
pub struct NodeCancelled<'a> {
    pub node: &'a str,
    pub id: NodeId,
}

impl Display for NodeCancelled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node {} ({}) cancelled after a failure elsewhere in the process",
            self.node, self.id
        )
    }
}

impl StructuredLog for NodeCancelled<'_> {
    fn log(&self) {
        tracing::warn!(node = self.node, id = self.id.as_u64(), "{}", self);
    }
}

/// An output's producer finished without signalling the end of its stream.
///
/// # Log Level
/// `warn!` - its consumers were left waiting
pub struct StreamNotEnded<'a> {
    pub output: &'a str,
    pub emitted: u64,
}

impl Display for StreamNotEnded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node {} never signalled the end of its stream after {} item(s)",
            self.output, self.emitted
        )
    }
}

impl StructuredLog for StreamNotEnded<'_> {
    fn log(&self) {
        tracing::warn!(output = self.output, emitted = self.emitted, "{}", self);
    }
}

/// Adapters disposed and pooled records dropped at the end of a run.
///
/// # Log Level
/// `debug!`
pub struct ResourcesReclaimed<'a> {
    pub process: &'a str,
    pub adapters: usize,
    pub pooled: usize,
}

impl Display for ResourcesReclaimed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "ETL process '{}' disposed {} adapter(s) and released {} pooled record(s)",
            self.process, self.adapters, self.pooled
        )
    }
}

impl StructuredLog for ResourcesReclaimed<'_> {
    fn log(&self) {
        tracing::debug!(
            process = self.process,
            adapters = self.adapters,
            pooled = self.pooled,
            "{}", self
        );
    }
}
