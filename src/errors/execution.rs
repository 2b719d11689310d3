// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::time::Duration;

use crate::engine::NodeReport;
use crate::traits::NodeId;

/// How a node task ended without completing.
#[derive(Debug)]
pub enum FailureKind {
    /// `execute` returned an error.
    Faulted(anyhow::Error),
    /// The node task panicked.
    Panicked(String),
    /// Another node failed and the process was configured to cancel its peers.
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Faulted(error) => write!(f, "faulted: {:#}", error),
            FailureKind::Panicked(message) => write!(f, "panicked: {}", message),
            FailureKind::Cancelled => write!(f, "cancelled after a failure in another node"),
        }
    }
}

/// One node that did not reach a successful terminal state.
#[derive(Debug)]
pub struct NodeFailure {
    pub node: NodeId,
    pub name: String,
    pub elapsed: Duration,
    pub kind: FailureKind,
}

impl NodeFailure {
    pub fn is_cancellation(&self) -> bool {
        matches!(self.kind, FailureKind::Cancelled)
    }
}

impl fmt::Display for NodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {} ({}) {}", self.node, self.name, self.kind)
    }
}

/// Aggregate failure reported once every node task has settled.
#[derive(Debug)]
pub struct ExecutionError {
    pub process: String,
    pub failures: Vec<NodeFailure>,
    /// Nodes that did complete, in registration order.
    pub completed: Vec<NodeReport>,
}

impl ExecutionError {
    /// Failures that caused the run to stop, excluding cancelled peers.
    pub fn root_causes(&self) -> impl Iterator<Item = &NodeFailure> {
        self.failures.iter().filter(|failure| !failure.is_cancellation())
    }

    pub fn failure_for(&self, node: NodeId) -> Option<&NodeFailure> {
        self.failures.iter().find(|failure| failure.node == node)
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ETL process '{}' failed: {} of {} nodes did not complete",
            self.process,
            self.failures.len(),
            self.failures.len() + self.completed.len()
        )?;
        for failure in &self.failures {
            write!(f, "; {}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExecutionError {}
