// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while wiring or running a process graph.

use thiserror::Error;

use crate::errors::ExecutionError;
use crate::traits::NodeId;

/// Everything the orchestrator, adapters and ports can report.
///
/// All variants except `Execution` and `ContextInitializer` are configuration
/// defects detected while the graph is built, before any node task starts.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The consumer has no unbound input slot left.
    #[error("Node {node} ({name}) already has all of its input slots assigned")]
    DuplicateInput { node: NodeId, name: String },

    /// A stream was requested for a node that never attached to this output.
    #[error("Node {consumer} is not attached to the output of node {output}")]
    UnknownConsumer { output: NodeId, consumer: NodeId },

    /// The node reference belongs to no node registered with this process.
    #[error("Node {0} is not registered with this process")]
    UnknownNode(NodeId),

    /// A node cannot consume its own output.
    #[error("Node {node} cannot be attached to its own output")]
    SelfAttachment { node: NodeId },

    /// The output already has an adapter for another record type.
    #[error("Output of node {node} carries `{existing}`, not `{requested}`")]
    PortTypeMismatch {
        node: NodeId,
        existing: &'static str,
        requested: &'static str,
    },

    #[error("Input port is already bound to an output")]
    InputAlreadyBound,

    #[error("Input port is not bound to any output")]
    InputNotBound,

    #[error("{output} emitted a record after signalling the end of its stream")]
    EmitAfterEnd { output: String },

    #[error("Context initializer failed: {source}")]
    ContextInitializer {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl PipelineError {
    /// True for errors detected while building the graph.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(
            self,
            PipelineError::Execution(_) | PipelineError::ContextInitializer { .. }
        )
    }
}
