// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::errors::PipelineError;

/// Errors that can occur while validating a process graph definition
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The node inputs form a cycle; every node in it would wait on the others forever
    CyclicDependency {
        /// The cycle path, first node repeated at the end
        cycle: Vec<String>,
    },
    /// A node lists an input that doesn't exist
    UnresolvedInput {
        node_id: String,
        missing_input: String,
    },
    /// Two nodes share an id
    DuplicateNodeId { node_id: String },
    /// A node lists the same input more than once
    RepeatedInput { node_id: String, input: String },
    /// A node lists another node without an output port as its input
    NotAnOutput { node_id: String, input: String },
    /// A node has the wrong number of inputs for its type
    InputCount {
        node_id: String,
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::CyclicDependency { cycle } => {
                write!(f, "Cyclic dependency detected: {}", cycle.join(" -> "))
            }
            ValidationError::UnresolvedInput {
                node_id,
                missing_input,
            } => {
                write!(
                    f,
                    "Node '{}' reads from '{}' which does not exist",
                    node_id, missing_input
                )
            }
            ValidationError::DuplicateNodeId { node_id } => {
                write!(f, "Duplicate node ID: '{}'", node_id)
            }
            ValidationError::RepeatedInput { node_id, input } => {
                write!(f, "Node '{}' lists input '{}' more than once", node_id, input)
            }
            ValidationError::NotAnOutput { node_id, input } => {
                write!(
                    f,
                    "Node '{}' reads from '{}' which has no output port",
                    node_id, input
                )
            }
            ValidationError::InputCount {
                node_id,
                kind,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Node '{}' of type '{}' needs {} input(s) but lists {}",
                    node_id, kind, expected, actual
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors from loading a process definition and turning it into a graph.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML process definition: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid TOML process definition: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Process definition validation failed:\n{}", join_lines(.0))]
    Validation(Vec<ValidationError>),

    #[error("Failed to build process graph: {0}")]
    Graph(#[from] PipelineError),
}

fn join_lines(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
