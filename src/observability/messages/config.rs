// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for loading and validating process definitions.

use crate::errors::ValidationError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};

/// A process definition was read and parsed.
///
/// # Log Level
/// `info!`
///
/// # Example
/// ```
/// use etlflow::observability::messages::config::ConfigLoaded;
///
/// let msg = ConfigLoaded {
///     path: "pipelines/orders.yaml",
///     process: "orders",
///     node_count: 4,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ConfigLoaded<'a> {
    pub path: &'a str,
    pub process: &'a str,
    pub node_count: usize,
}

impl Display for ConfigLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded ETL process '{}' ({} node(s)) from {}",
            self.process, self.node_count, self.path
        )
    }
}

impl StructuredLog for ConfigLoaded<'_> {
    fn log(&self) {
        tracing::info!(
            path = self.path,
            process = self.process,
            node_count = self.node_count,
            "{}", self
        );
    }
}

/// A process definition failed validation.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ValidationFailed<'a> {
    pub process: &'a str,
    pub errors: &'a [ValidationError],
}

impl Display for ValidationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "ETL process '{}' failed validation with {} error(s)",
            self.process,
            self.errors.len()
        )?;
        for error in self.errors {
            write!(f, "; {}", error)?;
        }
        Ok(())
    }
}

impl StructuredLog for ValidationFailed<'_> {
    fn log(&self) {
        tracing::error!(
            process = self.process,
            error_count = self.errors.len(),
            "{}", self
        );
    }
}

/// A process graph was built from its definition.
///
/// # Log Level
/// `debug!`
pub struct GraphBuilt<'a> {
    pub process: &'a str,
    pub node_count: usize,
    pub edge_count: usize,
}

impl Display for GraphBuilt<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Built ETL process '{}': {} node(s), {} attachment(s)",
            self.process, self.node_count, self.edge_count
        )
    }
}

impl StructuredLog for GraphBuilt<'_> {
    fn log(&self) {
        tracing::debug!(
            process = self.process,
            node_count = self.node_count,
            edge_count = self.edge_count,
            "{}", self
        );
    }
}
