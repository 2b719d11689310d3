// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod execution;
mod pipeline;

pub use config::{ConfigError, ValidationError};
pub use execution::{ExecutionError, FailureKind, NodeFailure};
pub use pipeline::PipelineError;
