// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;        // process definitions + validation
pub mod context;       // shared pipeline context, object pool
pub mod data;          // rows and frozen records
pub mod engine;        // adapters, ports, process orchestrator
pub mod errors;        // error handling
pub mod nodes;         // built-in nodes + factory
pub mod observability;
pub mod traits;        // node contract

pub use context::PipelineContext;
pub use data::{Frozen, Row};
pub use engine::{EtlProcess, NodeRef, ProcessBuilder, ProcessReport, ProcessSettings};
pub use errors::PipelineError;
pub use traits::{Node, NodeId, NodeWithInput, NodeWithOutput};
