// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Diagnostic and operational log lines are defined as message structs with a
//! `Display` implementation instead of format strings scattered through the
//! engine. Each struct also implements
//! [`StructuredLog`](messages::StructuredLog), which picks the level and
//! attaches the machine-readable fields.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::process` - graph wiring, node tasks and process lifecycle
//! * `messages::adapter` - broadcast emission and end-of-stream
//! * `messages::config` - process definition loading and validation
//!
//! # Usage
//!
//! ```rust
//! use etlflow::observability::messages::process::NodeFailed;
//! use etlflow::traits::NodeId;
//!
//! let error = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
//! let msg = NodeFailed {
//!     node: "writer",
//!     id: NodeId::next(),
//!     error: &error,
//! };
//!
//! tracing::error!("{}", msg);
//! ```

pub mod messages;
