// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit it at its level with machine-readable fields.
//!
//! # Organization
//!
//! * `process` - process lifecycle, graph wiring and node task events
//! * `adapter` - broadcast adapter emission and end-of-stream events
//! * `config` - process definition loading and validation
//!
//! # Usage Pattern
//!
//! ```rust
//! use etlflow::observability::messages::process::ProcessStarted;
//! use etlflow::observability::messages::StructuredLog;
//!
//! let msg = ProcessStarted {
//!     process: "nightly-export",
//!     node_count: 5,
//!     adapter_count: 3,
//! };
//!
//! msg.log();
//! ```

use tracing::Span;

pub mod adapter;
pub mod config;
pub mod process;

/// A message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a `tracing` event.
    fn log(&self);

    /// A span carrying the same fields, for scoping follow-up events.
    ///
    /// Only messages that open a unit of work override this; the rest return
    /// a disabled span.
    fn span(&self, _name: &str) -> Span {
        Span::none()
    }
}

#[cfg(test)]
mod tests {
    use super::adapter::FirstItemEmitted;
    use super::process::{NodeStarted, ProcessStarted};
    use super::StructuredLog;
    use crate::traits::NodeId;
    use tracing::Level;

    #[test]
    fn test_only_scoping_messages_open_spans() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .with_writer(std::io::sink)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let process = ProcessStarted {
                process: "nightly",
                node_count: 2,
                adapter_count: 1,
            };
            assert!(!process.span("process_execution").is_disabled());

            let node = NodeStarted {
                node: "reader",
                id: NodeId::next(),
            };
            assert!(!node.span("node_execution").is_disabled());

            let emitted = FirstItemEmitted { output: "reader" };
            assert!(emitted.span("emit").is_disabled());
        });
    }
}
