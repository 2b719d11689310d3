// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for broadcast adapter events.
//!
//! All of these are `debug!` or lower except the duplicate end signal, which
//! points at a node breaking its contract.

use crate::observability::messages::StructuredLog;
use crate::traits::NodeId;
use std::fmt::{Display, Formatter};

/// A consumer queue was registered on an output.
pub struct ConsumerAttached<'a> {
    pub output: &'a str,
    pub consumer: &'a str,
    pub consumer_count: usize,
}

impl Display for ConsumerAttached<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node {} now consumes the output of {} ({} consumer(s))",
            self.consumer, self.output, self.consumer_count
        )
    }
}

impl StructuredLog for ConsumerAttached<'_> {
    fn log(&self) {
        tracing::debug!(
            output = self.output,
            consumer = self.consumer,
            consumer_count = self.consumer_count,
            "{}", self
        );
    }
}

/// The first record went out on an output.
///
/// # Log Level
/// `debug!`
pub struct FirstItemEmitted<'a> {
    pub output: &'a str,
}

impl Display for FirstItemEmitted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node {} emitting its first item", self.output)
    }
}

impl StructuredLog for FirstItemEmitted<'_> {
    fn log(&self) {
        tracing::debug!(output = self.output, "{}", self);
    }
}

/// Periodic emission count.
///
/// # Log Level
/// `debug!`
pub struct EmitProgress<'a> {
    pub output: &'a str,
    pub emitted: u64,
}

impl Display for EmitProgress<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node {} has emitted {} items", self.output, self.emitted)
    }
}

impl StructuredLog for EmitProgress<'_> {
    fn log(&self) {
        tracing::debug!(output = self.output, emitted = self.emitted, "{}", self);
    }
}

/// The producer signalled the end of its stream.
///
/// # Log Level
/// `debug!`
pub struct StreamEnded<'a> {
    pub output: &'a str,
    pub emitted: u64,
    pub consumer_count: usize,
}

impl Display for StreamEnded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node {} has signalled the end of its data stream (emitted {} total items to {} consumer(s))",
            self.output, self.emitted, self.consumer_count
        )
    }
}

impl StructuredLog for StreamEnded<'_> {
    fn log(&self) {
        tracing::debug!(
            output = self.output,
            emitted = self.emitted,
            consumer_count = self.consumer_count,
            "{}", self
        );
    }
}

/// `signal_end` was called again on an ended output.
///
/// # Log Level
/// `warn!` - contract violation by the node, ignored
pub struct DuplicateEndSignal<'a> {
    pub output: &'a str,
}

impl Display for DuplicateEndSignal<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node {} signalled the end of its stream more than once; ignoring",
            self.output
        )
    }
}

impl StructuredLog for DuplicateEndSignal<'_> {
    fn log(&self) {
        tracing::warn!(output = self.output, "{}", self);
    }
}

/// A consumer dropped its stream; its queue is released.
///
/// # Log Level
/// `trace!`
pub struct ConsumerGone<'a> {
    pub output: &'a str,
    pub consumer: NodeId,
}

impl Display for ConsumerGone<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Consumer {} of {} dropped its stream; no longer delivering to it",
            self.consumer, self.output
        )
    }
}

impl StructuredLog for ConsumerGone<'_> {
    fn log(&self) {
        tracing::trace!(
            output = self.output,
            consumer = %self.consumer,
            "{}", self
        );
    }
}
