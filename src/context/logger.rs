// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use tracing::Span;

/// Hands out named logging scopes to the process and its nodes.
///
/// Loggers are `tracing` spans: events emitted while a span is entered carry
/// its `logger` field, so output from different nodes can be told apart.
pub trait LoggerFactory: Send + Sync {
    fn create_logger(&self, name: &str) -> Span;
}

/// Default factory: one `info`-level span per logger name.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLoggerFactory;

impl LoggerFactory for TracingLoggerFactory {
    fn create_logger(&self, name: &str) -> Span {
        tracing::info_span!("etl", logger = name)
    }
}

/// Factory whose spans are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLoggerFactory;

impl LoggerFactory for NullLoggerFactory {
    fn create_logger(&self, _name: &str) -> Span {
        Span::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_factory_spans_are_disabled() {
        assert!(NullLoggerFactory.create_logger("anything").is_disabled());
    }
}
