// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Process-wide state shared by every node.
//!
//! A [`PipelineContext`] is mutable only while the process still owns it
//! exclusively: during graph construction and inside the one-shot context
//! initializer. `EtlProcess::execute` then moves it into an `Arc` before the
//! first node task is spawned, so during execution nodes can only read it.
//! The object pool is the single interior-mutable part.

mod logger;
mod pool;

pub use logger::{LoggerFactory, NullLoggerFactory, TracingLoggerFactory};
pub use pool::{ObjectPool, Recycle};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::Span;

use crate::data::Row;

pub struct PipelineContext {
    config: HashMap<String, String>,
    state: HashMap<String, Value>,
    object_pool: ObjectPool<Row>,
    logger_factory: Arc<dyn LoggerFactory>,
}

impl PipelineContext {
    pub fn new() -> Self {
        Self::with_logger_factory(Arc::new(TracingLoggerFactory))
    }

    pub fn with_logger_factory(logger_factory: Arc<dyn LoggerFactory>) -> Self {
        Self {
            config: HashMap::new(),
            state: HashMap::new(),
            object_pool: ObjectPool::default(),
            logger_factory,
        }
    }

    /// Plain string settings, e.g. endpoints or credentials for sink nodes.
    pub fn config(&self) -> &HashMap<String, String> {
        &self.config
    }

    pub fn config_value(&self, key: &str) -> Option<&str> {
        self.config.get(key).map(String::as_str)
    }

    pub fn set_config(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.config.insert(key.into(), value.into());
    }

    /// Named state slots.
    pub fn state(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    pub fn set_state(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.state.insert(key.into(), value.into())
    }

    pub fn state_keys(&self) -> impl Iterator<Item = &str> {
        self.state.keys().map(String::as_str)
    }

    pub fn object_pool(&self) -> &ObjectPool<Row> {
        &self.object_pool
    }

    /// Replace the pool, e.g. to change its capacity.
    pub fn set_object_pool(&mut self, pool: ObjectPool<Row>) {
        self.object_pool = pool;
    }

    pub fn logger(&self, name: &str) -> Span {
        self.logger_factory.create_logger(name)
    }

    pub fn logger_factory(&self) -> &Arc<dyn LoggerFactory> {
        &self.logger_factory
    }

    pub fn set_logger_factory(&mut self, logger_factory: Arc<dyn LoggerFactory>) {
        self.logger_factory = logger_factory;
    }
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineContext")
            .field("config_keys", &self.config.keys().collect::<Vec<_>>())
            .field("state_keys", &self.state.keys().collect::<Vec<_>>())
            .field("pooled_rows", &self.object_pool.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_and_state_slots() {
        let mut context = PipelineContext::new();
        context.set_config("bucket", "exports");
        assert_eq!(context.config_value("bucket"), Some("exports"));
        assert_eq!(context.config_value("missing"), None);

        assert_eq!(context.set_state("path", "/tmp/out.csv"), None);
        let previous = context.set_state("path", "/tmp/other.csv");
        assert_eq!(previous, Some(json!("/tmp/out.csv")));
        assert_eq!(context.state("path"), Some(&json!("/tmp/other.csv")));
    }
}
