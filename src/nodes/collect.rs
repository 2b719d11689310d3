// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::PipelineContext;
use crate::data::{Frozen, Row};
use crate::engine::InputPort;
use crate::traits::{Node, NodeId, NodeWithInput};

/// Sink that counts the rows it reads.
///
/// With `keep` the rows themselves are retained and published in the
/// summary. With `recycle` every row this sink holds the last reference to
/// goes back to the context's object pool.
pub struct CollectSink {
    id: NodeId,
    name: String,
    keep: bool,
    recycle: bool,
    input: InputPort<Row>,
    context: Option<Arc<PipelineContext>>,
    count: u64,
    recycled: u64,
    columns: Vec<String>,
    rows: Vec<Frozen<Row>>,
}

impl CollectSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NodeId::next(),
            name: name.into(),
            keep: false,
            recycle: false,
            input: InputPort::new(),
            context: None,
            count: 0,
            recycled: 0,
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn keeping_rows(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    pub fn recycling(mut self, recycle: bool) -> Self {
        self.recycle = recycle;
        self
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn recycled(&self) -> u64 {
        self.recycled
    }

    pub fn rows(&self) -> &[Frozen<Row>] {
        &self.rows
    }
}

#[async_trait]
impl Node for CollectSink {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn bind_context(&mut self, context: Arc<PipelineContext>) {
        self.context = Some(context);
    }

    async fn execute(&mut self) -> anyhow::Result<()> {
        let stream = self.input.stream()?;
        while let Some(row) = stream.next().await {
            self.count += 1;
            if self.columns.is_empty() {
                self.columns = row.columns().map(str::to_string).collect();
            }

            if self.keep {
                self.rows.push(row);
            } else if self.recycle {
                if let Some(context) = &self.context {
                    if context.object_pool().recycle(row) {
                        self.recycled += 1;
                    }
                }
            }
        }
        tracing::debug!(sink = %self.name, rows = self.count, "Sink reached the end of its input");
        Ok(())
    }

    fn summary(&self) -> Option<Value> {
        let mut summary = json!({
            "rows": self.count,
            "columns": self.columns,
        });
        if self.recycle {
            summary["recycled"] = json!(self.recycled);
        }
        if self.keep {
            summary["data"] = json!(self.rows.iter().map(|row| &**row).collect::<Vec<&Row>>());
        }
        Some(summary)
    }
}

impl NodeWithInput<Row> for CollectSink {
    fn input_port(&mut self) -> &mut InputPort<Row> {
        &mut self.input
    }
}
