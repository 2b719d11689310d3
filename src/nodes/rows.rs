// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::PipelineContext;
use crate::data::Row;
use crate::engine::OutputPort;
use crate::traits::{Node, NodeId, NodeWithOutput};

/// Source that emits a fixed list of rows, in order.
pub struct RowsSource {
    id: NodeId,
    name: String,
    rows: Vec<Row>,
    output: OutputPort<Row>,
}

impl RowsSource {
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            id: NodeId::next(),
            name: name.into(),
            rows,
            output: OutputPort::new(),
        }
    }

    /// One row per value, each with a single column.
    pub fn from_values<V>(
        name: impl Into<String>,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self
    where
        V: Into<serde_json::Value>,
    {
        let rows = values
            .into_iter()
            .map(|value| Row::new().with(column, value))
            .collect();
        Self::new(name, rows)
    }

    /// Rows not yet emitted.
    pub fn pending(&self) -> usize {
        self.rows.len()
    }
}

#[async_trait]
impl Node for RowsSource {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn bind_context(&mut self, _context: Arc<PipelineContext>) {}

    async fn execute(&mut self) -> anyhow::Result<()> {
        for row in self.rows.drain(..) {
            self.output.emit(row)?;
        }
        self.output.signal_end();
        Ok(())
    }
}

impl NodeWithOutput<Row> for RowsSource {
    fn output_port(&mut self) -> &mut OutputPort<Row> {
        &mut self.output
    }
}
