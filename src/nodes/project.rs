// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::PipelineContext;
use crate::data::Row;
use crate::engine::{InputPort, OutputPort};
use crate::traits::{Node, NodeId, NodeWithInput, NodeWithOutput};

/// Transform that keeps only the listed columns, in the listed order.
///
/// Columns missing from an input row are left out of the projected row.
pub struct ProjectTransform {
    id: NodeId,
    name: String,
    columns: Vec<String>,
    input: InputPort<Row>,
    output: OutputPort<Row>,
    context: Option<Arc<PipelineContext>>,
}

impl ProjectTransform {
    pub fn new<S: Into<String>>(name: impl Into<String>, columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            id: NodeId::next(),
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            input: InputPort::new(),
            output: OutputPort::new(),
            context: None,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

#[async_trait]
impl Node for ProjectTransform {
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
            let mut projected = match &self.context {
                Some(context) => context.object_pool().take(),
                None => Row::with_capacity(self.columns.len()),
            };
            for column in &self.columns {
                if let Some(value) = row.get(column) {
                    projected.set(column.as_str(), value.clone());
                }
            }
            self.output.emit(projected)?;
        }
        self.output.signal_end();
        Ok(())
    }
}

impl NodeWithInput<Row> for ProjectTransform {
    fn input_port(&mut self) -> &mut InputPort<Row> {
        &mut self.input
    }
}

impl NodeWithOutput<Row> for ProjectTransform {
    fn output_port(&mut self) -> &mut OutputPort<Row> {
        &mut self.output
    }
}
