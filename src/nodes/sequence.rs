// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::PipelineContext;
use crate::data::Row;
use crate::engine::OutputPort;
use crate::traits::{Node, NodeId, NodeWithOutput};

/// Source that emits `count` rows numbered from zero in `field`.
///
/// Rows come from the context's object pool when one is bound, so a sink
/// that recycles what it reads keeps the allocation count flat.
pub struct SequenceSource {
    id: NodeId,
    name: String,
    count: u64,
    field: String,
    output: OutputPort<Row>,
    context: Option<Arc<PipelineContext>>,
}

impl SequenceSource {
    pub fn new(name: impl Into<String>, count: u64, field: impl Into<String>) -> Self {
        Self {
            id: NodeId::next(),
            name: name.into(),
            count,
            field: field.into(),
            output: OutputPort::new(),
            context: None,
        }
    }
}

#[async_trait]
impl Node for SequenceSource {
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
        for n in 0..self.count {
            let mut row = match &self.context {
                Some(context) => context.object_pool().take(),
                None => Row::new(),
            };
            row.set(self.field.as_str(), n);
            self.output.emit(row)?;
        }
        self.output.signal_end();
        Ok(())
    }
}

impl NodeWithOutput<Row> for SequenceSource {
    fn output_port(&mut self) -> &mut OutputPort<Row> {
        &mut self.output
    }
}
