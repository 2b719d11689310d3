// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;

use crate::context::PipelineContext;
use crate::data::{Frozen, Row};
use crate::engine::{InputPort, InputStream, OutputPort};
use crate::traits::{Node, NodeId, NodeWithInput, NodeWithOutput};

/// Dual-input node that forwards rows from both inputs in arrival order.
///
/// Rows from the same input keep their relative order; there is no ordering
/// between the two inputs. The output ends once both inputs have ended. An
/// input slot that was never attached counts as an empty stream, but at least
/// one must be attached.
pub struct MergeNode {
    id: NodeId,
    name: String,
    first: InputPort<Row>,
    second: InputPort<Row>,
    output: OutputPort<Row>,
}

impl MergeNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NodeId::next(),
            name: name.into(),
            first: InputPort::new(),
            second: InputPort::new(),
            output: OutputPort::new(),
        }
    }
}

/// Reuse the row when this node holds the only reference, copy it otherwise.
fn own(row: Frozen<Row>) -> Row {
    Frozen::try_unwrap(row).unwrap_or_else(|shared| shared.thaw())
}

#[async_trait]
impl Node for MergeNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn bind_context(&mut self, _context: Arc<PipelineContext>) {}

    async fn execute(&mut self) -> anyhow::Result<()> {
        let mut first = self.first.take().ok();
        let mut second = self.second.take().ok();
        if first.is_none() && second.is_none() {
            bail!("merge node {} has no attached inputs", self.name);
        }

        let mut first_open = first.is_some();
        let mut second_open = second.is_some();

        while first_open || second_open {
            tokio::select! {
                item = next_row(&mut first), if first_open => match item {
                    Some(row) => self.output.emit(own(row))?,
                    None => first_open = false,
                },
                item = next_row(&mut second), if second_open => match item {
                    Some(row) => self.output.emit(own(row))?,
                    None => second_open = false,
                },
            }
        }
        self.output.signal_end();
        Ok(())
    }
}

async fn next_row(stream: &mut Option<InputStream<Row>>) -> Option<Frozen<Row>> {
    match stream {
        Some(stream) => stream.next().await,
        None => None,
    }
}

impl NodeWithInput<Row> for MergeNode {
    fn input_port(&mut self) -> &mut InputPort<Row> {
        &mut self.first
    }

    fn input2_port(&mut self) -> Option<&mut InputPort<Row>> {
        Some(&mut self.second)
    }
}

impl NodeWithOutput<Row> for MergeNode {
    fn output_port(&mut self) -> &mut OutputPort<Row> {
        &mut self.output
    }
}
