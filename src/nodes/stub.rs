// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Nodes for exercising the engine in tests.

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::PipelineContext;
use crate::data::Row;
use crate::engine::{InputPort, OutputPort};
use crate::traits::{Node, NodeId, NodeWithInput, NodeWithOutput};

/// Input-only node that reads its stream to the end and remembers what it saw
/// along with the context it was bound to.
pub struct ProbeNode {
    id: NodeId,
    name: String,
    input: InputPort<Row>,
    context: Option<Arc<PipelineContext>>,
    received: u64,
}

impl ProbeNode {
    pub fn new(name: &str) -> Self {
        Self {
            id: NodeId::next(),
            name: name.to_string(),
            input: InputPort::new(),
            context: None,
            received: 0,
        }
    }
}

#[async_trait]
impl Node for ProbeNode {
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
        while stream.next().await.is_some() {
            self.received += 1;
        }
        Ok(())
    }

    fn summary(&self) -> Option<Value> {
        let context = self.context.as_deref();
        Some(json!({
            "received": self.received,
            "marker": context.and_then(|context| context.config_value("marker")),
            "seed": context.and_then(|context| context.state("seed")).cloned(),
        }))
    }
}

impl NodeWithInput<Row> for ProbeNode {
    fn input_port(&mut self) -> &mut InputPort<Row> {
        &mut self.input
    }
}

/// Source that emits `before_failure` rows and then fails without ending its
/// stream.
pub struct FailingSource {
    id: NodeId,
    name: String,
    before_failure: u64,
    output: OutputPort<Row>,
}

impl FailingSource {
    pub fn new(name: &str, before_failure: u64) -> Self {
        Self {
            id: NodeId::next(),
            name: name.to_string(),
            before_failure,
            output: OutputPort::new(),
        }
    }
}

#[async_trait]
impl Node for FailingSource {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn bind_context(&mut self, _context: Arc<PipelineContext>) {}

    async fn execute(&mut self) -> anyhow::Result<()> {
        for n in 0..self.before_failure {
            self.output.emit(Row::new().with("n", n))?;
        }
        Err(anyhow!("simulated source failure"))
    }
}

impl NodeWithOutput<Row> for FailingSource {
    fn output_port(&mut self) -> &mut OutputPort<Row> {
        &mut self.output
    }
}

/// Node whose task panics.
pub struct PanickingNode {
    id: NodeId,
    name: String,
}

impl PanickingNode {
    pub fn new(name: &str) -> Self {
        Self {
            id: NodeId::next(),
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl Node for PanickingNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn bind_context(&mut self, _context: Arc<PipelineContext>) {}

    async fn execute(&mut self) -> anyhow::Result<()> {
        panic!("simulated node panic");
    }
}

/// Source that emits its rows and returns without signalling the end.
pub struct SilentSource {
    id: NodeId,
    name: String,
    output: OutputPort<Row>,
}

impl SilentSource {
    pub fn new(name: &str) -> Self {
        Self {
            id: NodeId::next(),
            name: name.to_string(),
            output: OutputPort::new(),
        }
    }
}

#[async_trait]
impl Node for SilentSource {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn bind_context(&mut self, _context: Arc<PipelineContext>) {}

    async fn execute(&mut self) -> anyhow::Result<()> {
        self.output.emit(Row::new().with("n", 0))?;
        Ok(())
    }
}

impl NodeWithOutput<Row> for SilentSource {
    fn output_port(&mut self) -> &mut OutputPort<Row> {
        &mut self.output
    }
}

/// Source with two output types, used to provoke a port type mismatch.
pub struct TwoFacedSource {
    id: NodeId,
    rows: OutputPort<Row>,
    text: OutputPort<String>,
}

impl TwoFacedSource {
    pub fn new() -> Self {
        Self {
            id: NodeId::next(),
            rows: OutputPort::new(),
            text: OutputPort::new(),
        }
    }
}

#[async_trait]
impl Node for TwoFacedSource {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        "two-faced"
    }

    fn bind_context(&mut self, _context: Arc<PipelineContext>) {}

    async fn execute(&mut self) -> anyhow::Result<()> {
        self.rows.signal_end();
        self.text.signal_end();
        Ok(())
    }
}

impl NodeWithOutput<Row> for TwoFacedSource {
    fn output_port(&mut self) -> &mut OutputPort<Row> {
        &mut self.rows
    }
}

impl NodeWithOutput<String> for TwoFacedSource {
    fn output_port(&mut self) -> &mut OutputPort<String> {
        &mut self.text
    }
}

/// Input-only node for `String` records.
pub struct TextProbe {
    id: NodeId,
    input: InputPort<String>,
}

impl TextProbe {
    pub fn new() -> Self {
        Self {
            id: NodeId::next(),
            input: InputPort::new(),
        }
    }
}

#[async_trait]
impl Node for TextProbe {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        "text-probe"
    }

    fn bind_context(&mut self, _context: Arc<PipelineContext>) {}

    async fn execute(&mut self) -> anyhow::Result<()> {
        let stream = self.input.stream()?;
        while stream.next().await.is_some() {}
        Ok(())
    }
}

impl NodeWithInput<String> for TextProbe {
    fn input_port(&mut self) -> &mut InputPort<String> {
        &mut self.input
    }
}
