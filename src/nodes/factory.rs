// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::config::{self, NodeConfig, NodeKind, ProcessConfig};
use crate::context::{ObjectPool, PipelineContext};
use crate::data::Row;
use crate::engine::{EtlProcess, NodeRef, ProcessSettings};
use crate::errors::{ConfigError, ValidationError};
use crate::observability::messages::config::GraphBuilt;
use crate::observability::messages::StructuredLog;
use crate::traits::{NodeWithInput, NodeWithOutput};

use super::{CollectSink, MergeNode, ProjectTransform, RowsSource, SequenceSource};

/// Handle to a built-in node of any type.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Rows(NodeRef<RowsSource>),
    Sequence(NodeRef<SequenceSource>),
    Project(NodeRef<ProjectTransform>),
    Merge(NodeRef<MergeNode>),
    Collect(NodeRef<CollectSink>),
}

/// Builds runnable processes from process definitions.
pub struct NodeFactory;

impl NodeFactory {
    /// Validate `config` and build its graph: context, nodes, and one
    /// attachment per listed input, in listed order.
    pub fn build_process(config: &ProcessConfig) -> Result<EtlProcess, ConfigError> {
        config::validate(config)?;

        let mut context = PipelineContext::new();
        for (key, value) in &config.context.config {
            context.set_config(key.as_str(), value.as_str());
        }
        for (key, value) in &config.context.state {
            context.set_state(key.as_str(), value.clone());
        }
        if let Some(capacity) = config.context.pool_capacity {
            context.set_object_pool(ObjectPool::new(capacity));
        }

        let settings = ProcessSettings {
            name: config.name.clone(),
            cancel_on_failure: config.cancel_on_failure,
            ..ProcessSettings::default()
        };
        let mut process = EtlProcess::with_context(settings, context);

        let mut slots = HashMap::new();
        for node in &config.nodes {
            slots.insert(node.id.as_str(), Self::create_node(&mut process, node));
        }

        let mut edges = 0;
        for node in &config.nodes {
            let input = slots[node.id.as_str()];
            for source in &node.inputs {
                let output = *slots.get(source.as_str()).ok_or_else(|| {
                    ConfigError::Validation(vec![ValidationError::UnresolvedInput {
                        node_id: node.id.clone(),
                        missing_input: source.clone(),
                    }])
                })?;
                if !attach(&mut process, output, input, node, source)? {
                    return Err(ConfigError::Validation(vec![ValidationError::RepeatedInput {
                        node_id: node.id.clone(),
                        input: source.clone(),
                    }]));
                }
                edges += 1;
            }
        }

        GraphBuilt {
            process: &config.name,
            node_count: process.node_count(),
            edge_count: edges,
        }
        .log();
        Ok(process)
    }

    fn create_node(process: &mut EtlProcess, node: &NodeConfig) -> Slot {
        let name = node.id.clone();
        match &node.kind {
            NodeKind::Rows { rows } => Slot::Rows(process.register(RowsSource::new(
                name,
                rows.iter().cloned().map(Row::from).collect(),
            ))),
            NodeKind::Sequence { count, field } => Slot::Sequence(
                process.register(SequenceSource::new(name, *count, field.as_str())),
            ),
            NodeKind::Project { columns } => {
                Slot::Project(process.register(ProjectTransform::new(name, columns.iter().cloned())))
            }
            NodeKind::Merge => Slot::Merge(process.register(MergeNode::new(name))),
            NodeKind::Collect { keep, recycle } => Slot::Collect(process.register(
                CollectSink::new(name)
                    .keeping_rows(*keep)
                    .recycling(*recycle),
            )),
        }
    }

    /// Node type names accepted in process definitions.
    pub fn list_available_types() -> Vec<&'static str> {
        vec!["rows", "sequence", "project", "merge", "collect"]
    }
}

fn attach(
    process: &mut EtlProcess,
    output: Slot,
    input: Slot,
    node: &NodeConfig,
    source: &str,
) -> Result<bool, ConfigError> {
    match output {
        Slot::Rows(output) => attach_to(process, &output, input, node),
        Slot::Sequence(output) => attach_to(process, &output, input, node),
        Slot::Project(output) => attach_to(process, &output, input, node),
        Slot::Merge(output) => attach_to(process, &output, input, node),
        Slot::Collect(_) => Err(ConfigError::Validation(vec![ValidationError::NotAnOutput {
            node_id: node.id.clone(),
            input: source.to_string(),
        }])),
    }
}

fn attach_to<O>(
    process: &mut EtlProcess,
    output: &NodeRef<O>,
    input: Slot,
    node: &NodeConfig,
) -> Result<bool, ConfigError>
where
    O: NodeWithOutput<Row>,
{
    let attached = match input {
        Slot::Project(input) => wire(process, output, &input)?,
        Slot::Merge(input) => wire(process, output, &input)?,
        Slot::Collect(input) => wire(process, output, &input)?,
        Slot::Rows(_) | Slot::Sequence(_) => {
            return Err(ConfigError::Validation(vec![ValidationError::InputCount {
                node_id: node.id.clone(),
                kind: node.kind.type_name(),
                expected: 0,
                actual: node.inputs.len(),
            }]))
        }
    };
    Ok(attached)
}

fn wire<O, I>(
    process: &mut EtlProcess,
    output: &NodeRef<O>,
    input: &NodeRef<I>,
) -> Result<bool, ConfigError>
where
    O: NodeWithOutput<Row>,
    I: NodeWithInput<Row>,
{
    Ok(process.attach_input_to_output::<Row, O, I>(output, input)?)
}
