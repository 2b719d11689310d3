// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structural validation of process definitions.
//!
//! A process graph must be checked before it is built: the orchestrator
//! starts every node at once, so a node waiting on a producer that does not
//! exist, or a cycle of nodes waiting on each other, would hang the run
//! instead of failing.
//!
//! # Validation Pipeline
//!
//! 1. **Uniqueness**: every node id is unique
//! 2. **References**: every input names an existing node that has an output
//! 3. **Arity**: every node lists as many inputs as its type consumes
//! 4. **Cycle Detection**: DFS over the input edges
//!
//! Errors from the first three stages are accumulated so every problem is
//! reported at once. Cycle detection needs a well-formed graph and only runs
//! when they all pass.
//!
//! # Example
//!
//! ```rust
//! use etlflow::config::{validate_process_config, ProcessConfig};
//! use etlflow::errors::ValidationError;
//!
//! let config = ProcessConfig::from_yaml(r#"
//! nodes:
//!   - id: sink
//!     type: collect
//!     inputs: [missing]
//! "#).unwrap();
//!
//! let errors = validate_process_config(&config).unwrap_err();
//! assert!(matches!(errors[0], ValidationError::UnresolvedInput { .. }));
//! ```

use std::collections::{HashMap, HashSet};

use crate::config::{NodeConfig, ProcessConfig};
use crate::errors::ValidationError;

/// Check a process definition, returning every problem found.
pub fn validate_process_config(config: &ProcessConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(duplicate_errors) = validate_unique_node_ids(config) {
        errors.extend(duplicate_errors);
    }

    if let Err(reference_errors) = validate_input_references(config) {
        errors.extend(reference_errors);
    }

    if let Err(arity_errors) = validate_input_counts(config) {
        errors.extend(arity_errors);
    }

    // Cycle detection needs every reference resolved
    if errors.is_empty() {
        if let Err(cycle_errors) = validate_acyclic_graph(config) {
            errors.extend(cycle_errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_unique_node_ids(config: &ProcessConfig) -> Result<(), Vec<ValidationError>> {
    let mut seen_ids = HashSet::new();
    let mut errors = Vec::new();

    for node in &config.nodes {
        if !seen_ids.insert(node.id.as_str()) {
            errors.push(ValidationError::DuplicateNodeId {
                node_id: node.id.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Every input must name a node, and that node must have an output port.
/// A node may list a given producer only once: the second attachment of the
/// same pair would be a no-op and leave a slot unwired.
fn validate_input_references(config: &ProcessConfig) -> Result<(), Vec<ValidationError>> {
    let nodes: HashMap<&str, &NodeConfig> = config
        .nodes
        .iter()
        .map(|node| (node.id.as_str(), node))
        .collect();
    let mut errors = Vec::new();

    for node in &config.nodes {
        let mut listed = HashSet::new();
        for input in &node.inputs {
            if !listed.insert(input.as_str()) {
                errors.push(ValidationError::RepeatedInput {
                    node_id: node.id.clone(),
                    input: input.clone(),
                });
                continue;
            }
            match nodes.get(input.as_str()) {
                None => errors.push(ValidationError::UnresolvedInput {
                    node_id: node.id.clone(),
                    missing_input: input.clone(),
                }),
                Some(producer) if !producer.kind.has_output() => {
                    errors.push(ValidationError::NotAnOutput {
                        node_id: node.id.clone(),
                        input: input.clone(),
                    })
                }
                Some(_) => {}
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_input_counts(config: &ProcessConfig) -> Result<(), Vec<ValidationError>> {
    let errors: Vec<ValidationError> = config
        .nodes
        .iter()
        .filter(|node| node.inputs.len() != node.kind.input_count())
        .map(|node| ValidationError::InputCount {
            node_id: node.id.clone(),
            kind: node.kind.type_name(),
            expected: node.kind.input_count(),
            actual: node.inputs.len(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Three-colour DFS over producer -> consumer edges.
///
/// Nodes are visited in definition order so the reported cycle is stable.
fn validate_acyclic_graph(config: &ProcessConfig) -> Result<(), Vec<ValidationError>> {
    let mut graph: HashMap<&str, Vec<&str>> = config
        .nodes
        .iter()
        .map(|node| (node.id.as_str(), Vec::new()))
        .collect();

    for node in &config.nodes {
        for input in &node.inputs {
            if let Some(consumers) = graph.get_mut(input.as_str()) {
                consumers.push(node.id.as_str());
            }
        }
    }

    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    for node in &config.nodes {
        if !visited.contains(node.id.as_str()) {
            if let Some(cycle) = dfs_cycle_detection(
                node.id.as_str(),
                &graph,
                &mut visited,
                &mut rec_stack,
                &mut path,
            ) {
                return Err(vec![ValidationError::CyclicDependency { cycle }]);
            }
        }
    }

    Ok(())
}

/// Returns the cycle path, first node repeated at the end, if one is
/// reachable from `node`.
fn dfs_cycle_detection<'a>(
    node: &'a str,
    graph: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(neighbors) = graph.get(node) {
        for &neighbor in neighbors {
            if !visited.contains(neighbor) {
                if let Some(cycle) = dfs_cycle_detection(neighbor, graph, visited, rec_stack, path)
                {
                    return Some(cycle);
                }
            } else if rec_stack.contains(neighbor) {
                let cycle_start = path.iter().position(|&x| x == neighbor).unwrap_or(0);
                let mut cycle: Vec<String> =
                    path[cycle_start..].iter().map(|id| id.to_string()).collect();
                cycle.push(neighbor.to_string());
                return Some(cycle);
            }
        }
    }

    rec_stack.remove(node);
    path.pop();
    None
}
