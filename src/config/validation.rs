// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structural validation of a workflow before it becomes a [`WorkflowDefinition`].
//!
//! Checks run in order, and cycle detection only runs once the earlier checks pass since
//! it needs every edge to point at a real node:
//!
//! 1. the workflow declares a source type
//! 2. no node reuses the workflow id
//! 3. every wired source and declared output names an existing producer
//! 4. every edge is still type compatible (the source type may have changed since wiring)
//! 5. the graph is acyclic (DFS with a recursion stack, reporting the cycle path)
//!
//! [`WorkflowDefinition`]: crate::model::WorkflowDefinition

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::errors::WorkflowConfigurationError;
use crate::model::{TransformerConfiguration, ValueType};

/// Validates a workflow's nodes and outputs, returning every defect found.
pub fn validate_workflow(
    workflow_id: &str,
    source_type: Option<&ValueType>,
    transformers: &BTreeMap<String, TransformerConfiguration>,
    outputs: &[String],
) -> Result<(), Vec<WorkflowConfigurationError>> {
    let mut errors = Vec::new();

    let Some(source_type) = source_type else {
        return Err(vec![WorkflowConfigurationError::MissingSourceType {
            workflow_id: workflow_id.to_string(),
        }]);
    };

    if transformers.contains_key(workflow_id) {
        errors.push(WorkflowConfigurationError::DuplicateNodeId {
            node_id: workflow_id.to_string(),
        });
    }

    errors.extend(validate_sources(workflow_id, source_type, transformers));

    for node_id in outputs {
        if !transformers.contains_key(node_id) {
            errors.push(WorkflowConfigurationError::UnknownNode {
                node_id: node_id.clone(),
            });
        }
    }

    if errors.is_empty() {
        if let Some(cycle) = find_cycle(transformers) {
            errors.push(WorkflowConfigurationError::CyclicDependency { cycle });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_sources(
    workflow_id: &str,
    source_type: &ValueType,
    transformers: &BTreeMap<String, TransformerConfiguration>,
) -> Vec<WorkflowConfigurationError> {
    let mut errors = Vec::new();

    for cfg in transformers.values() {
        for (label, key) in cfg.wired_inputs() {
            let produced = if key.source_id() == workflow_id {
                source_type
            } else {
                match transformers.get(key.source_id()) {
                    Some(producer) => producer.output_type(),
                    None => {
                        errors.push(WorkflowConfigurationError::UnknownNode {
                            node_id: key.source_id().to_string(),
                        });
                        continue;
                    }
                }
            };

            let accepted = cfg
                .declared_input(label)
                .map(|pin| pin.accepts(produced))
                .unwrap_or(false);

            if !accepted || key.value_type() != produced {
                errors.push(WorkflowConfigurationError::IncompatibleSource {
                    node_id: cfg.node_id().to_string(),
                    label: label.to_string(),
                    source_id: key.source_id().to_string(),
                    expected: cfg
                        .declared_input(label)
                        .map(|pin| pin.value_type.clone())
                        .unwrap_or(ValueType::Any),
                    provided: produced.clone(),
                });
            }
        }
    }

    errors
}

/// Finds one cycle among the nodes, if any, as a closed path (`a -> b -> a`).
fn find_cycle(transformers: &BTreeMap<String, TransformerConfiguration>) -> Option<Vec<String>> {
    // producer -> consumers; edges from the workflow source cannot close a cycle
    let mut graph: HashMap<&str, Vec<&str>> = HashMap::new();
    for cfg in transformers.values() {
        graph.entry(cfg.node_id()).or_default();
        for (_, key) in cfg.wired_inputs() {
            if transformers.contains_key(key.source_id()) {
                graph
                    .entry(key.source_id())
                    .or_default()
                    .push(cfg.node_id());
            }
        }
    }

    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    for node_id in transformers.keys() {
        if !visited.contains(node_id.as_str()) {
            if let Some(cycle) =
                dfs_cycle_detection(node_id, &graph, &mut visited, &mut rec_stack, &mut path)
            {
                return Some(cycle);
            }
        }
    }

    None
}

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
