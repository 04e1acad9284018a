// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::config::consts::{DEFAULT_RUN_TIMEOUT_MS, DEFAULT_SHUTDOWN_GRACE_MS, FALLBACK_CONCURRENCY};
use crate::config::WorkflowBuilder;
use crate::errors::WorkflowConfigurationError;
use crate::model::{Parameters, ValueType, WorkflowDefinition};
use crate::traits::TransformerRegistry;

/// A workflow as written in YAML.
///
/// The workflow `id` is also the source id of each run's input value, so a node reads the
/// input by naming the workflow id in its `inputs`.
///
/// # Example
/// ```yaml
/// id: greeting
/// title: Greeting
/// source_type: text
/// engine:
///   node_concurrency: 8
///   run_timeout_ms: 30000
/// transformers:
///   - id: adapter
///     registration: identity
///     inputs: { value: greeting }
///   - id: suffix
///     registration: prefix_suffix_adder
///     params: { suffix: " World" }
///     inputs: { text: adapter }
/// outputs: [suffix]
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowConfig {
    pub id: String,
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    pub source_type: Option<ValueType>,
    #[serde(default)]
    pub engine: EngineOptions,
    #[serde(default)]
    pub transformers: Vec<NodeConfig>,
    #[serde(default)]
    pub outputs: Vec<String>,
}

/// One node of a [`WorkflowConfig`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    pub id: String,
    pub registration: String,
    #[serde(default)]
    pub params: Parameters,
    /// Pin label to source id (a node id or the workflow id).
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
}

/// Engine tuning. Every field is optional; the getters fall back to `config::consts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineOptions {
    pub node_concurrency: Option<usize>,
    pub run_concurrency: Option<usize>,
    pub run_timeout_ms: Option<u64>,
    pub shutdown_grace_ms: Option<u64>,
}

impl EngineOptions {
    /// Maximum transformer invocations in flight at once, across all runs.
    pub fn get_node_concurrency(&self) -> usize {
        self.node_concurrency
            .unwrap_or_else(default_concurrency)
            .max(1)
    }

    /// Maximum runs in flight at once.
    pub fn get_run_concurrency(&self) -> usize {
        self.run_concurrency
            .unwrap_or_else(default_concurrency)
            .max(1)
    }

    pub fn get_run_timeout(&self) -> Duration {
        Duration::from_millis(self.run_timeout_ms.unwrap_or(DEFAULT_RUN_TIMEOUT_MS))
    }

    pub fn get_shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms.unwrap_or(DEFAULT_SHUTDOWN_GRACE_MS))
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(FALLBACK_CONCURRENCY)
}

impl WorkflowConfig {
    /// Builds and validates the definition against `registry`.
    pub fn build(
        &self,
        registry: &dyn TransformerRegistry,
    ) -> Result<WorkflowDefinition, WorkflowConfigurationError> {
        let mut builder = WorkflowBuilder::new(self.id.clone(), registry);
        if let Some(title) = &self.title {
            builder.set_title(title.clone());
        }
        builder.set_description(self.description.clone());
        if let Some(source_type) = &self.source_type {
            builder.set_source_type(source_type.clone());
        }

        // every node must exist before any edge can be type checked against it
        for node in &self.transformers {
            builder.add_transformer(node.id.clone(), &node.registration)?;
            for (name, value) in &node.params {
                builder.set_parameter(&node.id, name.clone(), value.clone())?;
            }
        }
        for node in &self.transformers {
            for (label, source_id) in &node.inputs {
                builder.set_data_source(&node.id, label, source_id)?;
            }
        }
        for output in &self.outputs {
            builder.register_output(output)?;
        }

        builder.build()
    }
}

pub fn parse_config(yaml: &str) -> Result<WorkflowConfig, WorkflowConfigurationError> {
    serde_yaml::from_str(yaml).map_err(|e| WorkflowConfigurationError::Load {
        reason: e.to_string(),
    })
}

/// Load a workflow config from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<WorkflowConfig, WorkflowConfigurationError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| WorkflowConfigurationError::Load {
        reason: format!("{}: {}", path.display(), e),
    })?;
    parse_config(&content)
}

/// Load a workflow config and build its validated definition.
pub fn load_and_build<P: AsRef<Path>>(
    path: P,
    registry: &dyn TransformerRegistry,
) -> Result<(WorkflowDefinition, EngineOptions), WorkflowConfigurationError> {
    let cfg = load_config(path)?;
    let definition = cfg.build(registry)?;
    Ok((definition, cfg.engine))
}
