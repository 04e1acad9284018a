// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The validated, immutable shape of a workflow as consumed by the engine.
//!
//! Definitions are produced by [`crate::config::WorkflowBuilder`]; the engine trusts them
//! to be acyclic and type compatible and only re-checks what it needs at run setup
//! (unwired required pins).

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::model::{DataInputPin, DataValueKey, ValueType};

/// Parameter name to value, as handed to a transformer factory.
pub type Parameters = BTreeMap<String, serde_yaml::Value>;

/// Per-node configuration: which registration to instantiate, with which parameters, and
/// where each input pin gets its value from.
///
/// `Clone` produces a fully detached copy; edits to one copy never show up in another.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformerConfiguration {
    node_id: String,
    registration_id: String,
    parameters: Parameters,
    pins: Vec<DataInputPin>,
    sources: BTreeMap<String, Option<DataValueKey>>,
    output_type: ValueType,
}

impl TransformerConfiguration {
    /// New configuration with every declared pin present but unwired.
    pub fn new(
        node_id: impl Into<String>,
        registration_id: impl Into<String>,
        pins: Vec<DataInputPin>,
        output_type: ValueType,
    ) -> Self {
        let sources = pins.iter().map(|pin| (pin.label.clone(), None)).collect();
        Self {
            node_id: node_id.into(),
            registration_id: registration_id.into(),
            parameters: Parameters::new(),
            pins,
            sources,
            output_type,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn registration_id(&self) -> &str {
        &self.registration_id
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&serde_yaml::Value> {
        self.parameters.get(name)
    }

    pub fn declared_inputs(&self) -> &[DataInputPin] {
        &self.pins
    }

    pub fn declared_input(&self, label: &str) -> Option<&DataInputPin> {
        self.pins.iter().find(|pin| pin.label == label)
    }

    /// The key wired to `label`, or `None` when the pin is unwired or unknown.
    pub fn data_source(&self, label: &str) -> Option<&DataValueKey> {
        self.sources.get(label).and_then(Option::as_ref)
    }

    /// Every wired (label, key) pair.
    pub fn wired_inputs(&self) -> impl Iterator<Item = (&str, &DataValueKey)> {
        self.sources
            .iter()
            .filter_map(|(label, key)| key.as_ref().map(|key| (label.as_str(), key)))
    }

    pub fn output_type(&self) -> &ValueType {
        &self.output_type
    }

    pub fn output_key(&self) -> DataValueKey {
        DataValueKey::new(self.node_id.clone(), self.output_type.clone())
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: serde_yaml::Value) {
        self.parameters.insert(name.into(), value);
    }

    /// Wires `label` to `source`. Returns `false` when the pin is not declared.
    pub fn set_data_source(&mut self, label: &str, source: DataValueKey) -> bool {
        match self.sources.get_mut(label) {
            Some(slot) => {
                *slot = Some(source);
                true
            }
            None => false,
        }
    }

    pub fn clear_data_source(&mut self, label: &str) {
        if let Some(slot) = self.sources.get_mut(label) {
            *slot = None;
        }
    }

    /// Unwires every pin fed by `source_id`.
    pub fn remove_sources_from(&mut self, source_id: &str) {
        for slot in self.sources.values_mut() {
            if slot.as_ref().is_some_and(|key| key.source_id() == source_id) {
                *slot = None;
            }
        }
    }
}

/// An immutable, validated workflow definition shared by every run of a controller.
#[derive(Debug, Clone)]
pub struct WorkflowDefinition {
    id: String,
    title: String,
    description: String,
    source_type: ValueType,
    transformers: BTreeMap<String, TransformerConfiguration>,
    outputs: HashSet<DataValueKey>,
    dependents: HashMap<String, Vec<String>>,
}

impl WorkflowDefinition {
    pub(crate) fn new(
        id: String,
        title: String,
        description: String,
        source_type: ValueType,
        transformers: BTreeMap<String, TransformerConfiguration>,
        outputs: HashSet<DataValueKey>,
    ) -> Self {
        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        for cfg in transformers.values() {
            for (_, key) in cfg.wired_inputs() {
                let entry = dependents.entry(key.source_id().to_string()).or_default();
                if !entry.iter().any(|id| id == cfg.node_id()) {
                    entry.push(cfg.node_id().to_string());
                }
            }
        }

        Self {
            id,
            title,
            description,
            source_type,
            transformers,
            outputs,
            dependents,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn source_type(&self) -> &ValueType {
        &self.source_type
    }

    /// The key under which each run's input datum is published.
    pub fn input_key(&self) -> DataValueKey {
        DataValueKey::new(self.id.clone(), self.source_type.clone())
    }

    pub fn transformers(&self) -> impl Iterator<Item = &TransformerConfiguration> {
        self.transformers.values()
    }

    pub fn transformer(&self, node_id: &str) -> Option<&TransformerConfiguration> {
        self.transformers.get(node_id)
    }

    pub fn transformer_count(&self) -> usize {
        self.transformers.len()
    }

    pub fn declared_outputs(&self) -> &HashSet<DataValueKey> {
        &self.outputs
    }

    /// Declared outputs that can only be produced if `node_id` produces its value,
    /// including the node's own output when it is declared.
    pub fn outputs_downstream_of(&self, node_id: &str) -> HashSet<DataValueKey> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([node_id]);

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(next) = self.dependents.get(current) {
                queue.extend(next.iter().map(String::as_str));
            }
        }

        self.outputs
            .iter()
            .filter(|key| visited.contains(key.source_id()))
            .cloned()
            .collect()
    }
}
