// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::config::validate_workflow;
use crate::errors::WorkflowConfigurationError;
use crate::model::{DataValueKey, TransformerConfiguration, ValueType, WorkflowDefinition};
use crate::observability::messages::{validation::*, StructuredLog};
use crate::traits::TransformerRegistry;

/// Assembles a [`WorkflowDefinition`] node by node, checking each edge as it is wired.
///
/// The workflow id doubles as the producer id of the workflow's input value, so a node
/// consumes the run's input by naming the workflow id as its source.
///
/// ```
/// use datatrax::config::{StaticTransformerRegistry, WorkflowBuilder};
/// use datatrax::model::ValueType;
///
/// let registry = StaticTransformerRegistry::with_builtins();
/// let mut builder = WorkflowBuilder::new("greeting", &registry);
/// builder.set_source_type(ValueType::Text);
/// builder.add_transformer("shout", "change_text_case").unwrap();
/// builder
///     .set_parameter("shout", "case", serde_yaml::Value::from("upper"))
///     .unwrap();
/// builder.set_data_source("shout", "text", "greeting").unwrap();
/// builder.register_output("shout").unwrap();
///
/// let definition = builder.build().unwrap();
/// assert_eq!(definition.declared_outputs().len(), 1);
/// ```
pub struct WorkflowBuilder<'r> {
    id: String,
    title: String,
    description: String,
    source_type: Option<ValueType>,
    registry: &'r dyn TransformerRegistry,
    transformers: BTreeMap<String, TransformerConfiguration>,
    outputs: Vec<String>,
}

impl<'r> WorkflowBuilder<'r> {
    pub fn new(id: impl Into<String>, registry: &'r dyn TransformerRegistry) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            description: String::new(),
            source_type: None,
            registry,
            transformers: BTreeMap::new(),
            outputs: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = description.into();
        self
    }

    /// Sets the type of each run's input. Edges already wired to the workflow source are
    /// re-checked by [`build`](Self::build).
    pub fn set_source_type(&mut self, source_type: ValueType) -> &mut Self {
        self.source_type = Some(source_type);
        self
    }

    /// The key each run's input is published under, once a source type is set.
    pub fn input_key(&self) -> Option<DataValueKey> {
        self.source_type
            .as_ref()
            .map(|source_type| DataValueKey::new(self.id.clone(), source_type.clone()))
    }

    /// Adds a node instantiating `registration_id`, with every pin unwired.
    pub fn add_transformer(
        &mut self,
        node_id: impl Into<String>,
        registration_id: &str,
    ) -> Result<(), WorkflowConfigurationError> {
        let node_id = node_id.into();
        if node_id == self.id || self.transformers.contains_key(&node_id) {
            return Err(WorkflowConfigurationError::DuplicateNodeId { node_id });
        }

        let registration = self.registry.lookup(registration_id).map_err(|_| {
            WorkflowConfigurationError::UnknownRegistration {
                registration_id: registration_id.to_string(),
            }
        })?;

        let cfg = TransformerConfiguration::new(
            node_id.clone(),
            registration.id.clone(),
            registration.inputs.clone(),
            registration.output_type.clone(),
        );
        self.transformers.insert(node_id, cfg);
        Ok(())
    }

    pub fn set_parameter(
        &mut self,
        node_id: &str,
        name: impl Into<String>,
        value: serde_yaml::Value,
    ) -> Result<(), WorkflowConfigurationError> {
        self.node_mut(node_id)?.set_parameter(name, value);
        Ok(())
    }

    /// Wires pin `label` of `node_id` to the value produced by `source_id` (a node id or
    /// the workflow id). Fails if the producer's type is not accepted by the pin.
    pub fn set_data_source(
        &mut self,
        node_id: &str,
        label: &str,
        source_id: &str,
    ) -> Result<(), WorkflowConfigurationError> {
        let produced = self.produced_type(source_id)?;

        let cfg = self.node_mut(node_id)?;
        let pin = cfg.declared_input(label).ok_or_else(|| {
            WorkflowConfigurationError::UnknownInputPin {
                node_id: node_id.to_string(),
                label: label.to_string(),
            }
        })?;

        if !pin.accepts(&produced) {
            return Err(WorkflowConfigurationError::IncompatibleSource {
                node_id: node_id.to_string(),
                label: label.to_string(),
                source_id: source_id.to_string(),
                expected: pin.value_type.clone(),
                provided: produced,
            });
        }

        cfg.set_data_source(label, DataValueKey::new(source_id, produced));
        Ok(())
    }

    pub fn clear_data_source(
        &mut self,
        node_id: &str,
        label: &str,
    ) -> Result<(), WorkflowConfigurationError> {
        let cfg = self.node_mut(node_id)?;
        if cfg.declared_input(label).is_none() {
            return Err(WorkflowConfigurationError::UnknownInputPin {
                node_id: node_id.to_string(),
                label: label.to_string(),
            });
        }
        cfg.clear_data_source(label);
        Ok(())
    }

    /// Removes a node, unwiring every pin it fed and dropping it from the outputs.
    pub fn remove_transformer(
        &mut self,
        node_id: &str,
    ) -> Result<TransformerConfiguration, WorkflowConfigurationError> {
        let removed = self.transformers.remove(node_id).ok_or_else(|| {
            WorkflowConfigurationError::UnknownNode {
                node_id: node_id.to_string(),
            }
        })?;

        for cfg in self.transformers.values_mut() {
            cfg.remove_sources_from(node_id);
        }
        self.outputs.retain(|output| output != node_id);

        Ok(removed)
    }

    /// Declares the node's output as a workflow output delivered to the results collector.
    pub fn register_output(&mut self, node_id: &str) -> Result<DataValueKey, WorkflowConfigurationError> {
        let key = self.node(node_id)?.output_key();
        if !self.outputs.iter().any(|output| output == node_id) {
            self.outputs.push(node_id.to_string());
        }
        Ok(key)
    }

    /// Returns whether `node_id` was a declared output.
    pub fn remove_output(&mut self, node_id: &str) -> bool {
        let before = self.outputs.len();
        self.outputs.retain(|output| output != node_id);
        self.outputs.len() != before
    }

    /// A detached copy of a node's configuration.
    pub fn configuration(&self, node_id: &str) -> Option<TransformerConfiguration> {
        self.transformers.get(node_id).cloned()
    }

    pub fn build(&self) -> Result<WorkflowDefinition, WorkflowConfigurationError> {
        ValidationStarted {
            workflow_id: &self.id,
            transformer_count: self.transformers.len(),
        }
        .log();

        if let Err(errors) = validate_workflow(
            &self.id,
            self.source_type.as_ref(),
            &self.transformers,
            &self.outputs,
        ) {
            for error in &errors {
                match error {
                    WorkflowConfigurationError::CyclicDependency { cycle } => {
                        CyclicDependencyDetected { cycle }.log()
                    }
                    other => ValidationFailed {
                        workflow_id: &self.id,
                        error: other,
                    }
                    .log(),
                }
            }
            return Err(errors
                .into_iter()
                .next()
                .unwrap_or(WorkflowConfigurationError::Load {
                    reason: "validation failed".to_string(),
                }));
        }

        let source_type = self.source_type.clone().unwrap_or(ValueType::Any);
        let outputs: HashSet<DataValueKey> = self
            .outputs
            .iter()
            .filter_map(|node_id| self.transformers.get(node_id))
            .map(TransformerConfiguration::output_key)
            .collect();

        ValidationCompleted {
            workflow_id: &self.id,
        }
        .log();

        Ok(WorkflowDefinition::new(
            self.id.clone(),
            self.title.clone(),
            self.description.clone(),
            source_type,
            self.transformers.clone(),
            outputs,
        ))
    }

    /// Convenience for [`build`](Self::build) wrapped in an `Arc`, as the controller shares it.
    pub fn build_shared(&self) -> Result<Arc<WorkflowDefinition>, WorkflowConfigurationError> {
        self.build().map(Arc::new)
    }

    fn produced_type(&self, source_id: &str) -> Result<ValueType, WorkflowConfigurationError> {
        if source_id == self.id {
            return self.source_type.clone().ok_or_else(|| {
                WorkflowConfigurationError::MissingSourceType {
                    workflow_id: self.id.clone(),
                }
            });
        }
        Ok(self.node(source_id)?.output_type().clone())
    }

    fn node(&self, node_id: &str) -> Result<&TransformerConfiguration, WorkflowConfigurationError> {
        self.transformers
            .get(node_id)
            .ok_or_else(|| WorkflowConfigurationError::UnknownNode {
                node_id: node_id.to_string(),
            })
    }

    fn node_mut(
        &mut self,
        node_id: &str,
    ) -> Result<&mut TransformerConfiguration, WorkflowConfigurationError> {
        self.transformers
            .get_mut(node_id)
            .ok_or_else(|| WorkflowConfigurationError::UnknownNode {
                node_id: node_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticTransformerRegistry;

    fn greeting_builder(registry: &StaticTransformerRegistry) -> WorkflowBuilder<'_> {
        let mut builder = WorkflowBuilder::new("greeting", registry);
        builder.set_source_type(ValueType::Text);
        builder.add_transformer("adapter", "identity").unwrap();
        builder.add_transformer("suffix", "prefix_suffix_adder").unwrap();
        builder
            .set_parameter("suffix", "suffix", serde_yaml::Value::from(" World"))
            .unwrap();
        builder.set_data_source("adapter", "value", "greeting").unwrap();
        builder.set_data_source("suffix", "text", "adapter").unwrap();
        builder.register_output("suffix").unwrap();
        builder
    }

    #[test]
    fn test_build_linear_workflow() {
        let registry = StaticTransformerRegistry::with_builtins();
        let definition = greeting_builder(&registry).build().unwrap();

        assert_eq!(definition.id(), "greeting");
        assert_eq!(definition.transformer_count(), 2);
        assert_eq!(
            definition.input_key(),
            DataValueKey::new("greeting", ValueType::Text)
        );
        assert!(definition
            .declared_outputs()
            .contains(&DataValueKey::new("suffix", ValueType::Text)));

        let suffix = definition.transformer("suffix").unwrap();
        assert_eq!(
            suffix.data_source("text"),
            Some(&DataValueKey::new("adapter", ValueType::Text))
        );
    }

    #[test]
    fn test_builder_rejections() {
        let registry = StaticTransformerRegistry::with_builtins();
        let mut builder = greeting_builder(&registry);
        builder.add_transformer("count", "token_counter").unwrap();

        match builder.add_transformer("adapter", "identity") {
            Err(WorkflowConfigurationError::DuplicateNodeId { node_id }) => {
                assert_eq!(node_id, "adapter")
            }
            other => panic!("Expected DuplicateNodeId, got {:?}", other),
        }

        match builder.add_transformer("x", "word_frequency") {
            Err(WorkflowConfigurationError::UnknownRegistration { .. }) => {}
            other => panic!("Expected UnknownRegistration, got {:?}", other),
        }

        match builder.set_data_source("suffix", "missing", "adapter") {
            Err(WorkflowConfigurationError::UnknownInputPin { label, .. }) => {
                assert_eq!(label, "missing")
            }
            other => panic!("Expected UnknownInputPin, got {:?}", other),
        }

        // integer output cannot feed a text pin
        match builder.set_data_source("suffix", "text", "count") {
            Err(WorkflowConfigurationError::IncompatibleSource {
                expected, provided, ..
            }) => {
                assert_eq!(expected, ValueType::Text);
                assert_eq!(provided, ValueType::Integer);
            }
            other => panic!("Expected IncompatibleSource, got {:?}", other),
        }

        match builder.set_data_source("suffix", "text", "ghost") {
            Err(WorkflowConfigurationError::UnknownNode { node_id }) => {
                assert_eq!(node_id, "ghost")
            }
            other => panic!("Expected UnknownNode, got {:?}", other),
        }

        assert!(builder.register_output("ghost").is_err());
    }

    #[test]
    fn test_remove_transformer_unwires_dependents() {
        let registry = StaticTransformerRegistry::with_builtins();
        let mut builder = greeting_builder(&registry);
        builder.register_output("adapter").unwrap();

        let removed = builder.remove_transformer("adapter").unwrap();
        assert_eq!(removed.node_id(), "adapter");

        let suffix = builder.configuration("suffix").unwrap();
        assert!(suffix.data_source("text").is_none());
        assert!(!builder.remove_output("adapter"));
        assert!(builder.remove_output("suffix"));
    }

    #[test]
    fn test_build_detects_cycle() {
        let registry = StaticTransformerRegistry::with_builtins();
        let mut builder = WorkflowBuilder::new("loop", &registry);
        builder.set_source_type(ValueType::Text);
        builder.add_transformer("a", "reverse_text").unwrap();
        builder.add_transformer("b", "reverse_text").unwrap();
        builder.set_data_source("a", "text", "b").unwrap();
        builder.set_data_source("b", "text", "a").unwrap();

        match builder.build() {
            Err(WorkflowConfigurationError::CyclicDependency { cycle }) => {
                assert_eq!(cycle.len(), 3)
            }
            other => panic!("Expected CyclicDependency, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_source_requires_source_type() {
        let registry = StaticTransformerRegistry::with_builtins();
        let mut builder = WorkflowBuilder::new("untyped", &registry);
        builder.add_transformer("a", "identity").unwrap();

        assert!(builder.input_key().is_none());
        assert!(matches!(
            builder.set_data_source("a", "value", "untyped"),
            Err(WorkflowConfigurationError::MissingSourceType { .. })
        ));
        assert!(matches!(
            builder.build(),
            Err(WorkflowConfigurationError::MissingSourceType { .. })
        ));
    }

    #[test]
    fn test_configuration_copy_is_detached() {
        let registry = StaticTransformerRegistry::with_builtins();
        let builder = greeting_builder(&registry);

        let mut copy = builder.configuration("suffix").unwrap();
        copy.set_parameter("suffix", serde_yaml::Value::from("!"));

        assert_eq!(
            builder.configuration("suffix").unwrap().parameter("suffix"),
            Some(&serde_yaml::Value::from(" World"))
        );
    }
}
