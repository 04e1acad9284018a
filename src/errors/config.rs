// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::errors::{RegistryError, TransformerError};
use crate::model::ValueType;

/// Defects found while assembling or loading a workflow definition.
#[derive(Debug, Error)]
pub enum WorkflowConfigurationError {
    #[error("transformer registration '{registration_id}' is not registered")]
    UnknownRegistration { registration_id: String },

    #[error("node '{node_id}' does not exist in workflow")]
    UnknownNode { node_id: String },

    #[error("node '{node_id}' has no input pin labelled '{label}'")]
    UnknownInputPin { node_id: String, label: String },

    #[error(
        "node '{node_id}' pin '{label}' expects {expected} but source '{source_id}' produces {provided}"
    )]
    IncompatibleSource {
        node_id: String,
        label: String,
        source_id: String,
        expected: ValueType,
        provided: ValueType,
    },

    #[error("cyclic dependency detected: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("duplicate node id: '{node_id}'")]
    DuplicateNodeId { node_id: String },

    #[error("workflow '{workflow_id}' has no source type")]
    MissingSourceType { workflow_id: String },

    #[error("failed to load workflow configuration: {reason}")]
    Load { reason: String },
}

/// Failures raised while turning a definition into a runnable controller or run.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("node '{node_id}' has required input pin '{label}' with no wired source")]
    UnresolvedRequiredInput { node_id: String, label: String },

    #[error("failed to configure transformer for node '{node_id}': {reason}")]
    TransformerConfigurationFailed { node_id: String, reason: String },

    #[error(transparent)]
    Workflow(#[from] WorkflowConfigurationError),
}

impl ConfigurationError {
    pub(crate) fn registration_missing(node_id: &str, error: RegistryError) -> Self {
        ConfigurationError::TransformerConfigurationFailed {
            node_id: node_id.to_string(),
            reason: error.to_string(),
        }
    }

    pub(crate) fn rejected(node_id: &str, error: TransformerError) -> Self {
        ConfigurationError::TransformerConfigurationFailed {
            node_id: node_id.to_string(),
            reason: error.to_string(),
        }
    }
}
