// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;

use thiserror::Error;

use crate::errors::ConfigurationError;
use crate::model::{DataValueKey, ValueType};

/// Errors a transformer implementation reports from configuration or processing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformerError {
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("missing input '{label}'")]
    MissingInput { label: String },

    #[error("input '{label}' expected {expected} but received {received}")]
    UnexpectedInput {
        label: String,
        expected: ValueType,
        received: ValueType,
    },

    #[error("{0}")]
    Failed(String),
}

/// Runtime failures of the engine: context writes, node execution, run lifecycle.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("value of type {provided} cannot be stored under key '{key}'")]
    InvalidValueType {
        key: DataValueKey,
        provided: ValueType,
    },

    #[error("node '{node_id}' received a second value for input '{key}'")]
    DuplicateInputSupplied { node_id: String, key: DataValueKey },

    #[error("transformer for node '{node_id}' failed: {reason}")]
    TransformerExecutionFailed { node_id: String, reason: String },

    #[error("run {run_id} timed out after {timeout:?} with {missing} output(s) outstanding")]
    RunTimedOut {
        run_id: String,
        timeout: Duration,
        missing: usize,
    },

    #[error("run {run_id} was canceled by controller shutdown before it finished")]
    RunCanceled { run_id: String },

    #[error("task pool '{pool}' is not accepting work")]
    TaskRejected { pool: String },

    #[error("workflow controller is closed")]
    ControllerClosed,

    #[error("source value unavailable: {reason}")]
    SourceUnavailable { reason: String },

    #[error("no async runtime available: {reason}")]
    RuntimeUnavailable { reason: String },
}

/// Everything a results collector may be told about; the union of setup and runtime errors.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl WorkflowError {
    pub fn as_execution(&self) -> Option<&ExecutionError> {
        match self {
            WorkflowError::Execution(error) => Some(error),
            WorkflowError::Configuration(_) => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            WorkflowError::Execution(ExecutionError::RunTimedOut { .. })
        )
    }
}
