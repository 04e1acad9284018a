// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for workflow definition validation.
//!
//! This module contains message types for logging events related to:
//! * Validation start and completion
//! * Cyclic dependency detection
//! * Any other rejected definition

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Cyclic dependency detected in a workflow.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use datatrax::observability::messages::validation::CyclicDependencyDetected;
///
/// let cycle = vec!["a".to_string(), "b".to_string(), "a".to_string()];
/// let msg = CyclicDependencyDetected {
///     cycle: &cycle,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct CyclicDependencyDetected<'a> {
    pub cycle: &'a [String],
}

impl Display for CyclicDependencyDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Cyclic dependency detected: {}", self.cycle.join(" -> "))
    }
}

impl StructuredLog for CyclicDependencyDetected<'_> {
    fn log(&self) {
        tracing::error!(
            cycle = %self.cycle.join(" -> "),
            cycle_length = self.cycle.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            cycle = %self.cycle.join(" -> "),
            cycle_length = self.cycle.len(),
        )
    }
}

/// Validation of a workflow definition started.
///
/// # Log Level
/// `debug!` - Routine
pub struct ValidationStarted<'a> {
    pub workflow_id: &'a str,
    pub transformer_count: usize,
}

impl Display for ValidationStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Validating workflow '{}' with {} transformers",
            self.workflow_id, self.transformer_count
        )
    }
}

impl StructuredLog for ValidationStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            workflow_id = self.workflow_id,
            transformer_count = self.transformer_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "validation",
            span_name = name,
            workflow_id = self.workflow_id,
        )
    }
}

/// Validation passed.
///
/// # Log Level
/// `debug!` - Routine
pub struct ValidationCompleted<'a> {
    pub workflow_id: &'a str,
}

impl Display for ValidationCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Workflow '{}' passed validation", self.workflow_id)
    }
}

impl StructuredLog for ValidationCompleted<'_> {
    fn log(&self) {
        tracing::debug!(workflow_id = self.workflow_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "validation_completed",
            span_name = name,
            workflow_id = self.workflow_id,
        )
    }
}

/// Validation rejected the definition.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ValidationFailed<'a> {
    pub workflow_id: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ValidationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Workflow '{}' failed validation: {}",
            self.workflow_id, self.error
        )
    }
}

impl StructuredLog for ValidationFailed<'_> {
    fn log(&self) {
        tracing::error!(
            workflow_id = self.workflow_id,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "validation_failed",
            span_name = name,
            workflow_id = self.workflow_id,
        )
    }
}
