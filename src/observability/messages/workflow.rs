// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for run, controller and pool lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Controller creation and shutdown
//! * Run lifecycle (start, completion, timeout, cancellation, abandoned outputs)
//! * Results collector misbehaviour
//! * Task pool shutdown

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A workflow controller finished configuring its transformers.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ControllerCreated<'a> {
    pub workflow_id: &'a str,
    pub transformer_count: usize,
    pub node_concurrency: usize,
    pub run_concurrency: usize,
}

impl Display for ControllerCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Workflow '{}' ready: {} transformers, node_concurrency={}, run_concurrency={}",
            self.workflow_id, self.transformer_count, self.node_concurrency, self.run_concurrency
        )
    }
}

impl StructuredLog for ControllerCreated<'_> {
    fn log(&self) {
        tracing::info!(
            workflow_id = self.workflow_id,
            transformer_count = self.transformer_count,
            node_concurrency = self.node_concurrency,
            run_concurrency = self.run_concurrency,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "controller",
            span_name = name,
            workflow_id = self.workflow_id,
        )
    }
}

/// A workflow controller stopped accepting runs and released its pools.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ControllerClosed<'a> {
    pub workflow_id: &'a str,
    pub graceful: bool,
}

impl Display for ControllerClosed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let how = if self.graceful { "gracefully" } else { "forcibly" };
        write!(f, "Workflow '{}' closed {}", self.workflow_id, how)
    }
}

impl StructuredLog for ControllerClosed<'_> {
    fn log(&self) {
        tracing::info!(
            workflow_id = self.workflow_id,
            graceful = self.graceful,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "controller_closed",
            span_name = name,
            workflow_id = self.workflow_id,
        )
    }
}

/// A run was seeded with its input value.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use datatrax::observability::messages::workflow::RunStarted;
///
/// let msg = RunStarted {
///     run_id: "2f1d",
///     workflow_id: "greeting",
///     node_count: 2,
///     output_count: 1,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct RunStarted<'a> {
    pub run_id: &'a str,
    pub workflow_id: &'a str,
    pub node_count: usize,
    pub output_count: usize,
}

impl Display for RunStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Run {} of '{}' started: {} nodes, {} declared outputs",
            self.run_id, self.workflow_id, self.node_count, self.output_count
        )
    }
}

impl StructuredLog for RunStarted<'_> {
    fn log(&self) {
        tracing::info!(
            run_id = self.run_id,
            workflow_id = self.workflow_id,
            node_count = self.node_count,
            output_count = self.output_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run",
            span_name = name,
            run_id = self.run_id,
            workflow_id = self.workflow_id,
        )
    }
}

/// A run ended; `finished()` is about to be delivered.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RunCompleted<'a> {
    pub run_id: &'a str,
    pub workflow_id: &'a str,
    pub delivered: usize,
    pub errors: usize,
    pub duration: Duration,
}

impl Display for RunCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Run {} of '{}' finished: {} outputs delivered, {} errors in {:?}",
            self.run_id, self.workflow_id, self.delivered, self.errors, self.duration
        )
    }
}

impl StructuredLog for RunCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            run_id = self.run_id,
            workflow_id = self.workflow_id,
            delivered = self.delivered,
            errors = self.errors,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run_completed",
            span_name = name,
            run_id = self.run_id,
            duration = ?self.duration,
        )
    }
}

/// A run hit its timeout with outputs still outstanding.
///
/// # Log Level
/// `warn!` - Run ends with partial results
pub struct RunTimedOut<'a> {
    pub run_id: &'a str,
    pub timeout: Duration,
    pub missing: usize,
}

impl Display for RunTimedOut<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Run {} timed out after {:?}; {} outputs never arrived",
            self.run_id, self.timeout, self.missing
        )
    }
}

impl StructuredLog for RunTimedOut<'_> {
    fn log(&self) {
        tracing::warn!(
            run_id = self.run_id,
            timeout_ms = self.timeout.as_millis() as u64,
            missing = self.missing,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("run_timed_out", span_name = name, run_id = self.run_id)
    }
}

/// A run was cut short by a forced controller shutdown.
///
/// # Log Level
/// `warn!` - Run ends with partial results
pub struct RunCanceled<'a> {
    pub run_id: &'a str,
}

impl Display for RunCanceled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Run {} canceled by controller shutdown", self.run_id)
    }
}

impl StructuredLog for RunCanceled<'_> {
    fn log(&self) {
        tracing::warn!(run_id = self.run_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("run_canceled", span_name = name, run_id = self.run_id)
    }
}

/// Declared outputs that can no longer be produced because an upstream node failed.
///
/// # Log Level
/// `warn!` - Run ends with partial results
pub struct OutputsAbandoned<'a> {
    pub run_id: &'a str,
    pub failed_node: &'a str,
    pub abandoned: usize,
}

impl Display for OutputsAbandoned<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Run {}: {} declared outputs abandoned after '{}' failed",
            self.run_id, self.abandoned, self.failed_node
        )
    }
}

impl StructuredLog for OutputsAbandoned<'_> {
    fn log(&self) {
        tracing::warn!(
            run_id = self.run_id,
            failed_node = self.failed_node,
            abandoned = self.abandoned,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "outputs_abandoned",
            span_name = name,
            run_id = self.run_id,
            failed_node = self.failed_node,
        )
    }
}

/// A results collector callback panicked; the run carries on.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct CollectorPanicked<'a> {
    pub run_id: &'a str,
    pub callback: &'static str,
}

impl Display for CollectorPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Results collector panicked in {} during run {}",
            self.callback, self.run_id
        )
    }
}

impl StructuredLog for CollectorPanicked<'_> {
    fn log(&self) {
        tracing::error!(run_id = self.run_id, callback = self.callback, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "collector_panicked",
            span_name = name,
            run_id = self.run_id,
            callback = self.callback,
        )
    }
}

/// A task pool did not drain within its grace period and was forcibly stopped.
///
/// # Log Level
/// `warn!` - Remaining tasks are aborted
pub struct PoolForcedShutdown<'a> {
    pub pool: &'a str,
    pub grace: Duration,
    pub remaining: usize,
}

impl Display for PoolForcedShutdown<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pool '{}' did not drain within {:?}; aborting {} tasks",
            self.pool, self.grace, self.remaining
        )
    }
}

impl StructuredLog for PoolForcedShutdown<'_> {
    fn log(&self) {
        tracing::warn!(
            pool = self.pool,
            grace_ms = self.grace.as_millis() as u64,
            remaining = self.remaining,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("pool_forced_shutdown", span_name = name, pool = self.pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_completed_display() {
        let msg = RunCompleted {
            run_id: "r1",
            workflow_id: "greeting",
            delivered: 1,
            errors: 0,
            duration: Duration::from_millis(5),
        };
        assert_eq!(
            msg.to_string(),
            "Run r1 of 'greeting' finished: 1 outputs delivered, 0 errors in 5ms"
        );
    }

    #[test]
    fn test_controller_closed_display() {
        let msg = ControllerClosed {
            workflow_id: "greeting",
            graceful: false,
        };
        assert_eq!(msg.to_string(), "Workflow 'greeting' closed forcibly");
    }

    #[test]
    fn test_run_canceled_display() {
        let msg = RunCanceled { run_id: "r7" };
        assert_eq!(msg.to_string(), "Run r7 canceled by controller shutdown");
    }
}
