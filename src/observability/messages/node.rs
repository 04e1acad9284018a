// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for node controller lifecycle events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// All inputs arrived and the node's task was handed to the node pool.
///
/// # Log Level
/// `debug!` - Per-node detail
pub struct NodeSubmitted<'a> {
    pub run_id: &'a str,
    pub node_id: &'a str,
}

impl Display for NodeSubmitted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node '{}' submitted for execution", self.node_id)
    }
}

impl StructuredLog for NodeSubmitted<'_> {
    fn log(&self) {
        tracing::debug!(run_id = self.run_id, node_id = self.node_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "node",
            span_name = name,
            run_id = self.run_id,
            node_id = self.node_id,
        )
    }
}

/// The node's transformer produced a value and it was published.
///
/// # Log Level
/// `debug!` - Per-node detail
pub struct NodeCompleted<'a> {
    pub run_id: &'a str,
    pub node_id: &'a str,
    pub duration: Duration,
}

impl Display for NodeCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' completed in {:?}",
            self.node_id, self.duration
        )
    }
}

impl StructuredLog for NodeCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            run_id = self.run_id,
            node_id = self.node_id,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "node_completed",
            span_name = name,
            run_id = self.run_id,
            node_id = self.node_id,
            duration = ?self.duration,
        )
    }
}

/// The node's task failed; its output will never be published.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use datatrax::observability::messages::node::NodeFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "boom");
/// let msg = NodeFailed {
///     run_id: "2f1d",
///     node_id: "suffix",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct NodeFailed<'a> {
    pub run_id: &'a str,
    pub node_id: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for NodeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node '{}' failed: {}", self.node_id, self.error)
    }
}

impl StructuredLog for NodeFailed<'_> {
    fn log(&self) {
        tracing::error!(
            run_id = self.run_id,
            node_id = self.node_id,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "node_failed",
            span_name = name,
            run_id = self.run_id,
            node_id = self.node_id,
        )
    }
}

/// A node still awaiting inputs was canceled.
///
/// # Log Level
/// `debug!` - Per-node detail
pub struct NodeCanceled<'a> {
    pub run_id: &'a str,
    pub node_id: &'a str,
}

impl Display for NodeCanceled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node '{}' canceled before submission", self.node_id)
    }
}

impl StructuredLog for NodeCanceled<'_> {
    fn log(&self) {
        tracing::debug!(run_id = self.run_id, node_id = self.node_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "node_canceled",
            span_name = name,
            run_id = self.run_id,
            node_id = self.node_id,
        )
    }
}

/// A workflow observer panicked while handling a processing event; the run carries on.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ObserverPanicked<'a> {
    pub run_id: &'a str,
    pub node_id: &'a str,
}

impl Display for ObserverPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Workflow observer panicked on an event for node '{}'", self.node_id)
    }
}

impl StructuredLog for ObserverPanicked<'_> {
    fn log(&self) {
        tracing::error!(run_id = self.run_id, node_id = self.node_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "observer_panicked",
            span_name = name,
            run_id = self.run_id,
            node_id = self.node_id,
        )
    }
}
