// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;

/// What happened to one node during one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingEventKind {
    /// Every input arrived and the transformer was handed to the node pool.
    Submitted,
    Completed { duration: Duration },
    Failed { reason: String },
    /// The run ended while the node was still waiting for inputs.
    Canceled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingEvent {
    pub run_id: String,
    pub node_id: String,
    pub kind: ProcessingEventKind,
}

/// Receives per-node progress for every run of a controller.
///
/// Events arrive from node tasks, so calls for one run may be concurrent. A panic is caught
/// and logged.
pub trait WorkflowObserver: Send + Sync {
    fn on_event(&self, event: &ProcessingEvent);
}

/// Observers registered when a run started.
pub type Observers = Arc<[Arc<dyn WorkflowObserver>]>;
