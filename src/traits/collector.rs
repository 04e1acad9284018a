// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::WorkflowError;
use crate::model::{DataValue, DataValueKey};

/// One delivered declared output of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowResult {
    pub run_id: String,
    pub key: DataValueKey,
    pub value: DataValue,
    /// The input datum that seeded the run.
    pub source: DataValue,
}

/// Caller-supplied sink for a run's outputs, errors and completion.
///
/// Callbacks are invoked from engine tasks and may run concurrently for different runs.
/// Within one run, `finished` is always the last call and happens exactly once. A panic in
/// any callback is caught and logged.
pub trait ResultsCollector: Send + Sync {
    fn handle_result(&self, result: WorkflowResult);

    fn handle_error(&self, error: WorkflowError);

    fn finished(&self);
}
