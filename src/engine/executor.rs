// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Drives one run of a workflow from its input datum to its declared outputs.
//!
//! The executor owns the run's [`ExecutionContext`] and one [`NodeController`] per node.
//! Node tasks and the context's listeners talk back to it over an unbounded channel of
//! [`RunEvent`]s, so every collector callback for a run is made from the run's own task,
//! one at a time, with `finished` last.

use std::collections::{HashMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::engine::context::{ExecutionContext, Listener};
use crate::engine::node::NodeController;
use crate::errors::{ConfigurationError, ExecutionError, WorkflowError};
use crate::model::{DataValue, DataValueKey, WorkflowDefinition};
use crate::observability::messages::{workflow::*, StructuredLog};
use crate::traits::{
    Observers, ResultsCollector, TaskExecutionService, Transformer, WorkflowResult,
};

pub(crate) enum RunEvent {
    /// A declared output was published.
    Output { key: DataValueKey, value: DataValue },
    NodeFailed {
        node_id: String,
        error: ExecutionError,
    },
}

pub struct WorkflowExecutor {
    run_id: String,
    definition: Arc<WorkflowDefinition>,
    context: Arc<ExecutionContext>,
    nodes: Vec<Arc<NodeController>>,
    events: UnboundedSender<RunEvent>,
    receiver: UnboundedReceiver<RunEvent>,
    timeout: Duration,
}

impl WorkflowExecutor {
    /// Sets up a run: one node controller per configured transformer, each subscribed to
    /// the keys it consumes. Nothing executes until [`process`](Self::process).
    pub fn new(
        run_id: impl Into<String>,
        definition: Arc<WorkflowDefinition>,
        transformers: &HashMap<String, Arc<dyn Transformer>>,
        executor: Arc<dyn TaskExecutionService>,
        observers: Observers,
        timeout: Duration,
    ) -> Result<Self, ConfigurationError> {
        let run_id = run_id.into();
        let context = ExecutionContext::new();
        let (events, receiver) = unbounded_channel();

        let mut nodes = Vec::with_capacity(definition.transformer_count());
        for configuration in definition.transformers() {
            let transformer = transformers
                .get(configuration.node_id())
                .cloned()
                .ok_or_else(|| ConfigurationError::TransformerConfigurationFailed {
                    node_id: configuration.node_id().to_string(),
                    reason: "no transformer instance was created for this node".to_string(),
                })?;
            nodes.push(NodeController::new(
                run_id.clone(),
                configuration,
                transformer,
                &context,
                executor.clone(),
                events.clone(),
                observers.clone(),
            )?);
        }

        for node in &nodes {
            let keys: Vec<DataValueKey> = node.awaited_keys().cloned().collect();
            if keys.is_empty() {
                continue;
            }
            let registration = context.register_listener(keys, node.listener());
            node.attach_registration(registration);
        }

        Ok(Self {
            run_id,
            definition,
            context,
            nodes,
            events,
            receiver,
            timeout,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn context(&self) -> &Arc<ExecutionContext> {
        &self.context
    }

    /// Runs to completion: seeds `input`, delivers each declared output to `collector` as
    /// it is published, and reports node failures and the timeout as errors. Returns once
    /// every declared output was either delivered or abandoned, or the timeout elapsed.
    /// `collector.finished()` is called exactly once, last.
    pub async fn process(mut self, input: DataValue, collector: Arc<dyn ResultsCollector>) {
        let started = Instant::now();
        let mut outstanding: HashSet<DataValueKey> = self.definition.declared_outputs().clone();
        let mut delivered = 0;
        let mut errors = 0;

        RunStarted {
            run_id: &self.run_id,
            workflow_id: self.definition.id(),
            node_count: self.nodes.len(),
            output_count: outstanding.len(),
        }
        .log();

        let output_events = self.events.clone();
        let on_output: Listener = Arc::new(move |key, value| {
            let _ = output_events.send(RunEvent::Output {
                key: key.clone(),
                value: value.clone(),
            });
        });
        let output_registration = self
            .context
            .register_listener(outstanding.iter().cloned(), on_output);

        match self.context.put(self.definition.input_key(), input.clone()) {
            Ok(_) => {
                for node in &self.nodes {
                    node.activate();
                }
            }
            Err(error) => {
                errors += 1;
                outstanding.clear();
                notify_collector(&self.run_id, "handle_error", || {
                    collector.handle_error(WorkflowError::Execution(error))
                });
            }
        }

        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        while !outstanding.is_empty() {
            tokio::select! {
                event = self.receiver.recv() => match event {
                    Some(event) => {
                        let (result, error) = self.apply(event, &mut outstanding, &input);
                        if let Some(result) = result {
                            delivered += 1;
                            notify_collector(&self.run_id, "handle_result", || {
                                collector.handle_result(result)
                            });
                        }
                        if let Some(error) = error {
                            errors += 1;
                            notify_collector(&self.run_id, "handle_error", || {
                                collector.handle_error(error)
                            });
                        }
                    }
                    // the executor holds a sender itself
                    None => break,
                },
                _ = &mut deadline => {
                    RunTimedOut {
                        run_id: &self.run_id,
                        timeout: self.timeout,
                        missing: outstanding.len(),
                    }
                    .log();
                    errors += 1;
                    let error = ExecutionError::RunTimedOut {
                        run_id: self.run_id.clone(),
                        timeout: self.timeout,
                        missing: outstanding.len(),
                    };
                    notify_collector(&self.run_id, "handle_error", || {
                        collector.handle_error(WorkflowError::Execution(error))
                    });
                    break;
                }
            }
        }

        output_registration.cancel();
        self.teardown();

        // failures that landed after the last output was settled
        while let Ok(event) = self.receiver.try_recv() {
            if let RunEvent::NodeFailed { error, .. } = event {
                errors += 1;
                notify_collector(&self.run_id, "handle_error", || {
                    collector.handle_error(WorkflowError::Execution(error))
                });
            }
        }

        RunCompleted {
            run_id: &self.run_id,
            workflow_id: self.definition.id(),
            delivered,
            errors,
            duration: started.elapsed(),
        }
        .log();
        notify_collector(&self.run_id, "finished", || collector.finished());
    }

    /// Withdraws nodes still waiting for inputs and closes the context. Idempotent.
    fn teardown(&self) {
        for node in &self.nodes {
            node.cancel();
        }
        self.context.close();
    }

    fn apply(
        &self,
        event: RunEvent,
        outstanding: &mut HashSet<DataValueKey>,
        input: &DataValue,
    ) -> (Option<WorkflowResult>, Option<WorkflowError>) {
        match event {
            RunEvent::Output { key, value } => {
                if !outstanding.remove(&key) {
                    return (None, None);
                }
                let result = WorkflowResult {
                    run_id: self.run_id.clone(),
                    key,
                    value,
                    source: input.clone(),
                };
                (Some(result), None)
            }
            RunEvent::NodeFailed { node_id, error } => {
                let unreachable = match error {
                    // the node's inputs can no longer be trusted
                    ExecutionError::DuplicateInputSupplied { .. } => outstanding.clone(),
                    _ => self.definition.outputs_downstream_of(&node_id),
                };
                let before = outstanding.len();
                outstanding.retain(|key| !unreachable.contains(key));
                let abandoned = before - outstanding.len();
                if abandoned > 0 {
                    OutputsAbandoned {
                        run_id: &self.run_id,
                        failed_node: &node_id,
                        abandoned,
                    }
                    .log();
                }
                (None, Some(WorkflowError::Execution(error)))
            }
        }
    }
}

// a run dropped mid-flight by a forced shutdown never reaches the end of `process`
impl Drop for WorkflowExecutor {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Invokes one collector callback, containing any panic it raises.
pub(crate) fn notify_collector<F: FnOnce()>(run_id: &str, callback: &'static str, f: F) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        CollectorPanicked { run_id, callback }.log();
    }
}
