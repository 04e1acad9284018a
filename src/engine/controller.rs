// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Long-lived entry point for running a workflow.
//!
//! A [`WorkflowController`] instantiates each node's transformer once, then accepts any
//! number of concurrent runs. Runs execute on the run pool; the transformers of every run
//! share the node pool, which bounds how many transformer invocations are in flight at
//! once.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt::Display;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tracing::Instrument;
use uuid::Uuid;

use crate::config::EngineOptions;
use crate::engine::executor::{notify_collector, WorkflowExecutor};
use crate::engine::node::panic_message;
use crate::engine::pool::TaskPool;
use crate::errors::{ConfigurationError, ExecutionError, WorkflowError};
use crate::model::{DataValue, WorkflowDefinition};
use crate::observability::messages::{workflow::*, StructuredLog};
use crate::traits::{
    Observers, ResultsCollector, TaskExecutionService, Transformer, TransformerRegistry,
    WorkflowObserver,
};

pub struct WorkflowController {
    definition: Arc<WorkflowDefinition>,
    transformers: Arc<HashMap<String, Arc<dyn Transformer>>>,
    options: EngineOptions,
    run_pool: Arc<TaskPool>,
    node_pool: Arc<TaskPool>,
    observers: RwLock<Vec<Arc<dyn WorkflowObserver>>>,
    closed: AtomicBool,
}

impl WorkflowController {
    /// Configures every node's transformer from `registry` and starts the controller's
    /// pools on the current tokio runtime.
    ///
    /// Fails if a registration is missing, a transformer rejects its parameters, or a
    /// required pin is unwired.
    pub fn create(
        definition: Arc<WorkflowDefinition>,
        registry: &dyn TransformerRegistry,
        options: EngineOptions,
    ) -> Result<Self, WorkflowError> {
        let transformers = instantiate_transformers(&definition, registry)?;

        let node_concurrency = options.get_node_concurrency();
        let run_concurrency = options.get_run_concurrency();
        let run_pool = TaskPool::new(format!("{}-runs", definition.id()), run_concurrency)?;
        let node_pool = TaskPool::new(format!("{}-nodes", definition.id()), node_concurrency)?;

        ControllerCreated {
            workflow_id: definition.id(),
            transformer_count: transformers.len(),
            node_concurrency,
            run_concurrency,
        }
        .log();

        Ok(Self {
            definition,
            transformers: Arc::new(transformers),
            options,
            run_pool: Arc::new(run_pool),
            node_pool: Arc::new(node_pool),
            observers: RwLock::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn definition(&self) -> &Arc<WorkflowDefinition> {
        &self.definition
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Subscribes `observer` to per-node events of every run started from now on.
    pub fn add_observer(&self, observer: Arc<dyn WorkflowObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Runs accepted and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.run_pool.in_flight()
    }

    /// Starts a run and returns its id without waiting for it.
    ///
    /// `supplier` is called on the run's task to obtain the input datum. If it fails or
    /// panics the run reports [`ExecutionError::SourceUnavailable`] and finishes. A run
    /// still queued or running when [`close`](Self::close) gives up on it reports
    /// [`ExecutionError::RunCanceled`]. Every accepted run ends with exactly one
    /// `collector.finished()`.
    pub fn process<S, E>(
        &self,
        supplier: S,
        collector: Arc<dyn ResultsCollector>,
    ) -> Result<String, ExecutionError>
    where
        S: FnOnce() -> Result<DataValue, E> + Send + 'static,
        E: Display + Send + 'static,
    {
        if self.is_closed() {
            return Err(ExecutionError::ControllerClosed);
        }

        let run_id = Uuid::new_v4().to_string();
        let span = RunStarted {
            run_id: &run_id,
            workflow_id: self.definition.id(),
            node_count: self.definition.transformer_count(),
            output_count: self.definition.declared_outputs().len(),
        }
        .span("process");

        let id = run_id.clone();
        let definition = self.definition.clone();
        let transformers = self.transformers.clone();
        let node_pool: Arc<dyn TaskExecutionService> = self.node_pool.clone();
        let observers: Observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect();
        let timeout = self.options.get_run_timeout();

        let on_cancel = {
            let id = run_id.clone();
            let collector = collector.clone();
            move || {
                RunCanceled { run_id: &id }.log();
                let error = ExecutionError::RunCanceled { run_id: id.clone() };
                abort_run(&id, &*collector, WorkflowError::Execution(error));
            }
        };

        self.run_pool.spawn_cancellable(
            async move {
                let input = match catch_unwind(AssertUnwindSafe(supplier)) {
                    Ok(Ok(input)) => input,
                    Ok(Err(error)) => {
                        abort_run(&id, &*collector, source_unavailable(error.to_string()));
                        return;
                    }
                    Err(panic) => {
                        let reason = format!("supplier panicked: {}", panic_message(&*panic));
                        abort_run(&id, &*collector, source_unavailable(reason));
                        return;
                    }
                };

                match WorkflowExecutor::new(
                    id.clone(),
                    definition,
                    &transformers,
                    node_pool,
                    observers,
                    timeout,
                ) {
                    Ok(executor) => executor.process(input, collector).await,
                    Err(error) => abort_run(&id, &*collector, WorkflowError::Configuration(error)),
                }
            }
            .instrument(span),
            on_cancel,
        )?;

        Ok(run_id)
    }

    /// [`process`](Self::process) with an input that is already at hand.
    pub fn process_value(
        &self,
        input: DataValue,
        collector: Arc<dyn ResultsCollector>,
    ) -> Result<String, ExecutionError> {
        self.process(move || Ok::<_, Infallible>(input), collector)
    }

    /// Waits up to `timeout` for every accepted run to finish. The controller stays open.
    pub async fn join(&self, timeout: Duration) -> bool {
        self.run_pool.wait_idle(timeout).await
    }

    /// Stops accepting runs, lets in-flight work drain for the configured shutdown grace
    /// period, and aborts whatever remains. Aborted runs still report to their collector
    /// and finish. Returns whether everything drained in time.
    pub async fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return true;
        }

        let grace = self.options.get_shutdown_grace();
        let runs_drained = self.run_pool.shutdown(grace).await;
        let nodes_drained = self.node_pool.shutdown(grace).await;
        let graceful = runs_drained && nodes_drained;

        ControllerClosed {
            workflow_id: self.definition.id(),
            graceful,
        }
        .log();
        graceful
    }
}

fn source_unavailable(reason: String) -> WorkflowError {
    WorkflowError::Execution(ExecutionError::SourceUnavailable { reason })
}

/// Ends a run that never started executing or was canceled mid-flight.
fn abort_run(run_id: &str, collector: &dyn ResultsCollector, error: WorkflowError) {
    notify_collector(run_id, "handle_error", || collector.handle_error(error));
    notify_collector(run_id, "finished", || collector.finished());
}

/// Creates one transformer per node of `definition`.
pub(crate) fn instantiate_transformers(
    definition: &WorkflowDefinition,
    registry: &dyn TransformerRegistry,
) -> Result<HashMap<String, Arc<dyn Transformer>>, ConfigurationError> {
    let mut transformers = HashMap::with_capacity(definition.transformer_count());

    for configuration in definition.transformers() {
        let node_id = configuration.node_id();

        if let Some(pin) = configuration
            .declared_inputs()
            .iter()
            .find(|pin| pin.required && configuration.data_source(&pin.label).is_none())
        {
            return Err(ConfigurationError::UnresolvedRequiredInput {
                node_id: node_id.to_string(),
                label: pin.label.clone(),
            });
        }

        let registration = registry
            .lookup(configuration.registration_id())
            .map_err(|e| ConfigurationError::registration_missing(node_id, e))?;
        let transformer = registration
            .instantiate(configuration.parameters())
            .map_err(|e| ConfigurationError::rejected(node_id, e))?;

        transformers.insert(node_id.to_string(), transformer);
    }

    Ok(transformers)
}
