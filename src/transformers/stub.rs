// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Test doubles: misbehaving transformers and recording collectors.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::config::StaticTransformerRegistry;
use crate::errors::{TransformerError, WorkflowError};
use crate::model::{DataInputPin, DataValue, Parameters, ValueType};
use crate::traits::{
    ProcessingEvent, ProcessingEventKind, ResultsCollector, Transformer, TransformerInputs,
    TransformerRegistration, WorkflowObserver, WorkflowResult,
};

/// A transformer that always fails.
pub struct FailingTransformer;

#[async_trait]
impl Transformer for FailingTransformer {
    async fn process(&self, _inputs: &TransformerInputs) -> Result<DataValue, TransformerError> {
        Err(TransformerError::Failed("intentional failure".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// A transformer that panics mid-execution.
pub struct PanickingTransformer;

#[async_trait]
impl Transformer for PanickingTransformer {
    async fn process(&self, _inputs: &TransformerInputs) -> Result<DataValue, TransformerError> {
        panic!("transformer exploded")
    }

    fn name(&self) -> &'static str {
        "panicking"
    }
}

/// Echoes its `text` input after a delay.
pub struct SlowTransformer {
    pub delay: Duration,
}

#[async_trait]
impl Transformer for SlowTransformer {
    async fn process(&self, inputs: &TransformerInputs) -> Result<DataValue, TransformerError> {
        tokio::time::sleep(self.delay).await;
        inputs.require("text").cloned()
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

/// Echoes its `text` input and counts invocations.
pub struct CountingTransformer {
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Transformer for CountingTransformer {
    async fn process(&self, inputs: &TransformerInputs) -> Result<DataValue, TransformerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        inputs.require("text").cloned()
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

/// Produces a fixed value; takes no inputs.
pub struct ConstantTransformer {
    pub value: DataValue,
}

#[async_trait]
impl Transformer for ConstantTransformer {
    async fn process(&self, _inputs: &TransformerInputs) -> Result<DataValue, TransformerError> {
        Ok(self.value.clone())
    }

    fn name(&self) -> &'static str {
        "constant"
    }
}

fn text_in_text_out(id: &str, transformer: Arc<dyn Transformer>) -> TransformerRegistration {
    TransformerRegistration::new(
        id,
        vec![DataInputPin::required("text", ValueType::Text)],
        ValueType::Text,
        Arc::new(
            move |_: &Parameters| -> Result<Arc<dyn Transformer>, TransformerError> {
                Ok(transformer.clone())
            },
        ),
    )
}

/// Built-ins plus `failing`, `panicking`, `slow` (100ms), `counting` and `constant`.
///
/// Returns the shared invocation counter used by every `counting` node.
pub fn test_registry() -> (StaticTransformerRegistry, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = StaticTransformerRegistry::with_builtins();

    registry.register(text_in_text_out("failing", Arc::new(FailingTransformer)));
    registry.register(text_in_text_out("panicking", Arc::new(PanickingTransformer)));
    registry.register(text_in_text_out(
        "slow",
        Arc::new(SlowTransformer {
            delay: Duration::from_millis(100),
        }),
    ));
    registry.register(text_in_text_out(
        "counting",
        Arc::new(CountingTransformer {
            calls: calls.clone(),
        }),
    ));
    registry.register(TransformerRegistration::new(
        "constant",
        vec![],
        ValueType::Text,
        Arc::new(|_: &Parameters| -> Result<Arc<dyn Transformer>, TransformerError> {
            Ok(Arc::new(ConstantTransformer {
                value: DataValue::from("constant"),
            }))
        }),
    ));
    registry.register(TransformerRegistration::new(
        "rejecting",
        vec![DataInputPin::required("text", ValueType::Text)],
        ValueType::Text,
        Arc::new(|_: &Parameters| -> Result<Arc<dyn Transformer>, TransformerError> {
            Err(TransformerError::InvalidParameter {
                name: "anything".to_string(),
                reason: "always rejected".to_string(),
            })
        }),
    ));

    (registry, calls)
}

/// Records every callback and lets tests wait for `finished`.
#[derive(Default)]
pub struct RecordingCollector {
    pub results: Mutex<Vec<WorkflowResult>>,
    pub errors: Mutex<Vec<WorkflowError>>,
    finished: AtomicUsize,
    notify: Notify,
}

impl RecordingCollector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn finished_count(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn result_values(&self) -> Vec<DataValue> {
        self.results
            .lock()
            .unwrap()
            .iter()
            .map(|result| result.value.clone())
            .collect()
    }

    pub fn error_count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }

    /// Waits until `finished` has been called at least `count` times.
    pub async fn wait_finished(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.finished_count() >= count {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.finished_count() >= count;
            }
        }
    }
}

impl ResultsCollector for RecordingCollector {
    fn handle_result(&self, result: WorkflowResult) {
        self.results.lock().unwrap().push(result);
    }

    fn handle_error(&self, error: WorkflowError) {
        self.errors.lock().unwrap().push(error);
    }

    fn finished(&self) {
        self.finished.fetch_add(1, Ordering::SeqCst);
        self.notify.notify_waiters();
    }
}

/// Panics from `handle_result`, then records like [`RecordingCollector`].
#[derive(Default)]
pub struct PanickingCollector {
    pub inner: RecordingCollector,
    pub result_calls: AtomicUsize,
}

impl ResultsCollector for PanickingCollector {
    fn handle_result(&self, _result: WorkflowResult) {
        self.result_calls.fetch_add(1, Ordering::SeqCst);
        panic!("collector exploded");
    }

    fn handle_error(&self, error: WorkflowError) {
        self.inner.handle_error(error);
    }

    fn finished(&self) {
        self.inner.finished();
    }
}

/// Records every processing event.
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<ProcessingEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn kinds(&self) -> Vec<ProcessingEventKind> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|event| event.kind.clone())
            .collect()
    }
}

impl WorkflowObserver for RecordingObserver {
    fn on_event(&self, event: &ProcessingEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub struct PanickingObserver;

impl WorkflowObserver for PanickingObserver {
    fn on_event(&self, _event: &ProcessingEvent) {
        panic!("observer exploded");
    }
}
