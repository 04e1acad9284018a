// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! One workflow node within one run.
//!
//! A [`NodeController`] waits until every wired input key has a value in the run's
//! [`ExecutionContext`], submits its transformer to the node pool exactly once, and
//! publishes the result under its own output key. Failures never publish; they are
//! reported to the run's executor through the event channel instead.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Instant;

use futures::FutureExt;
use tokio::sync::mpsc::UnboundedSender;
use tracing::Instrument;

use crate::engine::context::{ExecutionContext, Listener, ListenerRegistration};
use crate::engine::executor::RunEvent;
use crate::errors::{ConfigurationError, ExecutionError};
use crate::model::{DataValue, DataValueKey, TransformerConfiguration};
use crate::observability::messages::{node::*, StructuredLog};
use crate::traits::{
    Observers, ProcessingEvent, ProcessingEventKind, TaskExecutionService, Transformer,
    TransformerInputs,
};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Waiting for inputs.
    Pending = 0,
    /// Handed to the node pool; may be queued or running.
    Submitted = 1,
    Completed = 2,
    /// Withdrawn before submission.
    Canceled = 3,
    Failed = 4,
}

impl NodeState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => NodeState::Pending,
            1 => NodeState::Submitted,
            2 => NodeState::Completed,
            3 => NodeState::Canceled,
            _ => NodeState::Failed,
        }
    }
}

#[derive(Default)]
struct Received {
    keys: HashSet<DataValueKey>,
    values: HashMap<String, DataValue>,
}

pub struct NodeController {
    run_id: String,
    node_id: String,
    transformer: Arc<dyn Transformer>,
    /// Input key to the pin labels it feeds. One key may feed several pins.
    inputs: HashMap<DataValueKey, Vec<String>>,
    output_key: DataValueKey,
    received: Mutex<Received>,
    state: AtomicU8,
    registration: Mutex<Option<ListenerRegistration>>,
    context: Weak<ExecutionContext>,
    executor: Arc<dyn TaskExecutionService>,
    events: UnboundedSender<RunEvent>,
    observers: Observers,
}

impl NodeController {
    /// Fails when a required pin is unwired. Unwired optional pins are left out of the
    /// inputs the node waits for.
    pub(crate) fn new(
        run_id: impl Into<String>,
        configuration: &TransformerConfiguration,
        transformer: Arc<dyn Transformer>,
        context: &Arc<ExecutionContext>,
        executor: Arc<dyn TaskExecutionService>,
        events: UnboundedSender<RunEvent>,
        observers: Observers,
    ) -> Result<Arc<Self>, ConfigurationError> {
        let node_id = configuration.node_id().to_string();
        let mut inputs: HashMap<DataValueKey, Vec<String>> = HashMap::new();

        for pin in configuration.declared_inputs() {
            match configuration.data_source(&pin.label) {
                Some(key) => inputs
                    .entry(key.clone())
                    .or_default()
                    .push(pin.label.clone()),
                None if pin.required => {
                    return Err(ConfigurationError::UnresolvedRequiredInput {
                        node_id,
                        label: pin.label.clone(),
                    })
                }
                None => {}
            }
        }

        Ok(Arc::new(Self {
            run_id: run_id.into(),
            node_id,
            transformer,
            inputs,
            output_key: configuration.output_key(),
            received: Mutex::new(Received::default()),
            state: AtomicU8::new(NodeState::Pending as u8),
            registration: Mutex::new(None),
            context: Arc::downgrade(context),
            executor,
            events,
            observers,
        }))
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn output_key(&self) -> &DataValueKey {
        &self.output_key
    }

    pub fn state(&self) -> NodeState {
        NodeState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Distinct keys this node waits on.
    pub fn awaited_keys(&self) -> impl Iterator<Item = &DataValueKey> {
        self.inputs.keys()
    }

    fn lock_received(&self) -> MutexGuard<'_, Received> {
        self.received.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_registration(&self) -> MutexGuard<'_, Option<ListenerRegistration>> {
        self.registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, from: NodeState, to: NodeState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Records the value of one awaited key and submits once every awaited key has
    /// arrived. Keys this node does not consume are ignored. A second value for a key
    /// already recorded is an error in any state; a first value arriving after the node
    /// left `Pending` is dropped.
    pub fn data_available(
        self: &Arc<Self>,
        key: &DataValueKey,
        value: &DataValue,
    ) -> Result<(), ExecutionError> {
        let Some(labels) = self.inputs.get(key) else {
            return Ok(());
        };

        let ready = {
            let mut received = self.lock_received();
            if received.keys.contains(key) {
                return Err(ExecutionError::DuplicateInputSupplied {
                    node_id: self.node_id.clone(),
                    key: key.clone(),
                });
            }
            if self.state() != NodeState::Pending {
                return Ok(());
            }
            received.keys.insert(key.clone());
            for label in labels {
                received.values.insert(label.clone(), value.clone());
            }
            received.keys.len() == self.inputs.len()
        };

        if ready {
            self.submit();
        }
        Ok(())
    }

    /// Listener that feeds context notifications into [`data_available`](Self::data_available).
    pub(crate) fn listener(self: &Arc<Self>) -> Listener {
        let node = Arc::downgrade(self);
        Arc::new(move |key, value| {
            if let Some(node) = node.upgrade() {
                if let Err(error) = node.data_available(key, value) {
                    node.report(error);
                }
            }
        })
    }

    /// Keeps `registration` so it can be released on submission or cancellation. If the
    /// node already left `Pending` (its inputs were all present at registration time) the
    /// registration is released immediately.
    pub(crate) fn attach_registration(&self, registration: ListenerRegistration) {
        let mut slot = self.lock_registration();
        if self.state() != NodeState::Pending {
            registration.cancel();
            return;
        }
        *slot = Some(registration);
    }

    fn release_registration(&self) {
        let registration = self.lock_registration().take();
        if let Some(registration) = registration {
            registration.cancel();
        }
    }

    /// Submits nodes that have no wired inputs.
    pub(crate) fn activate(self: &Arc<Self>) {
        if self.inputs.is_empty() {
            self.submit();
        }
    }

    /// Withdraws a node that has not been submitted. Returns whether it was still pending.
    pub fn cancel(&self) -> bool {
        if !self.transition(NodeState::Pending, NodeState::Canceled) {
            return false;
        }
        self.release_registration();
        NodeCanceled {
            run_id: &self.run_id,
            node_id: &self.node_id,
        }
        .log();
        self.emit(ProcessingEventKind::Canceled);
        true
    }

    fn submit(self: &Arc<Self>) {
        if !self.transition(NodeState::Pending, NodeState::Submitted) {
            return;
        }
        self.release_registration();

        let submitted = NodeSubmitted {
            run_id: &self.run_id,
            node_id: &self.node_id,
        };
        submitted.log();
        let span = submitted.span("execute");
        self.emit(ProcessingEventKind::Submitted);

        let inputs: TransformerInputs = self
            .lock_received()
            .values
            .iter()
            .map(|(label, value)| (label.clone(), value.clone()))
            .collect();

        let node = self.clone();
        let task = async move { node.run(inputs).await }
            .instrument(span)
            .boxed();

        if let Err(error) = self.executor.execute(task) {
            self.fail(error);
        }
    }

    async fn run(self: Arc<Self>, inputs: TransformerInputs) {
        let started = Instant::now();
        let outcome = AssertUnwindSafe(self.transformer.process(&inputs))
            .catch_unwind()
            .await;

        let published = match outcome {
            Ok(Ok(value)) => self.publish(value),
            Ok(Err(error)) => Err(ExecutionError::TransformerExecutionFailed {
                node_id: self.node_id.clone(),
                reason: error.to_string(),
            }),
            Err(panic) => Err(ExecutionError::TransformerExecutionFailed {
                node_id: self.node_id.clone(),
                reason: format!("transformer panicked: {}", panic_message(&*panic)),
            }),
        };

        match published {
            Ok(()) => {
                self.state
                    .store(NodeState::Completed as u8, Ordering::SeqCst);
                let duration = started.elapsed();
                NodeCompleted {
                    run_id: &self.run_id,
                    node_id: &self.node_id,
                    duration,
                }
                .log();
                self.emit(ProcessingEventKind::Completed { duration });
            }
            Err(error) => self.fail(error),
        }
    }

    fn publish(&self, value: DataValue) -> Result<(), ExecutionError> {
        // the run has already been torn down
        let Some(context) = self.context.upgrade() else {
            return Ok(());
        };
        context.put(self.output_key.clone(), value).map(|_| ())
    }

    fn fail(&self, error: ExecutionError) {
        self.state.store(NodeState::Failed as u8, Ordering::SeqCst);
        self.emit(ProcessingEventKind::Failed {
            reason: error.to_string(),
        });
        self.report(error);
    }

    fn emit(&self, kind: ProcessingEventKind) {
        if self.observers.is_empty() {
            return;
        }
        let event = ProcessingEvent {
            run_id: self.run_id.clone(),
            node_id: self.node_id.clone(),
            kind,
        };
        for observer in self.observers.iter() {
            if catch_unwind(AssertUnwindSafe(|| observer.on_event(&event))).is_err() {
                ObserverPanicked {
                    run_id: &self.run_id,
                    node_id: &self.node_id,
                }
                .log();
            }
        }
    }

    fn report(&self, error: ExecutionError) {
        NodeFailed {
            run_id: &self.run_id,
            node_id: &self.node_id,
            error: &error,
        }
        .log();
        // a closed channel means the run has already finished
        let _ = self.events.send(RunEvent::NodeFailed {
            node_id: self.node_id.clone(),
            error,
        });
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::pool::TaskPool;
    use crate::model::{DataInputPin, ValueType};
    use crate::transformers::stub::{
        CountingTransformer, FailingTransformer, PanickingObserver, PanickingTransformer,
        RecordingObserver,
    };
    use crate::traits::WorkflowObserver;
    use crate::transformers::ConcatenateTransformer;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    struct Harness {
        context: Arc<ExecutionContext>,
        pool: Arc<TaskPool>,
        events: UnboundedSender<RunEvent>,
        receiver: UnboundedReceiver<RunEvent>,
        observer: Arc<RecordingObserver>,
    }

    impl Harness {
        fn new() -> Self {
            let (events, receiver) = unbounded_channel();
            Self {
                context: ExecutionContext::new(),
                pool: Arc::new(TaskPool::new("nodes", 4).unwrap()),
                events,
                receiver,
                observer: RecordingObserver::new(),
            }
        }

        fn node(
            &self,
            configuration: &TransformerConfiguration,
            transformer: Arc<dyn Transformer>,
        ) -> Result<Arc<NodeController>, ConfigurationError> {
            NodeController::new(
                "run-1",
                configuration,
                transformer,
                &self.context,
                self.pool.clone(),
                self.events.clone(),
                Arc::from(vec![
                    Arc::new(PanickingObserver) as Arc<dyn WorkflowObserver>,
                    self.observer.clone() as Arc<dyn WorkflowObserver>,
                ]),
            )
        }

        fn wire(&self, node: &Arc<NodeController>) {
            let keys: Vec<DataValueKey> = node.awaited_keys().cloned().collect();
            let registration = self.context.register_listener(keys, node.listener());
            node.attach_registration(registration);
        }
    }

    fn text_key(source: &str) -> DataValueKey {
        DataValueKey::new(source, ValueType::Text)
    }

    fn concatenate_configuration(left: Option<&str>, right: Option<&str>) -> TransformerConfiguration {
        let mut configuration = TransformerConfiguration::new(
            "join",
            "concatenate",
            vec![
                DataInputPin::required("left", ValueType::Text),
                DataInputPin::optional("right", ValueType::Text),
            ],
            ValueType::Text,
        );
        if let Some(source) = left {
            configuration.set_data_source("left", text_key(source));
        }
        if let Some(source) = right {
            configuration.set_data_source("right", text_key(source));
        }
        configuration
    }

    fn counting_configuration(source: &str) -> TransformerConfiguration {
        let mut configuration = TransformerConfiguration::new(
            "count",
            "counting",
            vec![DataInputPin::required("text", ValueType::Text)],
            ValueType::Text,
        );
        configuration.set_data_source("text", text_key(source));
        configuration
    }

    #[tokio::test]
    async fn test_submits_once_all_inputs_arrive() {
        let harness = Harness::new();
        let node = harness
            .node(
                &concatenate_configuration(Some("a"), Some("b")),
                Arc::new(ConcatenateTransformer::new("+")),
            )
            .unwrap();
        harness.wire(&node);

        harness.context.put(text_key("a"), DataValue::from("x")).unwrap();
        assert_eq!(node.state(), NodeState::Pending);
        harness.context.put(text_key("b"), DataValue::from("y")).unwrap();
        assert_ne!(node.state(), NodeState::Pending);

        assert!(harness.pool.wait_idle(Duration::from_secs(1)).await);
        assert_eq!(node.state(), NodeState::Completed);
        assert_eq!(
            harness.context.get(&text_key("join")),
            Some(DataValue::from("x+y"))
        );
        assert_eq!(harness.context.pending_listeners(), 0);
    }

    #[tokio::test]
    async fn test_inputs_present_before_wiring() {
        let harness = Harness::new();
        harness.context.put(text_key("a"), DataValue::from("early")).unwrap();

        let node = harness
            .node(
                &concatenate_configuration(Some("a"), None),
                Arc::new(ConcatenateTransformer::new("")),
            )
            .unwrap();
        harness.wire(&node);

        assert!(harness.pool.wait_idle(Duration::from_secs(1)).await);
        assert_eq!(
            harness.context.get(&text_key("join")),
            Some(DataValue::from("early"))
        );
        assert_eq!(harness.context.pending_listeners(), 0);
    }

    #[tokio::test]
    async fn test_one_key_feeding_two_pins() {
        let harness = Harness::new();
        let node = harness
            .node(
                &concatenate_configuration(Some("a"), Some("a")),
                Arc::new(ConcatenateTransformer::new(" ")),
            )
            .unwrap();
        assert_eq!(node.awaited_keys().count(), 1);
        harness.wire(&node);

        harness.context.put(text_key("a"), DataValue::from("echo")).unwrap();
        assert!(harness.pool.wait_idle(Duration::from_secs(1)).await);
        assert_eq!(
            harness.context.get(&text_key("join")),
            Some(DataValue::from("echo echo"))
        );
    }

    #[tokio::test]
    async fn test_unwired_required_pin_is_rejected() {
        let harness = Harness::new();
        match harness.node(
            &concatenate_configuration(None, Some("b")),
            Arc::new(ConcatenateTransformer::new("")),
        ) {
            Err(ConfigurationError::UnresolvedRequiredInput { node_id, label }) => {
                assert_eq!(node_id, "join");
                assert_eq!(label, "left");
            }
            Err(other) => panic!("Expected UnresolvedRequiredInput, got {:?}", other),
            Ok(_) => panic!("Expected UnresolvedRequiredInput"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_and_unrelated_keys() {
        let harness = Harness::new();
        let node = harness
            .node(
                &concatenate_configuration(Some("a"), Some("b")),
                Arc::new(ConcatenateTransformer::new("")),
            )
            .unwrap();

        assert!(node
            .data_available(&text_key("unrelated"), &DataValue::from("?"))
            .is_ok());
        node.data_available(&text_key("a"), &DataValue::from("1")).unwrap();
        match node.data_available(&text_key("a"), &DataValue::from("2")) {
            Err(ExecutionError::DuplicateInputSupplied { node_id, key }) => {
                assert_eq!(node_id, "join");
                assert_eq!(key, text_key("a"));
            }
            other => panic!("Expected DuplicateInputSupplied, got {:?}", other),
        }
        assert_eq!(node.state(), NodeState::Pending);
    }

    #[tokio::test]
    async fn test_executes_at_most_once() {
        let harness = Harness::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let node = harness
            .node(
                &counting_configuration("a"),
                Arc::new(CountingTransformer {
                    calls: calls.clone(),
                }),
            )
            .unwrap();

        node.data_available(&text_key("a"), &DataValue::from("v")).unwrap();
        assert!(matches!(
            node.data_available(&text_key("a"), &DataValue::from("v")),
            Err(ExecutionError::DuplicateInputSupplied { .. })
        ));
        node.activate();
        assert!(!node.cancel());

        assert!(harness.pool.wait_idle(Duration::from_secs(1)).await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_duplicate_after_submission_is_rejected() {
        let harness = Harness::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let node = harness
            .node(
                &counting_configuration("a"),
                Arc::new(CountingTransformer {
                    calls: calls.clone(),
                }),
            )
            .unwrap();

        node.data_available(&text_key("a"), &DataValue::from("v")).unwrap();
        assert_ne!(node.state(), NodeState::Pending);
        match node.data_available(&text_key("a"), &DataValue::from("w")) {
            Err(ExecutionError::DuplicateInputSupplied { node_id, key }) => {
                assert_eq!(node_id, "count");
                assert_eq!(key, text_key("a"));
            }
            other => panic!("Expected DuplicateInputSupplied, got {:?}", other),
        }

        assert!(harness.pool.wait_idle(Duration::from_secs(1)).await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(node.state(), NodeState::Completed);
    }

    #[tokio::test]
    async fn test_canceled_node_never_runs() {
        let harness = Harness::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let node = harness
            .node(
                &counting_configuration("a"),
                Arc::new(CountingTransformer {
                    calls: calls.clone(),
                }),
            )
            .unwrap();
        harness.wire(&node);

        assert!(node.cancel());
        assert_eq!(node.state(), NodeState::Canceled);
        assert_eq!(harness.context.pending_listeners(), 0);

        harness.context.put(text_key("a"), DataValue::from("v")).unwrap();
        node.data_available(&text_key("a"), &DataValue::from("v")).unwrap();
        assert!(harness.pool.wait_idle(Duration::from_secs(1)).await);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_is_reported_not_published() {
        let cases: Vec<(&str, Arc<dyn Transformer>, &str)> = vec![
            (
                "error",
                Arc::new(FailingTransformer) as Arc<dyn Transformer>,
                "intentional failure",
            ),
            (
                "panic",
                Arc::new(PanickingTransformer) as Arc<dyn Transformer>,
                "transformer exploded",
            ),
        ];

        for (name, transformer, expected) in cases {
            let mut harness = Harness::new();
            let node = harness.node(&counting_configuration("a"), transformer).unwrap();
            node.data_available(&text_key("a"), &DataValue::from("v")).unwrap();

            match harness.receiver.recv().await {
                Some(RunEvent::NodeFailed { node_id, error }) => {
                    assert_eq!(node_id, "count", "case '{}'", name);
                    assert!(
                        error.to_string().contains(expected),
                        "case '{}': '{}' does not contain '{}'",
                        name,
                        error,
                        expected
                    );
                }
                _ => panic!("case '{}': expected NodeFailed event", name),
            }
            assert_eq!(node.state(), NodeState::Failed, "case '{}'", name);
            assert_eq!(harness.context.get(&text_key("count")), None);
        }
    }

    #[tokio::test]
    async fn test_rejected_submission_fails_node() {
        let mut harness = Harness::new();
        let node = harness
            .node(
                &counting_configuration("a"),
                Arc::new(CountingTransformer {
                    calls: Arc::new(AtomicUsize::new(0)),
                }),
            )
            .unwrap();
        assert!(harness.pool.shutdown(Duration::from_millis(10)).await);

        node.data_available(&text_key("a"), &DataValue::from("v")).unwrap();
        assert_eq!(node.state(), NodeState::Failed);
        assert!(matches!(
            harness.receiver.recv().await,
            Some(RunEvent::NodeFailed {
                error: ExecutionError::TaskRejected { .. },
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_observers_see_node_lifecycle() {
        let harness = Harness::new();
        let node = harness
            .node(
                &concatenate_configuration(Some("a"), None),
                Arc::new(ConcatenateTransformer::new("")),
            )
            .unwrap();
        harness.wire(&node);
        harness.context.put(text_key("a"), DataValue::from("x")).unwrap();
        assert!(harness.pool.wait_idle(Duration::from_secs(1)).await);

        let events = harness.observer.events.lock().unwrap().clone();
        assert_eq!(events.len(), 2);
        assert!(events
            .iter()
            .all(|event| event.run_id == "run-1" && event.node_id == "join"));
        assert_eq!(events[0].kind, ProcessingEventKind::Submitted);
        assert!(matches!(events[1].kind, ProcessingEventKind::Completed { .. }));

        let mut harness = Harness::new();
        let failing = harness
            .node(&counting_configuration("a"), Arc::new(FailingTransformer))
            .unwrap();
        let waiting = harness
            .node(
                &concatenate_configuration(Some("a"), Some("b")),
                Arc::new(ConcatenateTransformer::new("")),
            )
            .unwrap();
        failing.data_available(&text_key("a"), &DataValue::from("v")).unwrap();
        assert!(harness.receiver.recv().await.is_some());
        assert!(waiting.cancel());

        let kinds = harness.observer.kinds();
        assert_eq!(kinds.len(), 3);
        assert_eq!(kinds[0], ProcessingEventKind::Submitted);
        match &kinds[1] {
            ProcessingEventKind::Failed { reason } => assert!(reason.contains("intentional failure")),
            other => panic!("Expected Failed, got {:?}", other),
        }
        assert_eq!(kinds[2], ProcessingEventKind::Canceled);
    }

    #[test]
    fn test_panic_message() {
        let text: Box<dyn Any + Send> = Box::new("static");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let other: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(text.as_ref()), "static");
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
