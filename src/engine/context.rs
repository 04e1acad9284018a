// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-run value store with publish/subscribe on key availability.
//!
//! Each key is written at most once. Publication and registration for a key happen under
//! the same lock: a `put` moves the key's pending listeners out while storing the value,
//! and a registration either finds the value already present or parks its listener. The
//! lock is released before any listener runs, so listeners may call back into the
//! context (a node publishing its own output, for instance) without deadlocking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::errors::ExecutionError;
use crate::model::{DataValue, DataValueKey};
use crate::observability::messages::{context::*, StructuredLog};

/// Callback fired once per registered key when that key's value becomes available.
pub type Listener = Arc<dyn Fn(&DataValueKey, &DataValue) + Send + Sync>;

/// What happened to a well-typed `put`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Stored,
    /// A value was already present; the new one was ignored.
    Duplicate,
    /// The context was closed; nothing was stored.
    Discarded,
}

#[derive(Default)]
struct ContextState {
    values: HashMap<DataValueKey, DataValue>,
    listeners: HashMap<DataValueKey, Vec<(u64, Listener)>>,
    closed: bool,
}

#[derive(Default)]
pub struct ExecutionContext {
    state: Mutex<ContextState>,
    next_listener_id: AtomicU64,
}

impl ExecutionContext {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, ContextState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `value` under `key` unless a value is already present, then notifies the
    /// key's pending listeners. Values that are not instances of the key's type are
    /// rejected and never stored.
    pub fn put(&self, key: DataValueKey, value: DataValue) -> Result<PutOutcome, ExecutionError> {
        if !key.value_type().admits(&value) {
            let provided = value.value_type();
            InvalidValueTypeRejected {
                key: &key,
                provided: &provided,
            }
            .log();
            return Err(ExecutionError::InvalidValueType { key, provided });
        }

        let listeners = {
            let mut state = self.lock();
            if state.closed {
                None
            } else if state.values.contains_key(&key) {
                Some(Err(()))
            } else {
                let listeners = state.listeners.remove(&key).unwrap_or_default();
                state.values.insert(key.clone(), value.clone());
                Some(Ok(listeners))
            }
        };

        match listeners {
            None => {
                PutAfterClose { key: &key }.log();
                Ok(PutOutcome::Discarded)
            }
            Some(Err(())) => {
                DuplicatePutIgnored { key: &key }.log();
                Ok(PutOutcome::Duplicate)
            }
            Some(Ok(listeners)) => {
                for (_, listener) in listeners {
                    listener(&key, &value);
                }
                Ok(PutOutcome::Stored)
            }
        }
    }

    pub fn get(&self, key: &DataValueKey) -> Option<DataValue> {
        self.lock().values.get(key).cloned()
    }

    pub fn contains(&self, key: &DataValueKey) -> bool {
        self.lock().values.contains_key(key)
    }

    /// Subscribes `listener` to every key in `keys`.
    ///
    /// Keys that already hold a value fire immediately, on the calling thread, before this
    /// returns. The rest fire later from whichever thread performs the `put`.
    pub fn register_listener(
        self: &Arc<Self>,
        keys: impl IntoIterator<Item = DataValueKey>,
        listener: Listener,
    ) -> ListenerRegistration {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        let mut pending = Vec::new();
        let mut ready = Vec::new();

        {
            let mut state = self.lock();
            if !state.closed {
                for key in keys {
                    if pending.contains(&key) || ready.iter().any(|(k, _)| k == &key) {
                        continue;
                    }
                    match state.values.get(&key) {
                        Some(value) => ready.push((key, value.clone())),
                        None => {
                            state
                                .listeners
                                .entry(key.clone())
                                .or_default()
                                .push((id, listener.clone()));
                            pending.push(key);
                        }
                    }
                }
            }
        }

        for (key, value) in &ready {
            listener(key, value);
        }

        ListenerRegistration {
            context: Arc::downgrade(self),
            id,
            keys: pending,
            canceled: AtomicBool::new(false),
        }
    }

    fn remove_listener(&self, id: u64, keys: &[DataValueKey]) {
        let mut state = self.lock();
        for key in keys {
            if let Some(listeners) = state.listeners.get_mut(key) {
                listeners.retain(|(listener_id, _)| *listener_id != id);
                if listeners.is_empty() {
                    state.listeners.remove(key);
                }
            }
        }
    }

    /// Number of listener entries still waiting on some key.
    pub fn pending_listeners(&self) -> usize {
        self.lock().listeners.values().map(Vec::len).sum()
    }

    /// Drops every pending listener and makes later writes no-ops. Stored values stay
    /// readable.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.listeners.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

/// Handle returned by [`ExecutionContext::register_listener`].
///
/// Dropping the handle leaves the subscription in place; call [`cancel`](Self::cancel) to
/// remove it from every key it is still waiting on.
pub struct ListenerRegistration {
    context: Weak<ExecutionContext>,
    id: u64,
    keys: Vec<DataValueKey>,
    canceled: AtomicBool,
}

impl ListenerRegistration {
    /// Removes the listener from keys that have not fired yet. Idempotent.
    pub fn cancel(&self) {
        if self.canceled.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(context) = self.context.upgrade() {
            context.remove_listener(self.id, &self.keys);
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}
