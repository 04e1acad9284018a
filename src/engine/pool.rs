// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounded task pools on the ambient tokio runtime.
//!
//! A [`TaskPool`] is the engine's worker pool: at most `concurrency` of its tasks run at
//! once (the rest wait on a semaphore permit), every task is tracked so the pool can be
//! drained, and a cancellation token aborts whatever is left when a graceful drain runs
//! out of time.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::runtime::Handle;
use tokio::sync::{Notify, Semaphore};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::errors::ExecutionError;
use crate::observability::messages::{workflow::PoolForcedShutdown, StructuredLog};
use crate::traits::TaskExecutionService;

pub struct TaskPool {
    name: String,
    concurrency: usize,
    handle: Handle,
    semaphore: Arc<Semaphore>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
    accepting: AtomicBool,
    active: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

/// Counts one task as in flight until dropped, whether it finished or was aborted.
struct InFlight {
    active: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

impl TaskPool {
    /// Creates a pool on the current tokio runtime.
    pub fn new(name: impl Into<String>, concurrency: usize) -> Result<Self, ExecutionError> {
        let handle = Handle::try_current().map_err(|e| ExecutionError::RuntimeUnavailable {
            reason: e.to_string(),
        })?;
        let concurrency = concurrency.max(1);

        Ok(Self {
            name: name.into(),
            concurrency,
            handle,
            semaphore: Arc::new(Semaphore::new(concurrency)),
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
            accepting: AtomicBool::new(true),
            active: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(Notify::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Tasks spawned and not yet finished, including those waiting for a permit.
    pub fn in_flight(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// Runs `task` once a permit is free. A forced shutdown drops it wherever it is.
    pub fn spawn<F>(&self, task: F) -> Result<(), ExecutionError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.spawn_cancellable(task, || {})
    }

    /// Like [`spawn`](Self::spawn), but `on_cancel` runs on the task's behalf if a forced
    /// shutdown drops `task` while it is queued or running. Exactly one of the two
    /// completes.
    pub fn spawn_cancellable<F, C>(&self, task: F, on_cancel: C) -> Result<(), ExecutionError>
    where
        F: Future<Output = ()> + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        if !self.is_accepting() {
            return Err(ExecutionError::TaskRejected {
                pool: self.name.clone(),
            });
        }

        self.active.fetch_add(1, Ordering::SeqCst);
        let in_flight = InFlight {
            active: self.active.clone(),
            idle: self.idle.clone(),
        };
        let semaphore = self.semaphore.clone();
        let shutdown = self.shutdown.clone();
        self.tracker.spawn_on(
            async move {
                let _in_flight = in_flight;
                tokio::select! {
                    _ = shutdown.cancelled() => on_cancel(),
                    _ = async {
                        // the semaphore is never closed
                        if let Ok(_permit) = semaphore.acquire_owned().await {
                            task.await;
                        }
                    } => {}
                }
            },
            &self.handle,
        );
        Ok(())
    }

    /// Stops accepting work and waits up to `grace` for in-flight tasks, then aborts the
    /// rest. Returns whether every task finished on its own.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.accepting.store(false, Ordering::SeqCst);
        self.tracker.close();

        if tokio::time::timeout(grace, self.tracker.wait()).await.is_ok() {
            return true;
        }

        PoolForcedShutdown {
            pool: &self.name,
            grace,
            remaining: self.in_flight(),
        }
        .log();
        self.shutdown.cancel();
        // aborted tasks unwind at their next poll; give their cancel handlers a chance to run
        let _ = tokio::time::timeout(grace, self.tracker.wait()).await;
        false
    }

    /// Waits up to `timeout` until no task is in flight. Leaves the pool open and may be
    /// called from several places at once.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let idle = self.idle.notified();
            tokio::pin!(idle);
            idle.as_mut().enable();

            if self.in_flight() == 0 {
                return true;
            }
            if tokio::time::timeout_at(deadline, idle).await.is_err() {
                return self.in_flight() == 0;
            }
        }
    }
}

impl TaskExecutionService for TaskPool {
    fn execute(&self, task: BoxFuture<'static, ()>) -> Result<(), ExecutionError> {
        self.spawn(task)
    }
}
