// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Reactive workflow execution.
//!
//! A [`WorkflowController`] accepts runs; each run gets a [`WorkflowExecutor`] with its own
//! [`ExecutionContext`] and one [`NodeController`] per node. Nodes fire as soon as their
//! inputs land in the context, so independent branches execute concurrently on the
//! controller's node [`TaskPool`].

pub mod context;
pub mod controller;
pub mod executor;
pub mod node;
pub mod pool;

pub use context::{ExecutionContext, Listener, ListenerRegistration, PutOutcome};
pub use controller::WorkflowController;
pub use executor::WorkflowExecutor;
pub use node::{NodeController, NodeState};
pub use pool::TaskPool;
