// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use futures::future::BoxFuture;

use crate::errors::ExecutionError;

/// Where node controllers send their work once all inputs have arrived.
pub trait TaskExecutionService: Send + Sync {
    /// Schedule `task` to run; fails when the service no longer accepts work.
    fn execute(&self, task: BoxFuture<'static, ()>) -> Result<(), ExecutionError>;
}
