// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod execution;
mod registry;

pub use config::{ConfigurationError, WorkflowConfigurationError};
pub use execution::{ExecutionError, TransformerError, WorkflowError};
pub use registry::RegistryError;
