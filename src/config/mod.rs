// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod builder;
mod loader;
mod registry;
mod validation;

pub mod consts;

pub use builder::WorkflowBuilder;
pub use loader::{load_and_build, load_config, parse_config, EngineOptions, NodeConfig, WorkflowConfig};
pub use registry::StaticTransformerRegistry;
pub use validation::validate_workflow;
