// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod collector;
pub mod executor;
pub mod observer;
pub mod registry;
pub mod transformer;

pub use collector::{ResultsCollector, WorkflowResult};
pub use executor::TaskExecutionService;
pub use observer::{Observers, ProcessingEvent, ProcessingEventKind, WorkflowObserver};
pub use registry::{TransformerFactory, TransformerRegistration, TransformerRegistry};
pub use transformer::{Transformer, TransformerInputs};
