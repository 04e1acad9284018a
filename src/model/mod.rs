// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod definition;
mod key;
mod pin;
mod value;

pub use definition::{Parameters, TransformerConfiguration, WorkflowDefinition};
pub use key::DataValueKey;
pub use pin::DataInputPin;
pub use value::{DataValue, ValueType};
