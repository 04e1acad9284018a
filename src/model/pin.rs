// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

use crate::model::ValueType;

/// A named, typed input slot declared by a transformer registration.
///
/// An optional pin (`required == false`) may be left unwired. Once wired, its value must
/// arrive before the transformer runs, exactly like a required pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataInputPin {
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl DataInputPin {
    pub fn required(label: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            label: label.into(),
            description: String::new(),
            value_type,
            required: true,
        }
    }

    pub fn optional(label: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            required: false,
            ..Self::required(label, value_type)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether values of `value_type` may be supplied to this pin.
    pub fn accepts(&self, value_type: &ValueType) -> bool {
        self.value_type.accepts(value_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_defaults_to_required() {
        let pin: DataInputPin = serde_yaml::from_str("label: text\ntype: text\n").unwrap();
        assert!(pin.required);
        assert!(pin.description.is_empty());
    }

    #[test]
    fn test_pin_is_covariant() {
        let pin = DataInputPin::optional("amount", ValueType::Number);
        assert!(!pin.required);
        assert!(pin.accepts(&ValueType::Integer));
        assert!(!pin.accepts(&ValueType::Text));
    }
}
