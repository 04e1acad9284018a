// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::TransformerError;
use crate::model::{DataValue, Parameters, ValueType};

/// A configured unit of work mapping named inputs to one output value.
///
/// Instances are created once per node when a controller is built and are then shared by
/// every concurrent run, so `process` must not rely on per-call mutable state.
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn process(&self, inputs: &TransformerInputs) -> Result<DataValue, TransformerError>;

    fn name(&self) -> &'static str;

    /// The parameters this instance was configured with.
    fn configuration(&self) -> Parameters {
        Parameters::new()
    }
}

/// Input values for one invocation, keyed by pin label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformerInputs {
    values: HashMap<String, DataValue>,
}

impl TransformerInputs {
    pub fn new(values: HashMap<String, DataValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, label: &str) -> Option<&DataValue> {
        self.values.get(label)
    }

    pub fn require(&self, label: &str) -> Result<&DataValue, TransformerError> {
        self.values
            .get(label)
            .ok_or_else(|| TransformerError::MissingInput {
                label: label.to_string(),
            })
    }

    pub fn text(&self, label: &str) -> Result<&str, TransformerError> {
        let value = self.require(label)?;
        value
            .as_text()
            .ok_or_else(|| TransformerError::UnexpectedInput {
                label: label.to_string(),
                expected: ValueType::Text,
                received: value.value_type(),
            })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl FromIterator<(String, DataValue)> for TransformerInputs {
    fn from_iter<I: IntoIterator<Item = (String, DataValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
