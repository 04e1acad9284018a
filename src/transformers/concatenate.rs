// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::TransformerError;
use crate::model::{DataInputPin, DataValue, Parameters, ValueType};
use crate::traits::{Transformer, TransformerInputs, TransformerRegistration};
use crate::transformers::params;

pub const REGISTRATION_ID: &str = "concatenate";

/// Joins `left` and `right` with an optional separator.
///
/// `right` is an optional pin; when it is left unwired the output is `left` unchanged.
pub struct ConcatenateTransformer {
    separator: String,
}

impl ConcatenateTransformer {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

#[async_trait]
impl Transformer for ConcatenateTransformer {
    async fn process(&self, inputs: &TransformerInputs) -> Result<DataValue, TransformerError> {
        let left = inputs.text("left")?;
        let joined = match inputs.get("right") {
            Some(_) => format!("{}{}{}", left, self.separator, inputs.text("right")?),
            None => left.to_string(),
        };
        Ok(DataValue::Text(joined))
    }

    fn name(&self) -> &'static str {
        REGISTRATION_ID
    }

    fn configuration(&self) -> Parameters {
        Parameters::from([(
            "separator".to_string(),
            serde_yaml::Value::from(self.separator.as_str()),
        )])
    }
}

fn create(parameters: &Parameters) -> Result<Arc<dyn Transformer>, TransformerError> {
    params::reject_unknown(parameters, &["separator"])?;
    let separator = params::optional_string(parameters, "separator")?.unwrap_or_default();
    Ok(Arc::new(ConcatenateTransformer::new(separator)))
}

pub fn registration() -> TransformerRegistration {
    TransformerRegistration::new(
        REGISTRATION_ID,
        vec![
            DataInputPin::required("left", ValueType::Text),
            DataInputPin::optional("right", ValueType::Text),
        ],
        ValueType::Text,
        Arc::new(create),
    )
    .with_title("Concatenate")
    .with_description("Joins two text inputs with an optional separator")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_concatenate() {
        let transformer = ConcatenateTransformer::new(" | ");

        let both: TransformerInputs = [
            ("left".to_string(), DataValue::from("a")),
            ("right".to_string(), DataValue::from("b")),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            transformer.process(&both).await.unwrap(),
            DataValue::from("a | b")
        );

        let left_only: TransformerInputs = [("left".to_string(), DataValue::from("a"))]
            .into_iter()
            .collect();
        assert_eq!(
            transformer.process(&left_only).await.unwrap(),
            DataValue::from("a")
        );
    }

    #[test]
    fn test_right_pin_is_optional() {
        let registration = registration();
        let right = registration.declared_input("right").unwrap();
        assert!(!right.required);
        assert!(registration.declared_input("left").unwrap().required);
    }
}
