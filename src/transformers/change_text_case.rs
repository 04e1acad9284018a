// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::TransformerError;
use crate::model::{DataInputPin, DataValue, Parameters, ValueType};
use crate::traits::{Transformer, TransformerInputs, TransformerRegistration};
use crate::transformers::params;

pub const REGISTRATION_ID: &str = "change_text_case";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextCase {
    Upper,
    Lower,
    /// First letter of each word capitalized, the rest lowercased.
    Title,
}

impl TextCase {
    fn as_str(&self) -> &'static str {
        match self {
            TextCase::Upper => "upper",
            TextCase::Lower => "lower",
            TextCase::Title => "title",
        }
    }

    pub fn apply(&self, input: &str) -> String {
        match self {
            TextCase::Upper => input.to_uppercase(),
            TextCase::Lower => input.to_lowercase(),
            TextCase::Title => input
                .split_whitespace()
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        None => String::new(),
                        Some(first) => {
                            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                        }
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl FromStr for TextCase {
    type Err = TransformerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upper" => Ok(TextCase::Upper),
            "lower" => Ok(TextCase::Lower),
            "title" => Ok(TextCase::Title),
            other => Err(TransformerError::InvalidParameter {
                name: "case".to_string(),
                reason: format!("unknown case '{}'; expected upper, lower or title", other),
            }),
        }
    }
}

/// Converts text to upper, lower or title case.
pub struct ChangeTextCaseTransformer {
    case: TextCase,
}

impl ChangeTextCaseTransformer {
    pub fn new(case: TextCase) -> Self {
        Self { case }
    }
}

#[async_trait]
impl Transformer for ChangeTextCaseTransformer {
    async fn process(&self, inputs: &TransformerInputs) -> Result<DataValue, TransformerError> {
        let text = inputs.text("text")?;
        Ok(DataValue::Text(self.case.apply(text)))
    }

    fn name(&self) -> &'static str {
        REGISTRATION_ID
    }

    fn configuration(&self) -> Parameters {
        Parameters::from([("case".to_string(), serde_yaml::Value::from(self.case.as_str()))])
    }
}

fn create(parameters: &Parameters) -> Result<Arc<dyn Transformer>, TransformerError> {
    params::reject_unknown(parameters, &["case"])?;
    let case = params::required_string(parameters, "case")?.parse()?;
    Ok(Arc::new(ChangeTextCaseTransformer::new(case)))
}

pub fn registration() -> TransformerRegistration {
    TransformerRegistration::new(
        REGISTRATION_ID,
        vec![DataInputPin::required("text", ValueType::Text)],
        ValueType::Text,
        Arc::new(create),
    )
    .with_title("Change Text Case")
    .with_description("Converts text to upper, lower or title case")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_change_text_case() {
        struct TestCase {
            name: &'static str,
            case: &'static str,
            input: &'static str,
            expected: &'static str,
        }

        let test_cases = vec![
            TestCase {
                name: "upper",
                case: "upper",
                input: "hello World",
                expected: "HELLO WORLD",
            },
            TestCase {
                name: "lower",
                case: "lower",
                input: "Hello WORLD",
                expected: "hello world",
            },
            TestCase {
                name: "title",
                case: "title",
                input: "the qUICK  fox",
                expected: "The Quick Fox",
            },
        ];

        for case in test_cases {
            let parameters =
                Parameters::from([("case".to_string(), serde_yaml::Value::from(case.case))]);
            let transformer = registration().instantiate(&parameters).unwrap();
            let inputs: TransformerInputs = [("text".to_string(), DataValue::from(case.input))]
                .into_iter()
                .collect();

            let output = transformer.process(&inputs).await.unwrap();
            assert_eq!(output, DataValue::from(case.expected), "case '{}'", case.name);
            assert_eq!(transformer.configuration(), parameters, "case '{}'", case.name);
        }
    }

    #[test]
    fn test_configuration_rejected() {
        let missing = Parameters::new();
        let unknown =
            Parameters::from([("case".to_string(), serde_yaml::Value::from("sideways"))]);

        for parameters in [missing, unknown] {
            match registration().instantiate(&parameters) {
                Err(TransformerError::InvalidParameter { name, .. }) => assert_eq!(name, "case"),
                Err(other) => panic!("Expected InvalidParameter, got {:?}", other),
                Ok(_) => panic!("Expected configuration to be rejected"),
            }
        }
    }
}
