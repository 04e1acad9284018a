// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::TransformerError;
use crate::model::{DataInputPin, DataValue, Parameters, ValueType};
use crate::traits::{Transformer, TransformerInputs, TransformerRegistration};
use crate::transformers::params;

pub const REGISTRATION_ID: &str = "prefix_suffix_adder";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixSuffixConfig {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}

/// Adds a prefix and/or suffix to text.
pub struct PrefixSuffixAdderTransformer {
    config: PrefixSuffixConfig,
}

impl PrefixSuffixAdderTransformer {
    pub fn new(config: PrefixSuffixConfig) -> Self {
        Self { config }
    }

    pub fn with_suffix(suffix: impl Into<String>) -> Self {
        Self::new(PrefixSuffixConfig {
            prefix: None,
            suffix: Some(suffix.into()),
        })
    }
}

#[async_trait]
impl Transformer for PrefixSuffixAdderTransformer {
    async fn process(&self, inputs: &TransformerInputs) -> Result<DataValue, TransformerError> {
        let input = inputs.text("text")?;

        let mut result = String::new();
        if let Some(prefix) = &self.config.prefix {
            result.push_str(prefix);
        }
        result.push_str(input);
        if let Some(suffix) = &self.config.suffix {
            result.push_str(suffix);
        }

        Ok(DataValue::Text(result))
    }

    fn name(&self) -> &'static str {
        REGISTRATION_ID
    }

    fn configuration(&self) -> Parameters {
        let mut parameters = Parameters::new();
        if let Some(prefix) = &self.config.prefix {
            parameters.insert("prefix".into(), serde_yaml::Value::from(prefix.as_str()));
        }
        if let Some(suffix) = &self.config.suffix {
            parameters.insert("suffix".into(), serde_yaml::Value::from(suffix.as_str()));
        }
        parameters
    }
}

fn create(parameters: &Parameters) -> Result<Arc<dyn Transformer>, TransformerError> {
    params::reject_unknown(parameters, &["prefix", "suffix"])?;
    let config = PrefixSuffixConfig {
        prefix: params::optional_string(parameters, "prefix")?,
        suffix: params::optional_string(parameters, "suffix")?,
    };
    Ok(Arc::new(PrefixSuffixAdderTransformer::new(config)))
}

pub fn registration() -> TransformerRegistration {
    TransformerRegistration::new(
        REGISTRATION_ID,
        vec![DataInputPin::required("text", ValueType::Text)],
        ValueType::Text,
        Arc::new(create),
    )
    .with_title("Prefix/Suffix Adder")
    .with_description("Adds a configured prefix and/or suffix to text")
}
