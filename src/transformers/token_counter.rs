// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::TransformerError;
use crate::model::{DataInputPin, DataValue, Parameters, ValueType};
use crate::traits::{Transformer, TransformerInputs, TransformerRegistration};
use crate::transformers::params;

pub const REGISTRATION_ID: &str = "token_counter";

/// Counts whitespace-separated words.
pub struct TokenCounterTransformer;

#[async_trait]
impl Transformer for TokenCounterTransformer {
    async fn process(&self, inputs: &TransformerInputs) -> Result<DataValue, TransformerError> {
        let text = inputs.text("text")?;
        let count = text.split_whitespace().count();
        Ok(DataValue::Integer(count as i64))
    }

    fn name(&self) -> &'static str {
        REGISTRATION_ID
    }
}

fn create(parameters: &Parameters) -> Result<Arc<dyn Transformer>, TransformerError> {
    params::reject_unknown(parameters, &[])?;
    Ok(Arc::new(TokenCounterTransformer))
}

pub fn registration() -> TransformerRegistration {
    TransformerRegistration::new(
        REGISTRATION_ID,
        vec![DataInputPin::required("text", ValueType::Text)],
        ValueType::Integer,
        Arc::new(create),
    )
    .with_title("Token Counter")
    .with_description("Counts the words in its text input")
}
