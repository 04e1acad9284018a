// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::TransformerError;
use crate::model::{DataInputPin, DataValue, Parameters, ValueType};
use crate::traits::{Transformer, TransformerInputs, TransformerRegistration};
use crate::transformers::params;

pub const REGISTRATION_ID: &str = "reverse_text";

/// Reverses text by Unicode scalar value.
pub struct ReverseTextTransformer;

#[async_trait]
impl Transformer for ReverseTextTransformer {
    async fn process(&self, inputs: &TransformerInputs) -> Result<DataValue, TransformerError> {
        let text = inputs.text("text")?;
        Ok(DataValue::Text(text.chars().rev().collect()))
    }

    fn name(&self) -> &'static str {
        REGISTRATION_ID
    }
}

fn create(parameters: &Parameters) -> Result<Arc<dyn Transformer>, TransformerError> {
    params::reject_unknown(parameters, &[])?;
    Ok(Arc::new(ReverseTextTransformer))
}

pub fn registration() -> TransformerRegistration {
    TransformerRegistration::new(
        REGISTRATION_ID,
        vec![DataInputPin::required("text", ValueType::Text)],
        ValueType::Text,
        Arc::new(create),
    )
    .with_title("Reverse Text")
}
