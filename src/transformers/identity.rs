// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::TransformerError;
use crate::model::{DataInputPin, DataValue, Parameters, ValueType};
use crate::traits::{Transformer, TransformerInputs, TransformerRegistration};
use crate::transformers::params;

pub const REGISTRATION_ID: &str = "identity";

/// Passes its text input through unchanged. Useful as an adapter from the workflow source.
pub struct IdentityTransformer;

#[async_trait]
impl Transformer for IdentityTransformer {
    async fn process(&self, inputs: &TransformerInputs) -> Result<DataValue, TransformerError> {
        inputs.require("value").cloned()
    }

    fn name(&self) -> &'static str {
        REGISTRATION_ID
    }
}

fn create(parameters: &Parameters) -> Result<Arc<dyn Transformer>, TransformerError> {
    params::reject_unknown(parameters, &[])?;
    Ok(Arc::new(IdentityTransformer))
}

pub fn registration() -> TransformerRegistration {
    TransformerRegistration::new(
        REGISTRATION_ID,
        vec![DataInputPin::required("value", ValueType::Text)],
        ValueType::Text,
        Arc::new(create),
    )
    .with_title("Identity")
    .with_description("Passes text through unchanged")
}
