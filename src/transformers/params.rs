// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Helpers for reading transformer parameters.

use crate::errors::TransformerError;
use crate::model::Parameters;

/// Rejects any parameter not named in `allowed`.
pub fn reject_unknown(parameters: &Parameters, allowed: &[&str]) -> Result<(), TransformerError> {
    match parameters.keys().find(|name| !allowed.contains(&name.as_str())) {
        Some(name) => Err(TransformerError::InvalidParameter {
            name: name.clone(),
            reason: format!("unknown parameter; expected one of [{}]", allowed.join(", ")),
        }),
        None => Ok(()),
    }
}

/// Reads an optional string parameter. Present but non-string values are rejected.
pub fn optional_string(parameters: &Parameters, name: &str) -> Result<Option<String>, TransformerError> {
    match parameters.get(name) {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(serde_yaml::Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(TransformerError::InvalidParameter {
            name: name.to_string(),
            reason: format!("expected a string, found {:?}", other),
        }),
    }
}

pub fn required_string(parameters: &Parameters, name: &str) -> Result<String, TransformerError> {
    optional_string(parameters, name)?.ok_or_else(|| TransformerError::InvalidParameter {
        name: name.to_string(),
        reason: "parameter is required".to_string(),
    })
}
