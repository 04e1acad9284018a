// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for execution context events.
//!
//! This module contains message types for logging events related to:
//! * Duplicate writes for an already-resolved key
//! * Values rejected because they do not match their key's type
//! * Writes arriving after the context was closed

use crate::model::{DataValueKey, ValueType};
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A second value was supplied for a key that already holds one.
///
/// # Log Level
/// `warn!` - Tolerated, but indicates a wiring or transformer defect
pub struct DuplicatePutIgnored<'a> {
    pub key: &'a DataValueKey,
}

impl Display for DuplicatePutIgnored<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Value for key '{}' already present; duplicate write ignored",
            self.key
        )
    }
}

impl StructuredLog for DuplicatePutIgnored<'_> {
    fn log(&self) {
        tracing::warn!(
            source_id = self.key.source_id(),
            value_type = %self.key.value_type(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "duplicate_put",
            span_name = name,
            key = %self.key,
        )
    }
}

/// A value did not match the type declared by its key and was not stored.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use datatrax::model::{DataValueKey, ValueType};
/// use datatrax::observability::messages::context::InvalidValueTypeRejected;
///
/// let key = DataValueKey::new("count", ValueType::Integer);
/// let msg = InvalidValueTypeRejected {
///     key: &key,
///     provided: &ValueType::Text,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct InvalidValueTypeRejected<'a> {
    pub key: &'a DataValueKey,
    pub provided: &'a ValueType,
}

impl Display for InvalidValueTypeRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Rejected value of type {} for key '{}'",
            self.provided, self.key
        )
    }
}

impl StructuredLog for InvalidValueTypeRejected<'_> {
    fn log(&self) {
        tracing::error!(
            source_id = self.key.source_id(),
            expected = %self.key.value_type(),
            provided = %self.provided,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "invalid_value_type",
            span_name = name,
            key = %self.key,
            provided = %self.provided,
        )
    }
}

/// A write reached a context that had already been closed.
///
/// # Log Level
/// `debug!` - Expected after a run times out
pub struct PutAfterClose<'a> {
    pub key: &'a DataValueKey,
}

impl Display for PutAfterClose<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Context closed; value for key '{}' discarded", self.key)
    }
}

impl StructuredLog for PutAfterClose<'_> {
    fn log(&self) {
        tracing::debug!(source_id = self.key.source_id(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("put_after_close", span_name = name, key = %self.key)
    }
}
