// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! # Organization
//!
//! * `context` - execution context events
//! * `node` - node controller events
//! * `workflow` - run, controller and pool events
//! * `validation` - definition validation events

use tracing::Span;

pub mod context;
pub mod node;
pub mod validation;
pub mod workflow;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a `tracing` event.
    fn log(&self);

    /// Open a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
