// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every diagnostic event emitted by the engine is a small message struct defined under
//! [`messages`]. Each struct implements `Display` for the human-readable line and
//! [`messages::StructuredLog`] to emit itself with structured fields at its own level.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::context` - execution context writes and rejections
//! * `messages::node` - node controller lifecycle (submitted, completed, failed, canceled)
//! * `messages::workflow` - run and controller lifecycle, pools, collectors
//! * `messages::validation` - workflow definition validation
//!
//! # Usage
//!
//! ```rust
//! use datatrax::observability::messages::{node::NodeSubmitted, StructuredLog};
//!
//! NodeSubmitted {
//!     run_id: "2f1d",
//!     node_id: "suffix",
//! }
//! .log();
//! ```

pub mod messages;
