// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;         // workflow definitions, loading, validation
pub mod engine;         // controller, runs, nodes, pools
pub mod errors;         // error handling
pub mod model;          // keys, values, definitions
pub mod observability;
pub mod traits;         // transformer, registry, collector abstractions
pub mod transformers;   // built-in transformers
