// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in, in-process transformers.
//!
//! Each module exposes its transformer type and a `registration()` describing its pins and
//! output type. [`builtin_registrations`] collects them for
//! [`crate::config::StaticTransformerRegistry::with_builtins`].

pub mod change_text_case;
pub mod concatenate;
pub mod identity;
pub mod params;
pub mod prefix_suffix_adder;
pub mod reverse_text;
pub mod token_counter;

#[cfg(test)]
pub mod stub;

pub use change_text_case::{ChangeTextCaseTransformer, TextCase};
pub use concatenate::ConcatenateTransformer;
pub use identity::IdentityTransformer;
pub use prefix_suffix_adder::PrefixSuffixAdderTransformer;
pub use reverse_text::ReverseTextTransformer;
pub use token_counter::TokenCounterTransformer;

use crate::traits::TransformerRegistration;

pub fn builtin_registrations() -> Vec<TransformerRegistration> {
    vec![
        identity::registration(),
        change_text_case::registration(),
        reverse_text::registration(),
        prefix_suffix_adder::registration(),
        concatenate::registration(),
        token_counter::registration(),
    ]
}
