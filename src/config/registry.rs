// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

use crate::errors::RegistryError;
use crate::traits::{TransformerRegistration, TransformerRegistry};
use crate::transformers::builtin_registrations;

/// In-memory registry keyed by registration id.
#[derive(Debug, Default, Clone)]
pub struct StaticTransformerRegistry {
    registrations: BTreeMap<String, TransformerRegistration>,
}

impl StaticTransformerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in transformer.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for registration in builtin_registrations() {
            registry.register(registration);
        }
        registry
    }

    /// Adds `registration`, returning the one it replaced, if any.
    pub fn register(
        &mut self,
        registration: TransformerRegistration,
    ) -> Option<TransformerRegistration> {
        self.registrations
            .insert(registration.id.clone(), registration)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl TransformerRegistry for StaticTransformerRegistry {
    fn registrations(&self) -> Vec<&TransformerRegistration> {
        self.registrations.values().collect()
    }

    fn lookup(&self, registration_id: &str) -> Result<&TransformerRegistration, RegistryError> {
        self.registrations
            .get(registration_id)
            .ok_or_else(|| RegistryError::NotFound {
                registration_id: registration_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ValueType;

    #[test]
    fn test_builtins_are_registered() {
        let registry = StaticTransformerRegistry::with_builtins();

        for id in [
            "identity",
            "change_text_case",
            "reverse_text",
            "prefix_suffix_adder",
            "concatenate",
            "token_counter",
        ] {
            assert!(registry.is_registered(id), "missing '{}'", id);
        }
        assert!(!registry.is_registered("word_frequency"));

        match registry.lookup("word_frequency") {
            Err(RegistryError::NotFound { registration_id }) => {
                assert_eq!(registration_id, "word_frequency")
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_list_compatible_and_producing() {
        let registry = StaticTransformerRegistry::with_builtins();

        let integer_producers: Vec<_> = registry
            .list_producing(&ValueType::Number)
            .into_iter()
            .map(|registration| registration.id.as_str())
            .collect();
        assert_eq!(integer_producers, vec!["token_counter"]);

        assert_eq!(
            registry.list_compatible(&ValueType::Text).len(),
            registry.len()
        );
        assert!(registry.list_compatible(&ValueType::Integer).is_empty());
    }
}
