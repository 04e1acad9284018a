// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::sync::Arc;

use crate::errors::{RegistryError, TransformerError};
use crate::model::{DataInputPin, Parameters, ValueType};
use crate::traits::Transformer;

/// Builds a configured transformer from node parameters.
pub type TransformerFactory =
    Arc<dyn Fn(&Parameters) -> Result<Arc<dyn Transformer>, TransformerError> + Send + Sync>;

/// Metadata describing one kind of transformer plus the factory that instantiates it.
#[derive(Clone)]
pub struct TransformerRegistration {
    pub id: String,
    pub title: String,
    pub description: String,
    pub inputs: Vec<DataInputPin>,
    pub output_type: ValueType,
    factory: TransformerFactory,
}

impl TransformerRegistration {
    pub fn new(
        id: impl Into<String>,
        inputs: Vec<DataInputPin>,
        output_type: ValueType,
        factory: TransformerFactory,
    ) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            description: String::new(),
            inputs,
            output_type,
            factory,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn declared_input(&self, label: &str) -> Option<&DataInputPin> {
        self.inputs.iter().find(|pin| pin.label == label)
    }

    /// Whether some input pin accepts values of `value_type`.
    pub fn can_accept(&self, value_type: &ValueType) -> bool {
        self.inputs.iter().any(|pin| pin.accepts(value_type))
    }

    /// Whether the output can feed a consumer declared as `value_type`.
    pub fn can_produce(&self, value_type: &ValueType) -> bool {
        value_type.accepts(&self.output_type)
    }

    pub fn instantiate(&self, parameters: &Parameters) -> Result<Arc<dyn Transformer>, TransformerError> {
        (self.factory)(parameters)
    }
}

impl fmt::Debug for TransformerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerRegistration")
            .field("id", &self.id)
            .field("inputs", &self.inputs)
            .field("output_type", &self.output_type)
            .finish_non_exhaustive()
    }
}

/// Lookup service for transformer registrations.
pub trait TransformerRegistry: Send + Sync {
    fn registrations(&self) -> Vec<&TransformerRegistration>;

    fn lookup(&self, registration_id: &str) -> Result<&TransformerRegistration, RegistryError>;

    fn is_registered(&self, registration_id: &str) -> bool {
        self.lookup(registration_id).is_ok()
    }

    /// Registrations with at least one pin able to consume `value_type`.
    fn list_compatible(&self, value_type: &ValueType) -> Vec<&TransformerRegistration> {
        self.registrations()
            .into_iter()
            .filter(|registration| registration.can_accept(value_type))
            .collect()
    }

    /// Registrations whose output satisfies a consumer of `value_type`.
    fn list_producing(&self, value_type: &ValueType) -> Vec<&TransformerRegistration> {
        self.registrations()
            .into_iter()
            .filter(|registration| registration.can_produce(value_type))
            .collect()
    }
}
