// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ValueType;

/// Identity of a single produced value: the producing node (or workflow source) and the
/// type it produces.
///
/// Equality and hashing are structural over both fields, so two keys naming the same
/// producer with different types never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataValueKey {
    source_id: String,
    value_type: ValueType,
}

impl DataValueKey {
    pub fn new(source_id: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            source_id: source_id.into(),
            value_type,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }
}

impl fmt::Display for DataValueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source_id, self.value_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashSet;
    use std::hash::{Hash, Hasher};

    fn hash_of(key: &DataValueKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_equal_keys_hash_equal() {
        let a = DataValueKey::new("node-a", ValueType::Text);
        let b = DataValueKey::new(String::from("node-a"), ValueType::Text);

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_identity_is_structural() {
        let keys = [
            DataValueKey::new("node-a", ValueType::Text),
            DataValueKey::new("node-a", ValueType::Integer),
            DataValueKey::new("node-b", ValueType::Text),
            DataValueKey::new("Node-A", ValueType::Text),
        ];

        for (i, left) in keys.iter().enumerate() {
            for (j, right) in keys.iter().enumerate() {
                let same_fields = left.source_id() == right.source_id()
                    && left.value_type() == right.value_type();
                assert_eq!(left == right, same_fields, "keys {} and {}", i, j);
                assert_eq!(i == j, left == right);
            }
        }

        let unique: HashSet<_> = keys.iter().cloned().collect();
        assert_eq!(unique.len(), keys.len());
    }

    #[test]
    fn test_display() {
        let key = DataValueKey::new("suffix", ValueType::Text);
        assert_eq!(key.to_string(), "suffix:text");
    }
}
