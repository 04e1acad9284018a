// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Runtime values and the type descriptors used to check them.
//!
//! Every value that flows through a workflow is a [`DataValue`]. Producers and input pins
//! declare a [`ValueType`], and [`ValueType::accepts`] is the covariance rule used when
//! stitching an output to an input: a pin declared as `Number` accepts an `Integer`
//! producer, a pin declared as `Any` accepts everything.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A value produced by a workflow source or a transformer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DataValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<DataValue>),
    Record(BTreeMap<String, DataValue>),
}

impl DataValue {
    /// The most specific type describing this value.
    ///
    /// Lists report `List(T)` when every element shares the type `T` and `List(Any)`
    /// otherwise (including the empty list).
    pub fn value_type(&self) -> ValueType {
        match self {
            DataValue::Boolean(_) => ValueType::Boolean,
            DataValue::Integer(_) => ValueType::Integer,
            DataValue::Float(_) => ValueType::Float,
            DataValue::Text(_) => ValueType::Text,
            DataValue::Bytes(_) => ValueType::Bytes,
            DataValue::Record(_) => ValueType::Record,
            DataValue::List(items) => {
                let mut types = items.iter().map(DataValue::value_type);
                let element = match types.next() {
                    Some(first) if types.all(|t| t == first) => first,
                    _ => ValueType::Any,
                };
                ValueType::List(Box::new(element))
            }
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            DataValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            DataValue::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Boolean(b) => write!(f, "{}", b),
            DataValue::Integer(n) => write!(f, "{}", n),
            DataValue::Float(x) => write!(f, "{}", x),
            DataValue::Text(s) => write!(f, "{}", s),
            DataValue::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
            DataValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            DataValue::Record(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::Text(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::Text(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Integer(value)
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Float(value)
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Boolean(value)
    }
}

/// Semantic type of a [`DataValue`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Any,
    Boolean,
    Integer,
    Float,
    Number,
    Text,
    Bytes,
    List(Box<ValueType>),
    Record,
}

impl ValueType {
    /// Whether a producer of `other` can feed a consumer declared as `self`.
    pub fn accepts(&self, other: &ValueType) -> bool {
        match (self, other) {
            (ValueType::Any, _) => true,
            (ValueType::Number, ValueType::Integer | ValueType::Float | ValueType::Number) => true,
            (ValueType::List(expected), ValueType::List(provided)) => expected.accepts(provided),
            (expected, provided) => expected == provided,
        }
    }

    /// Whether a concrete runtime value is an instance of this type.
    ///
    /// Unlike `accepts(&value.value_type())` this inspects list elements individually, so
    /// an empty list is an instance of every list type.
    pub fn admits(&self, value: &DataValue) -> bool {
        match (self, value) {
            (ValueType::List(element), DataValue::List(items)) => {
                items.iter().all(|item| element.admits(item))
            }
            (expected, value) => expected.accepts(&value.value_type()),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Any => write!(f, "any"),
            ValueType::Boolean => write!(f, "boolean"),
            ValueType::Integer => write!(f, "integer"),
            ValueType::Float => write!(f, "float"),
            ValueType::Number => write!(f, "number"),
            ValueType::Text => write!(f, "text"),
            ValueType::Bytes => write!(f, "bytes"),
            ValueType::List(element) => write!(f, "list<{}>", element),
            ValueType::Record => write!(f, "record"),
        }
    }
}
