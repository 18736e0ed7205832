//! Domain values and their runtime types.
//!
//! A [`Value`] is what a parameter takes on after sampling, and what
//! conditions and forbidden clauses compare against. Every value has a
//! [`ValueType`], which unions use to decide which member owns it.

use core::cmp::Ordering;
use core::fmt;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A flat mapping from parameter name to value.
///
/// Used both for raw draws coming out of a [`ConfigSpace`](crate::space::ConfigSpace)
/// and for the post-processed samples handed back to callers.
pub type Assignment = HashMap<String, Value>;

/// A tagged domain value.
///
/// Numeric variants compare across kinds, so `Value::Int(1) == Value::Float(1.0)`.
/// Serializes untagged: booleans, numbers, strings and `null` map to their JSON
/// counterparts; opaque objects map to `{"object": "<type name>"}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// A string.
    Str(String),
    /// The absence of a value.
    None,
    /// An opaque object known only by its type name.
    Object {
        /// The object's type name, used as its runtime type.
        #[serde(rename = "object")]
        type_name: String,
    },
}

impl Value {
    /// Creates an opaque object value with the given type name.
    #[must_use]
    pub fn object(type_name: impl Into<String>) -> Self {
        Value::Object {
            type_name: type_name.into(),
        }
    }

    /// Returns the runtime type of this value.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Str(_) => ValueType::Str,
            Value::None => ValueType::None,
            Value::Object { type_name } => ValueType::Object(type_name.clone()),
        }
    }

    /// Returns `true` for [`Value::None`].
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Returns the value as `f64` if it is numeric.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as `i64` if it is an integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as `bool` if it is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string slice if the value is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    #[allow(clippy::float_cmp, clippy::cast_precision_loss)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::None, Value::None) => true,
            (Value::Object { type_name: a }, Value::Object { type_name: b }) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    /// Orders numbers against numbers and strings against strings.
    /// Everything else is incomparable.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Str(v) => write!(f, "{v}"),
            Value::None => write!(f, "None"),
            Value::Object { type_name } => write!(f, "<{type_name}>"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::None, Into::into)
    }
}

/// The runtime type of a [`Value`].
///
/// Unions hold at most one member per runtime type, and name each member's
/// slot after [`ValueType::tag`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `str`
    Str,
    /// `NoneType`
    None,
    /// An opaque object type, named by its type name.
    Object(String),
}

impl ValueType {
    /// Returns the tag used in encoded slot names, e.g. `int` in `"alpha:int"`.
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Str => "str",
            ValueType::None => "NoneType",
            ValueType::Object(name) => name,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
