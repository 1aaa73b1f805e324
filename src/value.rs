//! Dynamic column values.
//!
//! `Value` is what rows carry and what filters compare against. It converts
//! into `sea_query::Value` when a statement is rendered for a SQL executor, and
//! is compared directly by the in-memory store.
//!
//! The `ValueType` trait maps Rust types onto `Value` variants:
//!
//! ```rust
//! use hatchling::{Value, ValueType};
//!
//! let value = 42i32.into_value();
//! assert_eq!(value, Value::Int(42));
//! assert_eq!(i64::from_value(&value), Some(42));
//! assert_eq!(Option::<String>::from_value(&Value::Null), Some(None));
//! ```

use chrono::NaiveDateTime;
use serde::Serialize;
use std::cmp::Ordering;

/// A single column value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Compare two values the way SQL does for same-kind operands.
    ///
    /// Integers and floats compare numerically. `NULL` and mismatched kinds
    /// are unordered (`None`), so every comparison against them is false.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Convert into the SQL builder's value type
    pub fn to_sea_value(&self) -> sea_query::Value {
        match self {
            Value::Null => sea_query::Value::from(None::<String>),
            Value::Bool(b) => sea_query::Value::from(*b),
            Value::Int(i) => sea_query::Value::from(*i),
            Value::Float(f) => sea_query::Value::from(*f),
            Value::Text(s) => sea_query::Value::from(s.clone()),
            Value::DateTime(dt) => sea_query::Value::from(*dt),
        }
    }
}

/// Mapping between Rust types and [`Value`] variants.
pub trait ValueType: Sized {
    /// Convert this value into a [`Value`].
    fn into_value(self) -> Value;

    /// Convert a [`Value`] back into this type.
    ///
    /// Returns `None` if the variant does not match.
    fn from_value(value: &Value) -> Option<Self>;
}

impl ValueType for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl ValueType for i64 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl ValueType for i32 {
    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => i32::try_from(*i).ok(),
            _ => None,
        }
    }
}

impl ValueType for u64 {
    fn into_value(self) -> Value {
        // Values above i64::MAX cannot be stored in a BIGINT column
        Value::Int(i64::try_from(self).unwrap_or(i64::MAX))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => u64::try_from(*i).ok(),
            _ => None,
        }
    }
}

impl ValueType for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl ValueType for String {
    fn into_value(self) -> Value {
        Value::Text(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl ValueType for NaiveDateTime {
    fn into_value(self) -> Value {
        Value::DateTime(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl<T: ValueType> ValueType for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

macro_rules! impl_from_value_type {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    v.into_value()
                }
            }
        )*
    };
}

impl_from_value_type!(bool, i32, i64, u64, f64, String, NaiveDateTime);

impl<T: ValueType> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.into_value()
    }
}
