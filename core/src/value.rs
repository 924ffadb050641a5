//! Value types for Reflex attributes.
//!
//! Values are the atomic data stored in object slots and tagged values.
//! Reflex supports the Java-style primitive family (bool, int, long, short,
//! byte, char, float, double), strings and object references.

use crate::ObjectId;
use std::collections::HashMap;
use std::fmt;

/// A value that can be stored in an attribute slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null/missing value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// 16-bit signed integer.
    Short(i16),
    /// 8-bit signed integer.
    Byte(i8),
    /// Single character.
    Char(char),
    /// 32-bit floating point.
    Float(f32),
    /// 64-bit floating point.
    Double(f64),
    /// UTF-8 string. Also carries enumeration literals.
    String(String),
    /// Reference to an object.
    Object(ObjectId),
}

impl Value {
    /// Returns true if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as boolean if this is a Bool value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 for any of the integral variants.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(i64::from(*i)),
            Value::Long(l) => Some(*l),
            Value::Short(s) => Some(i64::from(*s)),
            Value::Byte(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Get as f64 for either floating variant.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(f64::from(*f)),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Get as string reference if this is a String value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as object ID if this is an Object value.
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Long(_) => "Long",
            Value::Short(_) => "Short",
            Value::Byte(_) => "Byte",
            Value::Char(_) => "Char",
            Value::Float(_) => "Float",
            Value::Double(_) => "Double",
            Value::String(_) => "String",
            Value::Object(_) => "Object",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Long(l) => write!(f, "{}L", l),
            Value::Short(s) => write!(f, "{}s", s),
            Value::Byte(b) => write!(f, "{}b", b),
            Value::Char(c) => write!(f, "'{}'", c),
            Value::Float(fl) => write!(f, "{}f", fl),
            Value::Double(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Object(id) => write!(f, "#{}", id),
        }
    }
}

// Convenient From implementations
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<i64> for Value {
    fn from(l: i64) -> Self {
        Value::Long(l)
    }
}

impl From<i16> for Value {
    fn from(s: i16) -> Self {
        Value::Short(s)
    }
}

impl From<i8> for Value {
    fn from(b: i8) -> Self {
        Value::Byte(b)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::Object(id)
    }
}

/// Attribute values of one declaring classifier, by attribute name.
pub type Attributes = HashMap<String, Value>;
