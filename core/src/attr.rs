//! Attribute declarations and enumeration types.

use crate::{ClassifierId, EnumId, Value};
use std::fmt;

/// Declared type of an attribute.
///
/// The object and enum tags carry the classifier or enumeration they refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrType {
    Object(ClassifierId),
    String,
    Int,
    Bool,
    Float,
    Double,
    Long,
    Char,
    Byte,
    Short,
    Enum(EnumId),
}

impl AttrType {
    /// Infer the tag of a primitive value.
    ///
    /// Returns `None` for `Null` and for object references, whose tag depends
    /// on the referenced object's classifier. Strings always infer `String`.
    pub fn infer(value: &Value) -> Option<AttrType> {
        match value {
            Value::Null | Value::Object(_) => None,
            Value::Bool(_) => Some(AttrType::Bool),
            Value::Int(_) => Some(AttrType::Int),
            Value::Long(_) => Some(AttrType::Long),
            Value::Short(_) => Some(AttrType::Short),
            Value::Byte(_) => Some(AttrType::Byte),
            Value::Char(_) => Some(AttrType::Char),
            Value::Float(_) => Some(AttrType::Float),
            Value::Double(_) => Some(AttrType::Double),
            Value::String(_) => Some(AttrType::String),
        }
    }

    /// Returns true if a value's runtime tag matches this primitive type.
    ///
    /// Object and enum types need model context and always return false here.
    pub fn matches_primitive(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (AttrType::String, Value::String(_))
                | (AttrType::Int, Value::Int(_))
                | (AttrType::Bool, Value::Bool(_))
                | (AttrType::Float, Value::Float(_))
                | (AttrType::Double, Value::Double(_))
                | (AttrType::Long, Value::Long(_))
                | (AttrType::Char, Value::Char(_))
                | (AttrType::Byte, Value::Byte(_))
                | (AttrType::Short, Value::Short(_))
        )
    }

    /// The referenced classifier of an object-typed attribute.
    pub fn referenced_classifier(&self) -> Option<ClassifierId> {
        match self {
            AttrType::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// The referenced enumeration of an enum-typed attribute.
    pub fn referenced_enum(&self) -> Option<EnumId> {
        match self {
            AttrType::Enum(id) => Some(*id),
            _ => None,
        }
    }

    /// Tag name without the referenced target.
    pub fn tag_name(&self) -> &'static str {
        match self {
            AttrType::Object(_) => "Object",
            AttrType::String => "String",
            AttrType::Int => "Int",
            AttrType::Bool => "Bool",
            AttrType::Float => "Float",
            AttrType::Double => "Double",
            AttrType::Long => "Long",
            AttrType::Char => "Char",
            AttrType::Byte => "Byte",
            AttrType::Short => "Short",
            AttrType::Enum(_) => "Enum",
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrType::Object(id) => write!(f, "Object<{}>", id),
            AttrType::Enum(id) => write!(f, "Enum<{}>", id),
            other => f.write_str(other.tag_name()),
        }
    }
}

/// Attribute declaration on a classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Attribute name, unique within the declaring classifier.
    pub name: String,
    /// Declared type.
    pub ty: AttrType,
    /// Default value seeded into new instances.
    pub default: Option<Value>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, ty: AttrType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// An enumeration type: a named list of string literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumeration {
    /// Unique identifier.
    pub id: EnumId,
    /// Enumeration name.
    pub name: String,
    /// Legal literals, in declaration order.
    pub values: Vec<String>,
}

impl Enumeration {
    pub fn new(id: EnumId, name: impl Into<String>, values: Vec<String>) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(values.len());
        for value in values {
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        Self {
            id,
            name: name.into(),
            values: unique,
        }
    }

    /// Check if a literal is a member of this enumeration.
    pub fn contains(&self, literal: &str) -> bool {
        self.values.iter().any(|v| v == literal)
    }

    /// Add a literal. Returns false if it was already present.
    pub fn add_value(&mut self, literal: impl Into<String>) -> bool {
        let literal = literal.into();
        if self.contains(&literal) {
            return false;
        }
        self.values.push(literal);
        true
    }

    /// Remove a literal. Returns false if it was not present.
    pub fn remove_value(&mut self, literal: &str) -> bool {
        let before = self.values.len();
        self.values.retain(|v| v != literal);
        self.values.len() != before
    }
}
