//! Error type shared by every Reflex operation.
//!
//! There is one error type. Each variant is a category and carries the
//! human-readable message describing the concrete failure.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while building or mutating a model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Duplicate name on create, unknown name or id on lookup.
    #[error("Identifier error: {0}")]
    Identifier(String),

    /// Cyclic or duplicate hierarchy edges, missing edges, double deletion.
    #[error("Structure error: {0}")]
    Structure(String),

    /// Attribute value or declaration type mismatch.
    #[error("Type error: {0}")]
    Type(String),

    /// Link counts outside declared bounds, malformed bounds.
    #[error("Multiplicity error: {0}")]
    Multiplicity(String),

    /// Access through a non-navigable or foreign association end.
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// Extension legality, duplicate application, missing tagged values.
    #[error("Stereotype error: {0}")]
    Stereotype(String),
}

/// Category of a [`ModelError`], for callers that branch on the kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Identifier,
    Structure,
    Type,
    Multiplicity,
    Navigation,
    Stereotype,
}

impl ModelError {
    /// Get the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelError::Identifier(_) => ErrorKind::Identifier,
            ModelError::Structure(_) => ErrorKind::Structure,
            ModelError::Type(_) => ErrorKind::Type,
            ModelError::Multiplicity(_) => ErrorKind::Multiplicity,
            ModelError::Navigation(_) => ErrorKind::Navigation,
            ModelError::Stereotype(_) => ErrorKind::Stereotype,
        }
    }

    /// Get the message without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            ModelError::Identifier(m)
            | ModelError::Structure(m)
            | ModelError::Type(m)
            | ModelError::Multiplicity(m)
            | ModelError::Navigation(m)
            | ModelError::Stereotype(m) => m,
        }
    }

    pub fn duplicate_name(what: &str, name: &str) -> Self {
        Self::Identifier(format!("{} name '{}' is already used", what, name))
    }

    pub fn unknown_name(what: &str, name: &str) -> Self {
        Self::Identifier(format!("{} '{}' unknown", what, name))
    }

    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        Self::Identifier(format!("{} {} not found", what, id))
    }

    pub fn already_deleted(what: &str, id: impl std::fmt::Display) -> Self {
        Self::Structure(format!("{} {} has already been deleted", what, id))
    }

    pub fn structure(message: impl Into<String>) -> Self {
        Self::Structure(message.into())
    }

    pub fn type_mismatch(
        attr: &str,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        Self::Type(format!(
            "value for attribute '{}' has wrong type: expected {}, got {}",
            attr, expected, actual
        ))
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type(message.into())
    }

    pub fn multiplicity(message: impl Into<String>) -> Self {
        Self::Multiplicity(message.into())
    }

    pub fn navigation(message: impl Into<String>) -> Self {
        Self::Navigation(message.into())
    }

    pub fn stereotype(message: impl Into<String>) -> Self {
        Self::Stereotype(message.into())
    }
}
