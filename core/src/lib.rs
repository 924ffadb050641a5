//! Reflex Core Types
//!
//! This crate provides the foundational types used throughout Reflex:
//! - Identity types (ClassifierId, ObjectId, AssociationId, EndId, LinkId, EnumId)
//! - Value types (the Value enum with all primitive and reference types)
//! - Attribute declarations (AttrType, Attribute) and enumerations
//! - Multiplicity bounds for association ends
//! - The shared error type

mod attr;
mod error;
mod id;
mod multiplicity;
mod value;

pub use attr::*;
pub use error::*;
pub use id::*;
pub use multiplicity::*;
pub use value::*;
