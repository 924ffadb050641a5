//! Reflex Model
//!
//! This crate provides the in-memory metamodel kernel:
//! - Metaclasses, classes (each with an embedded object identity) and objects
//! - Single and multiple generalization for every classifier kind
//! - Typed attributes with defaults, shadowing and qualified access
//! - Associations, association ends and multiplicity-checked links
//! - Stereotypes extending metaclasses and associations, with tagged values
//! - Cascading deletion and named lookup through imported models

mod association;
mod attribute;
pub mod config;
mod delete;
pub mod entity;
pub mod handle;
mod hierarchy;
mod instance;
mod model;
mod stereotype;

pub use config::*;
pub use entity::*;
pub use handle::{
    ClassId, ClassifierHandle, ClassifierKind, ElementInstance, ExtendedElement, Instance,
    MetaclassId, StereotypeId,
};
pub use model::Model;

pub use reflex_core;
