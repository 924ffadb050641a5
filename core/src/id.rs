//! Identity types for Reflex entities.
//!
//! All identifiers are arena indices that are:
//! - Unique within their model
//! - Never reused after deletion
//! - Opaque to external users

use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            /// Create a new identifier from a raw value.
            pub fn new(id: u32) -> Self {
                Self(id)
            }

            /// Get the raw value.
            pub fn raw(&self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

arena_id!(
    /// Identifier for a classifier (metaclass, class or stereotype).
    ClassifierId,
    "c"
);

arena_id!(
    /// Identifier for an object, including the embedded object of a class.
    ObjectId,
    "o"
);

arena_id!(
    /// Identifier for an association.
    AssociationId,
    "a"
);

arena_id!(
    /// Identifier for an association end.
    EndId,
    "end"
);

arena_id!(
    /// Identifier for a link realizing an association.
    LinkId,
    "l"
);

arena_id!(
    /// Identifier for an enumeration type.
    EnumId,
    "enum"
);
