//! Typed classifier handles and the capability enums built on them.
//!
//! Raw [`ClassifierId`]s say nothing about the classifier's kind. The handles
//! here do, so operations that must not mix kinds (superclassing, class
//! instantiation, stereotype application) are checked by the compiler.

use reflex_core::{AssociationId, ClassifierId, LinkId, ObjectId};
use std::fmt;

/// The three kinds of classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassifierKind {
    Metaclass,
    Class,
    Stereotype,
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierKind::Metaclass => write!(f, "metaclass"),
            ClassifierKind::Class => write!(f, "class"),
            ClassifierKind::Stereotype => write!(f, "stereotype"),
        }
    }
}

pub(crate) mod sealed {
    use reflex_core::ClassifierId;

    pub trait Sealed {
        fn wrap(id: ClassifierId) -> Self;
    }
}

/// A classifier id whose kind is known statically.
pub trait ClassifierHandle: Copy + Eq + fmt::Debug + fmt::Display + sealed::Sealed {
    /// Kind every handle of this type refers to.
    const KIND: ClassifierKind;

    /// The untyped arena id.
    fn id(self) -> ClassifierId;
}

macro_rules! classifier_handle {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(ClassifierId);

        impl sealed::Sealed for $name {
            fn wrap(id: ClassifierId) -> Self {
                Self(id)
            }
        }

        impl ClassifierHandle for $name {
            const KIND: ClassifierKind = $kind;

            fn id(self) -> ClassifierId {
                self.0
            }
        }

        impl From<$name> for ClassifierId {
            fn from(handle: $name) -> Self {
                handle.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

classifier_handle!(
    /// Handle to a metaclass.
    MetaclassId,
    ClassifierKind::Metaclass
);

classifier_handle!(
    /// Handle to a class.
    ClassId,
    ClassifierKind::Class
);

classifier_handle!(
    /// Handle to a stereotype.
    StereotypeId,
    ClassifierKind::Stereotype
);

/// Anything that can hold attribute values and sit at a link end.
///
/// A class participates through its embedded object identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instance {
    Object(ObjectId),
    Class(ClassId),
}

impl From<ObjectId> for Instance {
    fn from(id: ObjectId) -> Self {
        Instance::Object(id)
    }
}

impl From<ClassId> for Instance {
    fn from(id: ClassId) -> Self {
        Instance::Class(id)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instance::Object(id) => write!(f, "{}", id),
            Instance::Class(id) => write!(f, "{}", id),
        }
    }
}

/// An element a stereotype can extend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtendedElement {
    Metaclass(MetaclassId),
    Association(AssociationId),
}

impl From<MetaclassId> for ExtendedElement {
    fn from(id: MetaclassId) -> Self {
        ExtendedElement::Metaclass(id)
    }
}

impl From<AssociationId> for ExtendedElement {
    fn from(id: AssociationId) -> Self {
        ExtendedElement::Association(id)
    }
}

impl fmt::Display for ExtendedElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtendedElement::Metaclass(id) => write!(f, "{}", id),
            ExtendedElement::Association(id) => write!(f, "{}", id),
        }
    }
}

/// An element a stereotype can be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementInstance {
    Class(ClassId),
    Link(LinkId),
}

impl From<ClassId> for ElementInstance {
    fn from(id: ClassId) -> Self {
        ElementInstance::Class(id)
    }
}

impl From<LinkId> for ElementInstance {
    fn from(id: LinkId) -> Self {
        ElementInstance::Link(id)
    }
}

impl fmt::Display for ElementInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementInstance::Class(id) => write!(f, "{}", id),
            ElementInstance::Link(id) => write!(f, "{}", id),
        }
    }
}
