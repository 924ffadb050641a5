//! Entity structures stored in the model arena.
//!
//! Entities refer to each other by id only; the model owns all of them.

use crate::handle::{
    ClassId, ClassifierKind, ElementInstance, ExtendedElement, MetaclassId, StereotypeId,
};
use reflex_core::{
    AssociationId, Attribute, Attributes, ClassifierId, EndId, LinkId, Multiplicity, ObjectId,
    Value,
};
use std::collections::{HashMap, HashSet};

/// Kind-specific state of a metaclass.
#[derive(Debug, Clone, Default)]
pub struct MetaclassData {
    /// Classes instantiating this metaclass directly.
    pub class_instances: Vec<ClassId>,
    /// Stereotypes extending this metaclass directly.
    pub stereotypes: Vec<StereotypeId>,
}

/// Kind-specific state of a class.
#[derive(Debug, Clone)]
pub struct ClassData {
    /// The metaclass this class instantiates.
    pub metaclass: MetaclassId,
    /// Embedded object identity used for links and slot storage.
    pub object: ObjectId,
    /// Objects instantiating this class directly.
    pub instances: Vec<ObjectId>,
    /// Stereotypes applied to this class.
    pub stereotypes: Vec<StereotypeId>,
}

/// Kind-specific state of a stereotype.
#[derive(Debug, Clone, Default)]
pub struct StereotypeData {
    /// Metaclasses and associations this stereotype extends.
    pub extended: Vec<ExtendedElement>,
    /// Classes and links this stereotype is applied to.
    pub applied: Vec<ElementInstance>,
}

/// Kind-specific classifier state.
#[derive(Debug, Clone)]
pub enum ClassifierData {
    Metaclass(MetaclassData),
    Class(ClassData),
    Stereotype(StereotypeData),
}

/// A classifier: metaclass, class or stereotype.
#[derive(Debug, Clone)]
pub struct Classifier {
    /// Unique identifier.
    pub id: ClassifierId,
    /// Name, unique among the model's classifiers.
    pub name: String,
    /// Direct superclasses, in insertion order.
    pub superclasses: Vec<ClassifierId>,
    /// Direct subclasses, kept symmetric with `superclasses`.
    pub subclasses: Vec<ClassifierId>,
    /// Declared attributes, in insertion order.
    pub attributes: Vec<Attribute>,
    /// Associations this classifier is an end type of. Self-associations
    /// appear twice.
    pub associations: Vec<AssociationId>,
    /// Kind-specific state.
    pub data: ClassifierData,
}

impl Classifier {
    pub(crate) fn new(id: ClassifierId, name: String, data: ClassifierData) -> Self {
        Self {
            id,
            name,
            superclasses: Vec::new(),
            subclasses: Vec::new(),
            attributes: Vec::new(),
            associations: Vec::new(),
            data,
        }
    }

    /// Kind of this classifier.
    pub fn kind(&self) -> ClassifierKind {
        match self.data {
            ClassifierData::Metaclass(_) => ClassifierKind::Metaclass,
            ClassifierData::Class(_) => ClassifierKind::Class,
            ClassifierData::Stereotype(_) => ClassifierKind::Stereotype,
        }
    }

    /// Get an attribute declared directly on this classifier.
    pub fn get_attr(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub(crate) fn get_attr_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.iter_mut().find(|a| a.name == name)
    }

    /// Check if this classifier declares an attribute directly.
    pub fn has_attr(&self, name: &str) -> bool {
        self.get_attr(name).is_some()
    }

    /// Get all declared attribute names.
    pub fn attr_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|a| a.name.as_str())
    }

    pub fn as_metaclass(&self) -> Option<&MetaclassData> {
        match &self.data {
            ClassifierData::Metaclass(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassData> {
        match &self.data {
            ClassifierData::Class(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_stereotype(&self) -> Option<&StereotypeData> {
        match &self.data {
            ClassifierData::Stereotype(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn metaclass_mut(&mut self) -> Option<&mut MetaclassData> {
        match &mut self.data {
            ClassifierData::Metaclass(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn class_mut(&mut self) -> Option<&mut ClassData> {
        match &mut self.data {
            ClassifierData::Class(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn stereotype_mut(&mut self) -> Option<&mut StereotypeData> {
        match &mut self.data {
            ClassifierData::Stereotype(data) => Some(data),
            _ => None,
        }
    }
}

/// Attribute value table keyed by (declaring classifier, attribute name).
///
/// Tagged values use the same table keyed by stereotype.
#[derive(Debug, Clone, Default)]
pub struct Slots {
    values: HashMap<ClassifierId, Attributes>,
    explicit: HashSet<(ClassifierId, String)>,
}

impl Slots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by declaring classifier and attribute name.
    pub fn get(&self, owner: ClassifierId, name: &str) -> Option<&Value> {
        self.values.get(&owner).and_then(|attrs| attrs.get(name))
    }

    /// Check if a value is present.
    pub fn contains(&self, owner: ClassifierId, name: &str) -> bool {
        self.get(owner, name).is_some()
    }

    /// Set a value. Null removes the slot.
    pub(crate) fn set(&mut self, owner: ClassifierId, name: &str, value: Value) {
        if value.is_null() {
            self.remove(owner, name);
            return;
        }
        self.values
            .entry(owner)
            .or_default()
            .insert(name.to_string(), value);
    }

    /// Set a value and remember that it was set explicitly.
    pub(crate) fn set_explicit(&mut self, owner: ClassifierId, name: &str, value: Value) {
        self.set(owner, name, value);
        self.explicit.insert((owner, name.to_string()));
    }

    /// Check if a value was set explicitly rather than seeded from a default.
    pub fn is_explicit(&self, owner: ClassifierId, name: &str) -> bool {
        self.explicit.contains(&(owner, name.to_string()))
    }

    /// Remove one value. Returns the previous value.
    pub(crate) fn remove(&mut self, owner: ClassifierId, name: &str) -> Option<Value> {
        self.explicit.remove(&(owner, name.to_string()));
        let attrs = self.values.get_mut(&owner)?;
        let removed = attrs.remove(name);
        if attrs.is_empty() {
            self.values.remove(&owner);
        }
        removed
    }

    /// Remove every value of one declaring classifier.
    pub(crate) fn remove_owner(&mut self, owner: ClassifierId) {
        self.values.remove(&owner);
        self.explicit.retain(|(o, _)| *o != owner);
    }

    /// Remove every value referencing the given object.
    pub(crate) fn clear_object_refs(&mut self, object: ObjectId) {
        let mut cleared = Vec::new();
        for (owner, attrs) in &mut self.values {
            attrs.retain(|name, value| {
                let keep = value.as_object() != Some(object);
                if !keep {
                    cleared.push((*owner, name.clone()));
                }
                keep
            });
        }
        self.values.retain(|_, attrs| !attrs.is_empty());
        for key in cleared {
            self.explicit.remove(&key);
        }
    }

    /// Declaring classifiers with at least one value.
    pub fn owners(&self) -> impl Iterator<Item = ClassifierId> + '_ {
        self.values.keys().copied()
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.values().map(|attrs| attrs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A concrete instance. Classes own one of these as their object identity.
#[derive(Debug, Clone)]
pub struct Object {
    /// Unique identifier.
    pub id: ObjectId,
    /// Name; unique among plain objects, equal to the class name for a
    /// class's embedded object.
    pub name: String,
    /// Direct classifier (a class, or a metaclass for a class's object).
    pub classifier: ClassifierId,
    /// The class this object is the identity of, if any.
    pub represents: Option<ClassId>,
    /// Attribute values.
    pub slots: Slots,
}

impl Object {
    pub(crate) fn new(id: ObjectId, name: String, classifier: ClassifierId) -> Self {
        Self {
            id,
            name,
            classifier,
            represents: None,
            slots: Slots::new(),
        }
    }

    /// Returns true if this is the embedded identity of a class.
    pub fn is_class_object(&self) -> bool {
        self.represents.is_some()
    }
}

/// Aggregation flavour of an association. End 1 is the whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssociationKind {
    #[default]
    Plain,
    Aggregation,
    Composition,
}

/// One typed side of an association.
#[derive(Debug, Clone)]
pub struct AssociationEnd {
    /// Unique identifier.
    pub id: EndId,
    /// Role name.
    pub role: String,
    /// Bound on links per opposite object.
    pub multiplicity: Multiplicity,
    /// Whether links may be navigated and removed through this end.
    pub navigable: bool,
    /// Classifier this end is typed over.
    pub classifier: ClassifierId,
    /// Association binding this end, `None` while dangling.
    pub association: Option<AssociationId>,
}

/// A typed two-ended relationship between classifiers.
#[derive(Debug, Clone)]
pub struct Association {
    /// Unique identifier.
    pub id: AssociationId,
    /// Optional, non-unique name.
    pub name: Option<String>,
    /// First end; the whole for aggregations and compositions.
    pub end1: EndId,
    /// Second end.
    pub end2: EndId,
    /// Plain, aggregation or composition.
    pub kind: AssociationKind,
    /// Live links in insertion order.
    pub links: Vec<LinkId>,
    /// Stereotypes extending this association directly.
    pub stereotypes: Vec<StereotypeId>,
}

impl Association {
    pub fn is_aggregation(&self) -> bool {
        self.kind == AssociationKind::Aggregation
    }

    pub fn is_composition(&self) -> bool {
        self.kind == AssociationKind::Composition
    }

    /// Check if an end belongs to this association.
    pub fn has_end(&self, end: EndId) -> bool {
        self.end1 == end || self.end2 == end
    }

    /// The other end, if `end` belongs to this association.
    pub fn opposite(&self, end: EndId) -> Option<EndId> {
        if end == self.end1 {
            Some(self.end2)
        } else if end == self.end2 {
            Some(self.end1)
        } else {
            None
        }
    }
}

/// A concrete connection of two objects realizing an association.
#[derive(Debug, Clone)]
pub struct Link {
    /// Unique identifier.
    pub id: LinkId,
    /// The association this link realizes.
    pub association: AssociationId,
    /// Object at end 1.
    pub object1: ObjectId,
    /// Object at end 2.
    pub object2: ObjectId,
    /// Stereotypes applied to this link.
    pub stereotypes: Vec<StereotypeId>,
    /// Tagged values.
    pub slots: Slots,
}

impl Link {
    pub(crate) fn new(
        id: LinkId,
        association: AssociationId,
        object1: ObjectId,
        object2: ObjectId,
    ) -> Self {
        Self {
            id,
            association,
            object1,
            object2,
            stereotypes: Vec::new(),
            slots: Slots::new(),
        }
    }

    /// Check if this link touches an object at either end.
    pub fn involves(&self, object: ObjectId) -> bool {
        self.object1 == object || self.object2 == object
    }

    /// The object on the other side of `object`, if it is part of this link.
    pub fn other(&self, object: ObjectId) -> Option<ObjectId> {
        if object == self.object1 {
            Some(self.object2)
        } else if object == self.object2 {
            Some(self.object1)
        } else {
            None
        }
    }
}
