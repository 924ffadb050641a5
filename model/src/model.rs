//! The model: owner and namespace of every entity.

use crate::config::ModelConfig;
use crate::entity::{
    Association, AssociationEnd, ClassData, Classifier, ClassifierData, Link, MetaclassData,
    Object, StereotypeData,
};
use crate::handle::{
    sealed::Sealed, ClassId, ClassifierHandle, ClassifierKind, MetaclassId, StereotypeId,
};
use reflex_core::{
    AssociationId, AttrType, ClassifierId, EndId, EnumId, Enumeration, LinkId, ModelError,
    ModelResult, ObjectId, Value,
};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use tracing::debug;

/// ID allocator for every arena.
///
/// Ids are never reused, so an id below the next free value that is absent
/// from its arena has been deleted.
#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    next_classifier_id: u32,
    next_object_id: u32,
    next_association_id: u32,
    next_end_id: u32,
    next_link_id: u32,
    next_enum_id: u32,
}

impl IdAllocator {
    fn new() -> Self {
        Self {
            next_classifier_id: 1,
            next_object_id: 1,
            next_association_id: 1,
            next_end_id: 1,
            next_link_id: 1,
            next_enum_id: 1,
        }
    }

    fn alloc_classifier_id(&mut self) -> ClassifierId {
        let id = ClassifierId::new(self.next_classifier_id);
        self.next_classifier_id += 1;
        id
    }

    fn alloc_object_id(&mut self) -> ObjectId {
        let id = ObjectId::new(self.next_object_id);
        self.next_object_id += 1;
        id
    }

    pub(crate) fn alloc_association_id(&mut self) -> AssociationId {
        let id = AssociationId::new(self.next_association_id);
        self.next_association_id += 1;
        id
    }

    pub(crate) fn alloc_end_id(&mut self) -> EndId {
        let id = EndId::new(self.next_end_id);
        self.next_end_id += 1;
        id
    }

    pub(crate) fn alloc_link_id(&mut self) -> LinkId {
        let id = LinkId::new(self.next_link_id);
        self.next_link_id += 1;
        id
    }

    fn alloc_enum_id(&mut self) -> EnumId {
        let id = EnumId::new(self.next_enum_id);
        self.next_enum_id += 1;
        id
    }
}

/// Per-namespace counters for generated names.
#[derive(Debug, Default)]
struct NameCounters {
    classifiers: u32,
    objects: u32,
    enums: u32,
}

/// An in-memory metamodel: classifiers, objects, associations, links,
/// stereotypes and enumerations, plus read-only imported models.
#[derive(Debug)]
pub struct Model {
    pub(crate) config: ModelConfig,
    pub(crate) ids: IdAllocator,
    names: NameCounters,

    pub(crate) classifiers: BTreeMap<ClassifierId, Classifier>,
    pub(crate) classifier_names: HashMap<String, ClassifierId>,

    /// Plain objects and the embedded objects of classes.
    pub(crate) objects: BTreeMap<ObjectId, Object>,
    /// Names of plain objects only.
    pub(crate) object_names: HashMap<String, ObjectId>,

    pub(crate) associations: BTreeMap<AssociationId, Association>,
    pub(crate) ends: BTreeMap<EndId, AssociationEnd>,
    pub(crate) links: BTreeMap<LinkId, Link>,

    pub(crate) enums: BTreeMap<EnumId, Enumeration>,
    pub(crate) enum_names: HashMap<String, EnumId>,

    imports: Vec<Rc<Model>>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    /// Create an empty model with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ModelConfig::default())
    }

    /// Create an empty model with a custom configuration.
    pub fn with_config(config: ModelConfig) -> Self {
        Self {
            config,
            ids: IdAllocator::new(),
            names: NameCounters::default(),
            classifiers: BTreeMap::new(),
            classifier_names: HashMap::new(),
            objects: BTreeMap::new(),
            object_names: HashMap::new(),
            associations: BTreeMap::new(),
            ends: BTreeMap::new(),
            links: BTreeMap::new(),
            enums: BTreeMap::new(),
            enum_names: HashMap::new(),
            imports: Vec::new(),
        }
    }

    /// The configuration this model was created with.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    // ==================== Creation ====================

    /// Create a metaclass, auto-naming it if `name` is `None`.
    pub fn create_metaclass(&mut self, name: Option<&str>) -> ModelResult<MetaclassId> {
        let prefix = self.config.metaclass_prefix.clone();
        let name = self.claim_classifier_name(name, &prefix)?;
        let id = self.ids.alloc_classifier_id();
        self.insert_classifier(Classifier::new(
            id,
            name,
            ClassifierData::Metaclass(MetaclassData::default()),
        ));
        debug!(classifier = %id, "created metaclass");
        Ok(MetaclassId::wrap(id))
    }

    /// Create a class instantiating `metaclass`.
    ///
    /// Default values of the metaclass and all its superclasses are seeded
    /// into the class's embedded object.
    pub fn create_class(
        &mut self,
        metaclass: MetaclassId,
        name: Option<&str>,
    ) -> ModelResult<ClassId> {
        self.metaclass_data(metaclass)?;
        let prefix = self.config.class_prefix.clone();
        let name = self.claim_classifier_name(name, &prefix)?;
        let defaults = self.default_values(metaclass.id());

        let id = self.ids.alloc_classifier_id();
        let class = ClassId::wrap(id);
        let object_id = self.ids.alloc_object_id();

        let mut object = Object::new(object_id, name.clone(), metaclass.id());
        object.represents = Some(class);
        for (owner, attr, value) in defaults {
            object.slots.set(owner, &attr, value);
        }
        self.objects.insert(object_id, object);

        self.insert_classifier(Classifier::new(
            id,
            name,
            ClassifierData::Class(ClassData {
                metaclass,
                object: object_id,
                instances: Vec::new(),
                stereotypes: Vec::new(),
            }),
        ));
        if let Some(data) = self
            .classifiers
            .get_mut(&metaclass.id())
            .and_then(Classifier::metaclass_mut)
        {
            data.class_instances.push(class);
        }

        debug!(classifier = %id, metaclass = %metaclass, object = %object_id, "created class");
        Ok(class)
    }

    /// Create a stereotype, auto-naming it if `name` is `None`.
    pub fn create_stereotype(&mut self, name: Option<&str>) -> ModelResult<StereotypeId> {
        let prefix = self.config.stereotype_prefix.clone();
        let name = self.claim_classifier_name(name, &prefix)?;
        let id = self.ids.alloc_classifier_id();
        self.insert_classifier(Classifier::new(
            id,
            name,
            ClassifierData::Stereotype(StereotypeData::default()),
        ));
        debug!(classifier = %id, "created stereotype");
        Ok(StereotypeId::wrap(id))
    }

    /// Create an object instantiating `class`.
    ///
    /// Default values of the class and all its superclasses are seeded.
    pub fn create_object(&mut self, class: ClassId, name: Option<&str>) -> ModelResult<ObjectId> {
        self.class_data(class)?;
        let name = match name {
            Some(name) => {
                check_name("object", name)?;
                if self.object_names.contains_key(name) {
                    return Err(ModelError::duplicate_name("object", name));
                }
                name.to_string()
            }
            None => {
                let prefix = self.config.object_prefix.clone();
                let mut counter = self.names.objects;
                let name = next_free_name(&prefix, &mut counter, |n| {
                    self.object_names.contains_key(n)
                });
                self.names.objects = counter;
                name
            }
        };
        let defaults = self.default_values(class.id());

        let id = self.ids.alloc_object_id();
        let mut object = Object::new(id, name.clone(), class.id());
        for (owner, attr, value) in defaults {
            object.slots.set(owner, &attr, value);
        }
        self.objects.insert(id, object);
        self.object_names.insert(name, id);
        if let Some(data) = self
            .classifiers
            .get_mut(&class.id())
            .and_then(Classifier::class_mut)
        {
            data.instances.push(id);
        }

        debug!(object = %id, class = %class, "created object");
        Ok(id)
    }

    /// Create an enumeration with the given literals.
    pub fn create_enum<I, S>(&mut self, name: Option<&str>, values: I) -> ModelResult<EnumId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = match name {
            Some(name) => {
                check_name("enumeration", name)?;
                if self.enum_names.contains_key(name) {
                    return Err(ModelError::duplicate_name("enumeration", name));
                }
                name.to_string()
            }
            None => {
                let prefix = self.config.enum_prefix.clone();
                let mut counter = self.names.enums;
                let name =
                    next_free_name(&prefix, &mut counter, |n| self.enum_names.contains_key(n));
                self.names.enums = counter;
                name
            }
        };

        let id = self.ids.alloc_enum_id();
        let values = values.into_iter().map(Into::into).collect();
        self.enums
            .insert(id, Enumeration::new(id, name.clone(), values));
        self.enum_names.insert(name, id);
        debug!(enumeration = %id, "created enumeration");
        Ok(id)
    }

    /// Add a literal to an enumeration.
    pub fn add_enum_value(&mut self, enumeration: EnumId, literal: &str) -> ModelResult<()> {
        check_name("enumeration literal", literal)?;
        let target = self.enum_ref(enumeration)?;
        if target.contains(literal) {
            return Err(ModelError::duplicate_name("enumeration literal", literal));
        }
        if let Some(target) = self.enums.get_mut(&enumeration) {
            target.add_value(literal);
        }
        Ok(())
    }

    /// Remove a literal that no default or stored value uses.
    pub fn remove_enum_value(&mut self, enumeration: EnumId, literal: &str) -> ModelResult<()> {
        let target = self.enum_ref(enumeration)?;
        if !target.contains(literal) {
            return Err(ModelError::unknown_name("enumeration literal", literal));
        }

        let used = Value::from(literal);
        for classifier in self.classifiers.values() {
            for attribute in &classifier.attributes {
                if attribute.ty != AttrType::Enum(enumeration) {
                    continue;
                }
                let in_default = attribute.default.as_ref() == Some(&used);
                let in_slots = self
                    .objects
                    .values()
                    .map(|o| &o.slots)
                    .chain(self.links.values().map(|l| &l.slots))
                    .any(|slots| slots.get(classifier.id, &attribute.name) == Some(&used));
                if in_default || in_slots {
                    return Err(ModelError::structure(format!(
                        "literal '{}' is still used by attribute '{}' of '{}'",
                        literal, attribute.name, classifier.name
                    )));
                }
            }
        }

        if let Some(target) = self.enums.get_mut(&enumeration) {
            target.remove_value(literal);
        }
        Ok(())
    }

    fn insert_classifier(&mut self, classifier: Classifier) {
        self.classifier_names
            .insert(classifier.name.clone(), classifier.id);
        self.classifiers.insert(classifier.id, classifier);
    }

    fn claim_classifier_name(&mut self, name: Option<&str>, prefix: &str) -> ModelResult<String> {
        match name {
            Some(name) => {
                check_name("classifier", name)?;
                if self.classifier_names.contains_key(name) {
                    return Err(ModelError::duplicate_name("classifier", name));
                }
                Ok(name.to_string())
            }
            None => {
                let mut counter = self.names.classifiers;
                let name = next_free_name(prefix, &mut counter, |n| {
                    self.classifier_names.contains_key(n)
                });
                self.names.classifiers = counter;
                Ok(name)
            }
        }
    }

    // ==================== Renaming ====================

    /// Rename a classifier. A class's embedded object follows the new name.
    pub fn rename_classifier(&mut self, id: ClassifierId, name: &str) -> ModelResult<()> {
        let old = self.classifier_ref(id)?.name.clone();
        if old == name {
            return Ok(());
        }
        check_name("classifier", name)?;
        if self.classifier_names.contains_key(name) {
            return Err(ModelError::duplicate_name("classifier", name));
        }

        self.classifier_names.remove(&old);
        self.classifier_names.insert(name.to_string(), id);
        let class_object = self
            .classifiers
            .get_mut(&id)
            .map(|c| {
                c.name = name.to_string();
                c.as_class().map(|data| data.object)
            })
            .unwrap_or_default();
        if let Some(object) = class_object.and_then(|o| self.objects.get_mut(&o)) {
            object.name = name.to_string();
        }
        debug!(classifier = %id, from = %old, to = %name, "renamed classifier");
        Ok(())
    }

    /// Rename a plain object.
    pub fn rename_object(&mut self, id: ObjectId, name: &str) -> ModelResult<()> {
        let object = self.object_ref(id)?;
        if object.is_class_object() {
            return Err(ModelError::structure(format!(
                "object {} is the identity of a class; rename the class instead",
                id
            )));
        }
        let old = object.name.clone();
        if old == name {
            return Ok(());
        }
        check_name("object", name)?;
        if self.object_names.contains_key(name) {
            return Err(ModelError::duplicate_name("object", name));
        }

        self.object_names.remove(&old);
        self.object_names.insert(name.to_string(), id);
        if let Some(object) = self.objects.get_mut(&id) {
            object.name = name.to_string();
        }
        Ok(())
    }

    // ==================== Imports ====================

    /// Import a model for read-only transitive name lookup.
    ///
    /// An imported model is frozen behind an `Rc`; ids it returns address
    /// that model, not this one.
    pub fn import(&mut self, model: Rc<Model>) {
        self.imports.push(model);
    }

    /// Imported models, in import order.
    pub fn imports(&self) -> &[Rc<Model>] {
        &self.imports
    }

    // ==================== Name Lookups ====================

    /// Find a classifier by name in this model only.
    pub fn get_classifier(&self, name: &str) -> Option<ClassifierId> {
        self.classifier_names.get(name).copied()
    }

    /// Find a classifier by name in this model, then in imports.
    pub fn lookup_classifier(&self, name: &str) -> Option<(&Model, ClassifierId)> {
        if let Some(id) = self.get_classifier(name) {
            return Some((self, id));
        }
        self.imports
            .iter()
            .find_map(|model| model.lookup_classifier(name))
    }

    /// Find a classifier by name in this model, failing if it is unknown.
    pub fn require_classifier(&self, name: &str) -> ModelResult<ClassifierId> {
        self.get_classifier(name)
            .ok_or_else(|| ModelError::unknown_name("classifier", name))
    }

    /// Find a plain object by name in this model only.
    pub fn get_object(&self, name: &str) -> Option<ObjectId> {
        self.object_names.get(name).copied()
    }

    /// Find a plain object by name in this model, then in imports.
    pub fn lookup_object(&self, name: &str) -> Option<(&Model, ObjectId)> {
        if let Some(id) = self.get_object(name) {
            return Some((self, id));
        }
        self.imports.iter().find_map(|model| model.lookup_object(name))
    }

    /// Find a plain object by name in this model, failing if it is unknown.
    pub fn require_object(&self, name: &str) -> ModelResult<ObjectId> {
        self.get_object(name)
            .ok_or_else(|| ModelError::unknown_name("object", name))
    }

    /// Find an enumeration by name in this model only.
    pub fn get_enum(&self, name: &str) -> Option<EnumId> {
        self.enum_names.get(name).copied()
    }

    /// Find an enumeration by name in this model, then in imports.
    pub fn lookup_enum(&self, name: &str) -> Option<(&Model, EnumId)> {
        if let Some(id) = self.get_enum(name) {
            return Some((self, id));
        }
        self.imports.iter().find_map(|model| model.lookup_enum(name))
    }

    /// Associations with the given name in this model only.
    pub fn get_associations(&self, name: &str) -> Vec<AssociationId> {
        self.associations
            .values()
            .filter(|a| a.name.as_deref() == Some(name))
            .map(|a| a.id)
            .collect()
    }

    /// Associations with the given name in this model and all imports.
    pub fn lookup_associations(&self, name: &str) -> Vec<(&Model, AssociationId)> {
        let mut result: Vec<(&Model, AssociationId)> = self
            .get_associations(name)
            .into_iter()
            .map(|id| (self, id))
            .collect();
        for model in &self.imports {
            result.extend(model.lookup_associations(name));
        }
        result
    }

    // ==================== Entity Access ====================

    /// Get a classifier by id.
    pub fn classifier(&self, id: impl Into<ClassifierId>) -> Option<&Classifier> {
        let id: ClassifierId = id.into();
        self.classifiers.get(&id)
    }

    /// Get an object by id. Includes the embedded objects of classes.
    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    /// Get an association by id.
    pub fn association(&self, id: AssociationId) -> Option<&Association> {
        self.associations.get(&id)
    }

    /// Get an association end by id.
    pub fn end(&self, id: EndId) -> Option<&AssociationEnd> {
        self.ends.get(&id)
    }

    /// Get a link by id.
    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    /// Get an enumeration by id.
    pub fn enumeration(&self, id: EnumId) -> Option<&Enumeration> {
        self.enums.get(&id)
    }

    /// All classifiers, in creation order.
    pub fn classifiers(&self) -> impl Iterator<Item = &Classifier> {
        self.classifiers.values()
    }

    /// All plain objects, in creation order.
    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.objects.values().filter(|o| !o.is_class_object())
    }

    /// All associations, in creation order.
    pub fn associations(&self) -> impl Iterator<Item = &Association> {
        self.associations.values()
    }

    /// All enumerations, in creation order.
    pub fn enums(&self) -> impl Iterator<Item = &Enumeration> {
        self.enums.values()
    }

    /// Kind of a classifier, if it exists.
    pub fn classifier_kind(&self, id: ClassifierId) -> Option<ClassifierKind> {
        self.classifiers.get(&id).map(Classifier::kind)
    }

    /// Narrow an untyped id to a metaclass handle.
    pub fn as_metaclass(&self, id: ClassifierId) -> Option<MetaclassId> {
        (self.classifier_kind(id)? == ClassifierKind::Metaclass).then(|| MetaclassId::wrap(id))
    }

    /// Narrow an untyped id to a class handle.
    pub fn as_class(&self, id: ClassifierId) -> Option<ClassId> {
        (self.classifier_kind(id)? == ClassifierKind::Class).then(|| ClassId::wrap(id))
    }

    /// Narrow an untyped id to a stereotype handle.
    pub fn as_stereotype(&self, id: ClassifierId) -> Option<StereotypeId> {
        (self.classifier_kind(id)? == ClassifierKind::Stereotype).then(|| StereotypeId::wrap(id))
    }

    /// Name of a classifier, or its id when unknown. Used in messages.
    pub(crate) fn classifier_label(&self, id: ClassifierId) -> String {
        self.classifiers
            .get(&id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    // ==================== Checked Access ====================

    pub(crate) fn classifier_ref(&self, id: ClassifierId) -> ModelResult<&Classifier> {
        self.classifiers.get(&id).ok_or_else(|| {
            if id.raw() < self.ids.next_classifier_id {
                ModelError::already_deleted("classifier", id)
            } else {
                ModelError::not_found("classifier", id)
            }
        })
    }

    pub(crate) fn classifier_mut(&mut self, id: ClassifierId) -> ModelResult<&mut Classifier> {
        let next = self.ids.next_classifier_id;
        self.classifiers.get_mut(&id).ok_or_else(|| {
            if id.raw() < next {
                ModelError::already_deleted("classifier", id)
            } else {
                ModelError::not_found("classifier", id)
            }
        })
    }

    pub(crate) fn object_ref(&self, id: ObjectId) -> ModelResult<&Object> {
        self.objects.get(&id).ok_or_else(|| {
            if id.raw() < self.ids.next_object_id {
                ModelError::already_deleted("object", id)
            } else {
                ModelError::not_found("object", id)
            }
        })
    }

    pub(crate) fn association_ref(&self, id: AssociationId) -> ModelResult<&Association> {
        self.associations.get(&id).ok_or_else(|| {
            if id.raw() < self.ids.next_association_id {
                ModelError::already_deleted("association", id)
            } else {
                ModelError::not_found("association", id)
            }
        })
    }

    pub(crate) fn end_ref(&self, id: EndId) -> ModelResult<&AssociationEnd> {
        self.ends.get(&id).ok_or_else(|| {
            if id.raw() < self.ids.next_end_id {
                ModelError::already_deleted("association end", id)
            } else {
                ModelError::not_found("association end", id)
            }
        })
    }

    pub(crate) fn link_ref(&self, id: LinkId) -> ModelResult<&Link> {
        self.links.get(&id).ok_or_else(|| {
            if id.raw() < self.ids.next_link_id {
                ModelError::already_deleted("link", id)
            } else {
                ModelError::not_found("link", id)
            }
        })
    }

    pub(crate) fn enum_ref(&self, id: EnumId) -> ModelResult<&Enumeration> {
        self.enums.get(&id).ok_or_else(|| {
            if id.raw() < self.ids.next_enum_id {
                ModelError::already_deleted("enumeration", id)
            } else {
                ModelError::not_found("enumeration", id)
            }
        })
    }

    pub(crate) fn metaclass_data(&self, id: MetaclassId) -> ModelResult<&MetaclassData> {
        self.classifier_ref(id.id())?
            .as_metaclass()
            .ok_or_else(|| ModelError::not_found("metaclass", id))
    }

    pub(crate) fn class_data(&self, id: ClassId) -> ModelResult<&ClassData> {
        self.classifier_ref(id.id())?
            .as_class()
            .ok_or_else(|| ModelError::not_found("class", id))
    }

    pub(crate) fn stereotype_data(&self, id: StereotypeId) -> ModelResult<&StereotypeData> {
        self.classifier_ref(id.id())?
            .as_stereotype()
            .ok_or_else(|| ModelError::not_found("stereotype", id))
    }
}

fn check_name(what: &str, name: &str) -> ModelResult<()> {
    if name.trim().is_empty() {
        return Err(ModelError::Identifier(format!("{} name must not be empty", what)));
    }
    Ok(())
}

/// Next `"{prefix}{n}"` not rejected by `taken`, advancing the counter.
fn next_free_name(prefix: &str, counter: &mut u32, taken: impl Fn(&str) -> bool) -> String {
    loop {
        *counter += 1;
        let candidate = format!("{}{}", prefix, counter);
        if !taken(&candidate) {
            return candidate;
        }
    }
}
