//! Stereotype extension, application and tagged values.
//!
//! A stereotype extends metaclasses and associations. It can then be
//! applied to classes of an extended metaclass (or of one of its
//! subclasses) and to links of an extended association. Tagged values are
//! the applied stereotypes' attribute values, stored on the class's
//! embedded object or on the link, keyed by declaring stereotype.

use crate::config::TaggedDefaultPolicy;
use crate::entity::Slots;
use crate::handle::{ClassifierHandle, ElementInstance, ExtendedElement, MetaclassId, StereotypeId};
use crate::model::Model;
use reflex_core::{AssociationId, ClassifierId, ModelError, ModelResult, Value};
use std::collections::HashSet;
use tracing::{debug, trace};

impl Model {
    // ==================== Extension ====================

    /// Let `stereotype` be applied to classes of `metaclass` and of its
    /// subclasses.
    pub fn extend_metaclass(
        &mut self,
        stereotype: StereotypeId,
        metaclass: MetaclassId,
    ) -> ModelResult<()> {
        self.metaclass_data(metaclass)?;
        self.add_extension(stereotype, ExtendedElement::Metaclass(metaclass))
    }

    /// Let `stereotype` be applied to links of `association`. Both ends of
    /// the association must be typed over metaclasses.
    pub fn extend_association(
        &mut self,
        stereotype: StereotypeId,
        association: AssociationId,
    ) -> ModelResult<()> {
        let assoc = self.association_ref(association)?;
        for end in [assoc.end1, assoc.end2] {
            let classifier = self.end_ref(end)?.classifier;
            if self.as_metaclass(classifier).is_none() {
                return Err(ModelError::stereotype(format!(
                    "association {} has an end typed '{}', which is not a metaclass",
                    association,
                    self.classifier_label(classifier)
                )));
            }
        }
        self.add_extension(stereotype, ExtendedElement::Association(association))
    }

    fn add_extension(
        &mut self,
        stereotype: StereotypeId,
        element: ExtendedElement,
    ) -> ModelResult<()> {
        let data = self.stereotype_data(stereotype)?;
        if data.extended.contains(&element) {
            return Err(ModelError::stereotype(format!(
                "stereotype '{}' already extends {}",
                self.classifier_label(stereotype.id()),
                element
            )));
        }

        if let Some(data) = self
            .classifiers
            .get_mut(&stereotype.id())
            .and_then(|c| c.stereotype_mut())
        {
            data.extended.push(element);
        }
        match element {
            ExtendedElement::Metaclass(metaclass) => {
                if let Some(data) = self
                    .classifiers
                    .get_mut(&metaclass.id())
                    .and_then(|c| c.metaclass_mut())
                {
                    data.stereotypes.push(stereotype);
                }
            }
            ExtendedElement::Association(association) => {
                if let Some(assoc) = self.associations.get_mut(&association) {
                    assoc.stereotypes.push(stereotype);
                }
            }
        }
        debug!(stereotype = %stereotype, element = %element, "added extension");
        Ok(())
    }

    /// Remove an extension. Applications that are no longer legal are
    /// removed with their tagged values.
    pub fn remove_extension(
        &mut self,
        stereotype: StereotypeId,
        element: impl Into<ExtendedElement>,
    ) -> ModelResult<()> {
        let element = element.into();
        let data = self.stereotype_data(stereotype)?;
        if !data.extended.contains(&element) {
            return Err(ModelError::stereotype(format!(
                "stereotype '{}' does not extend {}",
                self.classifier_label(stereotype.id()),
                element
            )));
        }

        self.unlink_extension(stereotype, element);
        self.prune_applications(stereotype);
        debug!(stereotype = %stereotype, element = %element, "removed extension");
        Ok(())
    }

    /// Remove both sides of an extension. Missing sides are ignored.
    pub(crate) fn unlink_extension(&mut self, stereotype: StereotypeId, element: ExtendedElement) {
        if let Some(data) = self
            .classifiers
            .get_mut(&stereotype.id())
            .and_then(|c| c.stereotype_mut())
        {
            data.extended.retain(|&e| e != element);
        }
        match element {
            ExtendedElement::Metaclass(metaclass) => {
                if let Some(data) = self
                    .classifiers
                    .get_mut(&metaclass.id())
                    .and_then(|c| c.metaclass_mut())
                {
                    data.stereotypes.retain(|&s| s != stereotype);
                }
            }
            ExtendedElement::Association(association) => {
                if let Some(assoc) = self.associations.get_mut(&association) {
                    assoc.stereotypes.retain(|&s| s != stereotype);
                }
            }
        }
    }

    /// Drop applications of `stereotype` and its subclasses that no longer
    /// satisfy the extension rule.
    pub(crate) fn prune_applications(&mut self, stereotype: StereotypeId) {
        let mut family = vec![stereotype];
        family.extend(
            self.all_subclasses(stereotype)
                .into_iter()
                .filter_map(|id| self.as_stereotype(id)),
        );

        let mut illegal = Vec::new();
        for st in family {
            for &instance in self.applied_instances(st) {
                let legal = self
                    .owning_element(instance)
                    .is_ok_and(|element| self.is_element_extended_by(element, st));
                if !legal {
                    illegal.push((st, instance));
                }
            }
        }
        for (st, instance) in illegal {
            self.unapply(st, instance);
        }
    }

    /// Check if `stereotype`, or one of its superclasses, extends `element`.
    ///
    /// A stereotype extending a metaclass also extends its subclasses.
    pub fn is_element_extended_by(
        &self,
        element: impl Into<ExtendedElement>,
        stereotype: StereotypeId,
    ) -> bool {
        let element = element.into();
        let candidates: Vec<ExtendedElement> = match element {
            ExtendedElement::Metaclass(metaclass) => self
                .ancestry(metaclass)
                .into_iter()
                .filter_map(|id| self.as_metaclass(id))
                .map(ExtendedElement::Metaclass)
                .collect(),
            ExtendedElement::Association(_) => vec![element],
        };
        self.ancestry(stereotype).into_iter().any(|id| {
            self.classifiers
                .get(&id)
                .and_then(|c| c.as_stereotype())
                .is_some_and(|data| candidates.iter().any(|e| data.extended.contains(e)))
        })
    }

    /// Elements a stereotype extends directly.
    pub fn extended_elements(&self, stereotype: StereotypeId) -> &[ExtendedElement] {
        self.classifiers
            .get(&stereotype.id())
            .and_then(|c| c.as_stereotype())
            .map(|data| data.extended.as_slice())
            .unwrap_or_default()
    }

    /// Stereotypes extending an element directly.
    pub fn stereotypes_of_element(&self, element: impl Into<ExtendedElement>) -> &[StereotypeId] {
        match element.into() {
            ExtendedElement::Metaclass(metaclass) => self
                .classifiers
                .get(&metaclass.id())
                .and_then(|c| c.as_metaclass())
                .map(|data| data.stereotypes.as_slice())
                .unwrap_or_default(),
            ExtendedElement::Association(association) => self
                .associations
                .get(&association)
                .map(|a| a.stereotypes.as_slice())
                .unwrap_or_default(),
        }
    }

    // ==================== Application ====================

    /// Apply a stereotype to a class or link.
    ///
    /// Defaults declared on the stereotype and its superclasses are written
    /// as tagged values, replacing any value already held for them.
    pub fn apply_stereotype(
        &mut self,
        stereotype: StereotypeId,
        instance: impl Into<ElementInstance>,
    ) -> ModelResult<()> {
        let instance = instance.into();
        self.stereotype_data(stereotype)?;
        let element = self.owning_element(instance)?;
        if !self.is_element_extended_by(element, stereotype) {
            return Err(ModelError::stereotype(format!(
                "stereotype '{}' does not extend {} of {}",
                self.classifier_label(stereotype.id()),
                element,
                instance
            )));
        }
        if self.applied_stereotypes(instance).contains(&stereotype) {
            return Err(ModelError::stereotype(format!(
                "stereotype '{}' is already applied to {}",
                self.classifier_label(stereotype.id()),
                instance
            )));
        }

        let defaults = self.default_values(stereotype.id());
        if let Some(slots) = self.element_slots_mut(instance) {
            for (owner, name, value) in defaults {
                slots.remove(owner, &name);
                slots.set(owner, &name, value);
            }
        }
        if let Some(list) = self.element_stereotypes_mut(instance) {
            list.push(stereotype);
        }
        if let Some(data) = self
            .classifiers
            .get_mut(&stereotype.id())
            .and_then(|c| c.stereotype_mut())
        {
            data.applied.push(instance);
        }
        debug!(stereotype = %stereotype, instance = %instance, "applied stereotype");
        Ok(())
    }

    /// Remove an applied stereotype and the tagged values only it provided.
    pub fn remove_stereotype(
        &mut self,
        stereotype: StereotypeId,
        instance: impl Into<ElementInstance>,
    ) -> ModelResult<()> {
        let instance = instance.into();
        self.stereotype_data(stereotype)?;
        self.owning_element(instance)?;
        if !self.applied_stereotypes(instance).contains(&stereotype) {
            return Err(ModelError::stereotype(format!(
                "stereotype '{}' is not applied to {}",
                self.classifier_label(stereotype.id()),
                instance
            )));
        }

        self.unapply(stereotype, instance);
        debug!(stereotype = %stereotype, instance = %instance, "removed stereotype");
        Ok(())
    }

    /// Remove one application and the tagged values no remaining
    /// stereotype declares.
    pub(crate) fn unapply(&mut self, stereotype: StereotypeId, instance: ElementInstance) {
        if let Some(list) = self.element_stereotypes_mut(instance) {
            list.retain(|&s| s != stereotype);
        }
        if let Some(data) = self
            .classifiers
            .get_mut(&stereotype.id())
            .and_then(|c| c.stereotype_mut())
        {
            data.applied.retain(|&e| e != instance);
        }

        let remaining: HashSet<ClassifierId> = self
            .legal_stereotype_path(instance)
            .into_iter()
            .map(StereotypeId::id)
            .collect();
        let orphaned: Vec<ClassifierId> = self
            .ancestry(stereotype)
            .into_iter()
            .filter(|owner| !remaining.contains(owner))
            .collect();
        if let Some(slots) = self.element_slots_mut(instance) {
            for owner in orphaned {
                slots.remove_owner(owner);
            }
        }
        trace!(stereotype = %stereotype, instance = %instance, "unapplied stereotype");
    }

    /// Stereotypes applied directly to a class or link.
    pub fn applied_stereotypes(&self, instance: impl Into<ElementInstance>) -> &[StereotypeId] {
        match instance.into() {
            ElementInstance::Class(class) => self
                .classifiers
                .get(&class.id())
                .and_then(|c| c.as_class())
                .map(|data| data.stereotypes.as_slice())
                .unwrap_or_default(),
            ElementInstance::Link(link) => self
                .links
                .get(&link)
                .map(|l| l.stereotypes.as_slice())
                .unwrap_or_default(),
        }
    }

    /// Instances a stereotype is applied to directly.
    pub fn applied_instances(&self, stereotype: StereotypeId) -> &[ElementInstance] {
        self.classifiers
            .get(&stereotype.id())
            .and_then(|c| c.as_stereotype())
            .map(|data| data.applied.as_slice())
            .unwrap_or_default()
    }

    /// Instances a stereotype or any of its subclasses is applied to.
    pub fn all_applied_instances(&self, stereotype: StereotypeId) -> Vec<ElementInstance> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for id in self.ancestry_down(stereotype) {
            if let Some(data) = self.classifiers.get(&id).and_then(|c| c.as_stereotype()) {
                result.extend(data.applied.iter().copied().filter(|e| seen.insert(*e)));
            }
        }
        result
    }

    /// Applied stereotypes of an instance followed by their superclasses,
    /// without duplicates. Tagged value lookups scan this path in order.
    pub fn legal_stereotype_path(&self, instance: impl Into<ElementInstance>) -> Vec<StereotypeId> {
        let mut seen = HashSet::new();
        self.applied_stereotypes(instance)
            .iter()
            .flat_map(|&st| self.ancestry(st))
            .filter(|id| seen.insert(*id))
            .filter_map(|id| self.as_stereotype(id))
            .collect()
    }

    // ==================== Tagged Values ====================

    /// Get a tagged value, resolved on the first stereotype of the legal
    /// path declaring `name`. Unset values read as `Null`.
    pub fn get_tagged_value(
        &self,
        instance: impl Into<ElementInstance>,
        name: &str,
    ) -> ModelResult<Value> {
        let instance = instance.into();
        let owner = self.resolve_tag_owner(instance, name)?;
        Ok(self.read_tag(instance, owner, name))
    }

    /// Set a tagged value, resolved like [`Model::get_tagged_value`].
    pub fn set_tagged_value(
        &mut self,
        instance: impl Into<ElementInstance>,
        name: &str,
        value: impl Into<Value>,
    ) -> ModelResult<()> {
        let instance = instance.into();
        let owner = self.resolve_tag_owner(instance, name)?;
        self.store_tag(instance, owner, name, value.into())
    }

    /// Get the tagged value `name` declared by `stereotype`.
    pub fn get_tagged_value_for(
        &self,
        instance: impl Into<ElementInstance>,
        stereotype: StereotypeId,
        name: &str,
    ) -> ModelResult<Value> {
        let instance = instance.into();
        self.check_tag_owner(instance, stereotype, name)?;
        Ok(self.read_tag(instance, stereotype, name))
    }

    /// Set the tagged value `name` declared by `stereotype`.
    pub fn set_tagged_value_for(
        &mut self,
        instance: impl Into<ElementInstance>,
        stereotype: StereotypeId,
        name: &str,
        value: impl Into<Value>,
    ) -> ModelResult<()> {
        let instance = instance.into();
        self.check_tag_owner(instance, stereotype, name)?;
        self.store_tag(instance, stereotype, name, value.into())
    }

    /// Remove a tagged value. Fails if no value is present.
    pub fn delete_tagged_value(
        &mut self,
        instance: impl Into<ElementInstance>,
        name: &str,
    ) -> ModelResult<()> {
        let instance = instance.into();
        let owner = self.resolve_tag_owner(instance, name)?;
        let removed = self
            .element_slots_mut(instance)
            .and_then(|slots| slots.remove(owner.id(), name));
        if removed.is_none() {
            return Err(ModelError::stereotype(format!(
                "{} has no tagged value '{}'",
                instance, name
            )));
        }
        Ok(())
    }

    /// Push a stereotype default onto every current application of the
    /// stereotype and its subclasses, following the tagged default policy.
    pub(crate) fn propagate_tagged_default(
        &mut self,
        stereotype: StereotypeId,
        name: &str,
        value: &Value,
    ) {
        let policy = self.config.tagged_default_policy;
        let owner = stereotype.id();
        for instance in self.all_applied_instances(stereotype) {
            if let Some(slots) = self.element_slots_mut(instance) {
                let keep = policy == TaggedDefaultPolicy::PreserveExplicit
                    && slots.is_explicit(owner, name);
                if !keep {
                    slots.set(owner, name, value.clone());
                }
            }
        }
        trace!(stereotype = %stereotype, attribute = %name, ?policy, "propagated tagged default");
    }

    fn resolve_tag_owner(
        &self,
        instance: ElementInstance,
        name: &str,
    ) -> ModelResult<StereotypeId> {
        self.owning_element(instance)?;
        self.legal_stereotype_path(instance)
            .into_iter()
            .find(|&st| self.attribute(st, name).is_some())
            .ok_or_else(|| {
                ModelError::stereotype(format!(
                    "no stereotype applied to {} declares '{}'",
                    instance, name
                ))
            })
    }

    fn check_tag_owner(
        &self,
        instance: ElementInstance,
        stereotype: StereotypeId,
        name: &str,
    ) -> ModelResult<()> {
        self.owning_element(instance)?;
        if !self.legal_stereotype_path(instance).contains(&stereotype) {
            return Err(ModelError::stereotype(format!(
                "stereotype '{}' is not on the stereotype path of {}",
                self.classifier_label(stereotype.id()),
                instance
            )));
        }
        self.declared_attribute(stereotype.id(), name)?;
        Ok(())
    }

    fn store_tag(
        &mut self,
        instance: ElementInstance,
        stereotype: StereotypeId,
        name: &str,
        value: Value,
    ) -> ModelResult<()> {
        let attribute = self.declared_attribute(stereotype.id(), name)?;
        self.check_value(attribute, &value)?;
        if let Some(slots) = self.element_slots_mut(instance) {
            slots.set_explicit(stereotype.id(), name, value);
        }
        trace!(
            instance = %instance,
            stereotype = %stereotype,
            attribute = %name,
            "set tagged value"
        );
        Ok(())
    }

    fn read_tag(&self, instance: ElementInstance, stereotype: StereotypeId, name: &str) -> Value {
        self.element_slots(instance)
            .and_then(|slots| slots.get(stereotype.id(), name))
            .cloned()
            .unwrap_or(Value::Null)
    }

    // ==================== Element Plumbing ====================

    /// The element whose extensions govern an instance: the metaclass of
    /// a class, the association of a link.
    pub(crate) fn owning_element(&self, instance: ElementInstance) -> ModelResult<ExtendedElement> {
        match instance {
            ElementInstance::Class(class) => {
                Ok(ExtendedElement::Metaclass(self.class_data(class)?.metaclass))
            }
            ElementInstance::Link(link) => {
                Ok(ExtendedElement::Association(self.link_ref(link)?.association))
            }
        }
    }

    fn element_slots(&self, instance: ElementInstance) -> Option<&Slots> {
        match instance {
            ElementInstance::Class(class) => {
                let object = self.class_object(class)?;
                self.objects.get(&object).map(|o| &o.slots)
            }
            ElementInstance::Link(link) => self.links.get(&link).map(|l| &l.slots),
        }
    }

    fn element_slots_mut(&mut self, instance: ElementInstance) -> Option<&mut Slots> {
        match instance {
            ElementInstance::Class(class) => {
                let object = self.class_object(class)?;
                self.objects.get_mut(&object).map(|o| &mut o.slots)
            }
            ElementInstance::Link(link) => self.links.get_mut(&link).map(|l| &mut l.slots),
        }
    }

    fn element_stereotypes_mut(
        &mut self,
        instance: ElementInstance,
    ) -> Option<&mut Vec<StereotypeId>> {
        match instance {
            ElementInstance::Class(class) => self
                .classifiers
                .get_mut(&class.id())
                .and_then(|c| c.class_mut())
                .map(|data| &mut data.stereotypes),
            ElementInstance::Link(link) => self.links.get_mut(&link).map(|l| &mut l.stereotypes),
        }
    }

    /// A classifier followed by all its subclasses.
    fn ancestry_down(&self, id: impl Into<ClassifierId>) -> Vec<ClassifierId> {
        let id = id.into();
        let mut result = vec![id];
        result.extend(self.all_subclasses(id));
        result
    }
}
