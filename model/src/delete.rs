//! Deletion entry points and their cascades.
//!
//! Every public deletion validates first and then runs an infallible
//! cascade, so a failed deletion leaves the model untouched.

use crate::handle::{
    sealed::Sealed, ClassId, ClassifierHandle, ClassifierKind, ElementInstance, ExtendedElement,
    MetaclassId, StereotypeId,
};
use crate::model::Model;
use reflex_core::{
    AssociationId, AttrType, ClassifierId, EndId, EnumId, ModelError, ModelResult, ObjectId, Value,
};
use std::collections::HashSet;
use tracing::{debug, trace};

impl Model {
    /// Delete a plain object with its links and every reference to it.
    pub fn delete_object(&mut self, object: ObjectId) -> ModelResult<()> {
        if let Some(class) = self.object_ref(object)?.represents {
            return Err(ModelError::structure(format!(
                "object {} is the identity of class '{}'; delete the class instead",
                object,
                self.classifier_label(class.into())
            )));
        }
        self.remove_object(object);
        debug!(object = %object, "deleted object");
        Ok(())
    }

    /// Delete a classifier and everything that depends on it.
    ///
    /// Fails while a classifier outside the deletion declares an object
    /// attribute typed over a classifier being deleted.
    pub fn delete_classifier(&mut self, classifier: impl Into<ClassifierId>) -> ModelResult<()> {
        let id = classifier.into();
        let kind = self.classifier_ref(id)?.kind();

        let mut doomed = HashSet::from([id]);
        if let Some(data) = self.classifiers.get(&id).and_then(|c| c.as_metaclass()) {
            doomed.extend(data.class_instances.iter().map(|&c| ClassifierId::from(c)));
        }
        self.check_unreferenced(&doomed)?;

        match kind {
            ClassifierKind::Metaclass => self.remove_metaclass(MetaclassId::wrap(id)),
            ClassifierKind::Class => self.remove_class(ClassId::wrap(id)),
            ClassifierKind::Stereotype => self.remove_stereotype_classifier(StereotypeId::wrap(id)),
        }
        debug!(classifier = %id, %kind, "deleted classifier");
        Ok(())
    }

    /// Delete an association with its links and ends.
    pub fn delete_association(&mut self, association: AssociationId) -> ModelResult<()> {
        self.association_ref(association)?;
        self.remove_association(association);
        debug!(association = %association, "deleted association");
        Ok(())
    }

    /// Delete an end that was never bound to an association.
    pub fn delete_end(&mut self, end: EndId) -> ModelResult<()> {
        if let Some(association) = self.end_ref(end)?.association {
            return Err(ModelError::structure(format!(
                "end {} is bound to association {}; delete the association instead",
                end, association
            )));
        }
        self.ends.remove(&end);
        Ok(())
    }

    /// Delete an enumeration no attribute is typed over.
    pub fn delete_enum(&mut self, enumeration: EnumId) -> ModelResult<()> {
        let name = self.enum_ref(enumeration)?.name.clone();
        let user = self.classifiers.values().find_map(|c| {
            c.attributes
                .iter()
                .find(|a| a.ty == AttrType::Enum(enumeration))
                .map(|a| (c.name.as_str(), a.name.as_str()))
        });
        if let Some((classifier, attribute)) = user {
            return Err(ModelError::structure(format!(
                "enumeration '{}' is used by attribute '{}' of '{}'",
                name, attribute, classifier
            )));
        }

        self.enums.remove(&enumeration);
        self.enum_names.remove(&name);
        debug!(enumeration = %enumeration, "deleted enumeration");
        Ok(())
    }

    fn check_unreferenced(&self, doomed: &HashSet<ClassifierId>) -> ModelResult<()> {
        for classifier in self.classifiers.values() {
            if doomed.contains(&classifier.id) {
                continue;
            }
            for attribute in &classifier.attributes {
                if let AttrType::Object(target) = attribute.ty {
                    if doomed.contains(&target) {
                        return Err(ModelError::structure(format!(
                            "'{}' is referenced by attribute '{}' of '{}'",
                            self.classifier_label(target),
                            attribute.name,
                            classifier.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    // ==================== Cascades ====================

    fn remove_object(&mut self, object: ObjectId) {
        let links: Vec<_> = self
            .links
            .values()
            .filter(|l| l.involves(object))
            .map(|l| l.id)
            .collect();
        for link in links {
            self.detach_link(link);
        }

        for other in self.objects.values_mut() {
            other.slots.clear_object_refs(object);
        }
        for link in self.links.values_mut() {
            link.slots.clear_object_refs(object);
        }
        for classifier in self.classifiers.values_mut() {
            for attribute in &mut classifier.attributes {
                if attribute.default == Some(Value::Object(object)) {
                    attribute.default = None;
                }
            }
        }

        let Some(removed) = self.objects.remove(&object) else {
            return;
        };
        if let Some(data) = self
            .classifiers
            .get_mut(&removed.classifier)
            .and_then(|c| c.class_mut())
        {
            data.instances.retain(|&o| o != object);
        }
        if !removed.is_class_object() && self.object_names.get(&removed.name) == Some(&object) {
            self.object_names.remove(&removed.name);
        }
        trace!(object = %object, "removed object");
    }

    fn remove_class(&mut self, class: ClassId) {
        let Some(data) = self.classifiers.get(&class.id()).and_then(|c| c.as_class()) else {
            return;
        };
        let (instances, stereotypes, object, metaclass) = (
            data.instances.clone(),
            data.stereotypes.clone(),
            data.object,
            data.metaclass,
        );

        for instance in instances {
            self.remove_object(instance);
        }
        for stereotype in stereotypes {
            self.unapply(stereotype, ElementInstance::Class(class));
        }
        self.remove_object(object);
        if let Some(data) = self
            .classifiers
            .get_mut(&metaclass.id())
            .and_then(|c| c.metaclass_mut())
        {
            data.class_instances.retain(|&c| c != class);
        }
        self.cleanup_classifier(class.into());
    }

    fn remove_metaclass(&mut self, metaclass: MetaclassId) {
        let Some(data) = self
            .classifiers
            .get(&metaclass.id())
            .and_then(|c| c.as_metaclass())
        else {
            return;
        };
        let (classes, stereotypes) = (data.class_instances.clone(), data.stereotypes.clone());

        for class in classes {
            self.remove_class(class);
        }
        for stereotype in stereotypes {
            self.unlink_extension(stereotype, ExtendedElement::Metaclass(metaclass));
        }
        self.cleanup_classifier(metaclass.into());
        self.prune_all_applications();
    }

    fn remove_stereotype_classifier(&mut self, stereotype: StereotypeId) {
        let Some(data) = self
            .classifiers
            .get(&stereotype.id())
            .and_then(|c| c.as_stereotype())
        else {
            return;
        };
        let (applied, extended) = (data.applied.clone(), data.extended.clone());

        for instance in applied {
            self.unapply(stereotype, instance);
        }
        for element in extended {
            self.unlink_extension(stereotype, element);
        }
        self.cleanup_classifier(stereotype.into());
        self.prune_all_applications();
    }

    /// Shared tail of every classifier deletion.
    fn cleanup_classifier(&mut self, id: ClassifierId) {
        for association in self.associations_of(id) {
            self.remove_association(association);
        }
        self.ends
            .retain(|_, end| end.association.is_some() || end.classifier != id);

        let (superclasses, subclasses) = match self.classifiers.get(&id) {
            Some(c) => (c.superclasses.clone(), c.subclasses.clone()),
            None => return,
        };
        for sup in superclasses {
            self.unlink_hierarchy_edge(id, sup);
        }
        for sub in subclasses {
            self.unlink_hierarchy_edge(sub, id);
        }

        for object in self.objects.values_mut() {
            object.slots.remove_owner(id);
        }
        for link in self.links.values_mut() {
            link.slots.remove_owner(id);
        }

        if let Some(removed) = self.classifiers.remove(&id) {
            if self.classifier_names.get(&removed.name) == Some(&id) {
                self.classifier_names.remove(&removed.name);
            }
        }
        trace!(classifier = %id, "removed classifier");
    }

    fn remove_association(&mut self, association: AssociationId) {
        let Some(assoc) = self.associations.get(&association) else {
            return;
        };
        let (links, stereotypes, ends) = (
            assoc.links.clone(),
            assoc.stereotypes.clone(),
            [assoc.end1, assoc.end2],
        );

        for link in links {
            self.detach_link(link);
        }
        for stereotype in stereotypes {
            self.unlink_extension(stereotype, ExtendedElement::Association(association));
        }
        for end in ends {
            let Some(end) = self.ends.remove(&end) else {
                continue;
            };
            if let Some(classifier) = self.classifiers.get_mut(&end.classifier) {
                classifier.associations.retain(|&a| a != association);
            }
        }
        self.associations.remove(&association);
        trace!(association = %association, "removed association");
    }

    /// Re-check the extension rule for every application in the model.
    pub(crate) fn prune_all_applications(&mut self) {
        let roots: Vec<StereotypeId> = self
            .classifiers
            .values()
            .filter(|c| c.kind() == ClassifierKind::Stereotype)
            .map(|c| StereotypeId::wrap(c.id))
            .collect();
        for stereotype in roots {
            self.prune_applications(stereotype);
        }
    }
}
