//! Instantiation queries: objects of classes, classes of metaclasses.

use crate::handle::{ClassId, ClassifierHandle, Instance, MetaclassId};
use crate::model::Model;
use reflex_core::{ClassifierId, ModelResult, ObjectId};

impl Model {
    /// The embedded object identity of a class.
    pub fn class_object(&self, class: ClassId) -> Option<ObjectId> {
        self.classifiers.get(&class.id())?.as_class().map(|c| c.object)
    }

    /// The class whose identity an object is, if any.
    pub fn represented_class(&self, object: ObjectId) -> Option<ClassId> {
        self.objects.get(&object)?.represents
    }

    /// Direct classifier of an object: its class, or the metaclass for a
    /// class's embedded object.
    pub fn class_of(&self, object: ObjectId) -> Option<ClassifierId> {
        self.objects.get(&object).map(|o| o.classifier)
    }

    /// The metaclass a class instantiates.
    pub fn metaclass_of(&self, class: ClassId) -> Option<MetaclassId> {
        self.classifiers.get(&class.id())?.as_class().map(|c| c.metaclass)
    }

    /// Direct instances of a class, in creation order.
    pub fn instances(&self, class: ClassId) -> &[ObjectId] {
        self.classifiers
            .get(&class.id())
            .and_then(|c| c.as_class())
            .map(|c| c.instances.as_slice())
            .unwrap_or_default()
    }

    /// Direct instances of a class and of all its subclasses.
    pub fn all_instances(&self, class: ClassId) -> Vec<ObjectId> {
        let mut result = self.instances(class).to_vec();
        for sub in self.all_subclasses(class) {
            if let Some(data) = self.classifiers.get(&sub).and_then(|c| c.as_class()) {
                result.extend(data.instances.iter().copied());
            }
        }
        result
    }

    /// Classes instantiating a metaclass directly, in creation order.
    pub fn class_instances(&self, metaclass: MetaclassId) -> &[ClassId] {
        self.classifiers
            .get(&metaclass.id())
            .and_then(|c| c.as_metaclass())
            .map(|m| m.class_instances.as_slice())
            .unwrap_or_default()
    }

    /// Classes instantiating a metaclass or any of its subclasses.
    pub fn all_class_instances(&self, metaclass: MetaclassId) -> Vec<ClassId> {
        let mut result = self.class_instances(metaclass).to_vec();
        for sub in self.all_subclasses(metaclass) {
            if let Some(data) = self.classifiers.get(&sub).and_then(|c| c.as_metaclass()) {
                result.extend(data.class_instances.iter().copied());
            }
        }
        result
    }

    /// Check if an instance's classifier is `classifier` or one of its
    /// subclasses.
    pub fn instance_of(
        &self,
        instance: impl Into<Instance>,
        classifier: impl Into<ClassifierId>,
    ) -> bool {
        let Ok(object) = self.resolve_instance(instance.into()) else {
            return false;
        };
        let target = classifier.into();
        self.objects
            .get(&object)
            .is_some_and(|o| o.classifier == target || self.has_superclass(o.classifier, target))
    }

    /// View an object as an instance, using the class handle for a class's
    /// embedded object.
    pub fn instance(&self, object: ObjectId) -> Option<Instance> {
        let object = self.objects.get(&object)?;
        Some(match object.represents {
            Some(class) => Instance::Class(class),
            None => Instance::Object(object.id),
        })
    }

    /// Object identity behind an instance.
    pub(crate) fn resolve_instance(&self, instance: Instance) -> ModelResult<ObjectId> {
        match instance {
            Instance::Object(id) => {
                self.object_ref(id)?;
                Ok(id)
            }
            Instance::Class(class) => Ok(self.class_data(class)?.object),
        }
    }
}
