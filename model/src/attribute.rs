//! Attribute declarations, defaults and instance values.

use crate::handle::Instance;
use crate::model::Model;
use reflex_core::{
    AttrType, Attribute, ClassifierId, EnumId, ModelError, ModelResult, ObjectId, Value,
};
use tracing::{debug, trace};

impl Model {
    // ==================== Declarations ====================

    /// Declare an attribute on a classifier.
    ///
    /// Declaring an attribute with a default on a stereotype propagates the
    /// default to the stereotype's current applications.
    pub fn add_attribute(
        &mut self,
        classifier: impl Into<ClassifierId>,
        attribute: Attribute,
    ) -> ModelResult<()> {
        let id = classifier.into();
        let owner = self.classifier_ref(id)?;
        if attribute.name.trim().is_empty() {
            return Err(ModelError::Identifier(
                "attribute name must not be empty".to_string(),
            ));
        }
        if owner.has_attr(&attribute.name) {
            return Err(ModelError::Identifier(format!(
                "attribute '{}' is already declared on '{}'",
                attribute.name, owner.name
            )));
        }
        match attribute.ty {
            AttrType::Object(target) => {
                self.classifier_ref(target)?;
            }
            AttrType::Enum(enumeration) => {
                self.enum_ref(enumeration)?;
            }
            _ => {}
        }

        let mut attribute = attribute;
        if attribute.default.as_ref().is_some_and(Value::is_null) {
            attribute.default = None;
        }
        if let Some(default) = &attribute.default {
            self.check_value(&attribute, default)?;
        }

        let name = attribute.name.clone();
        let default = attribute.default.clone();
        debug!(classifier = %id, attribute = %name, ty = %attribute.ty, "declared attribute");
        self.classifier_mut(id)?.attributes.push(attribute);

        if let (Some(stereotype), Some(default)) = (self.as_stereotype(id), default) {
            self.propagate_tagged_default(stereotype, &name, &default);
        }
        Ok(())
    }

    /// Declare an attribute whose type is inferred from its default value.
    ///
    /// An object reference infers the referenced object's classifier.
    pub fn add_attribute_with_default(
        &mut self,
        classifier: impl Into<ClassifierId>,
        name: &str,
        default: impl Into<Value>,
    ) -> ModelResult<()> {
        let default = default.into();
        let ty = match &default {
            Value::Object(object) => AttrType::Object(self.object_ref(*object)?.classifier),
            other => AttrType::infer(other).ok_or_else(|| {
                ModelError::type_error(format!(
                    "cannot infer the type of attribute '{}' from a null default",
                    name
                ))
            })?,
        };
        self.add_attribute(classifier, Attribute::new(name, ty).with_default(default))
    }

    /// Declare an attribute referencing objects of `target`.
    pub fn add_object_attribute(
        &mut self,
        classifier: impl Into<ClassifierId>,
        name: &str,
        target: impl Into<ClassifierId>,
    ) -> ModelResult<()> {
        self.add_attribute(classifier, Attribute::new(name, AttrType::Object(target.into())))
    }

    /// Declare an attribute holding literals of an enumeration.
    pub fn add_enum_attribute(
        &mut self,
        classifier: impl Into<ClassifierId>,
        name: &str,
        enumeration: EnumId,
        default: Option<&str>,
    ) -> ModelResult<()> {
        let mut attribute = Attribute::new(name, AttrType::Enum(enumeration));
        if let Some(literal) = default {
            attribute = attribute.with_default(Value::from(literal));
        }
        self.add_attribute(classifier, attribute)
    }

    /// Change the default of a declared attribute. `Null` clears it.
    ///
    /// Existing instances keep their values, except stereotype applications,
    /// which follow the model's tagged default policy.
    pub fn set_attribute_default(
        &mut self,
        classifier: impl Into<ClassifierId>,
        name: &str,
        default: impl Into<Value>,
    ) -> ModelResult<()> {
        let id = classifier.into();
        let default = default.into();
        let attribute = self.declared_attribute(id, name)?;
        self.check_value(attribute, &default)?;

        let stored = (!default.is_null()).then(|| default.clone());
        if let Some(attribute) = self.classifier_mut(id)?.get_attr_mut(name) {
            attribute.default = stored;
        }
        debug!(classifier = %id, attribute = %name, "changed attribute default");

        if let Some(stereotype) = self.as_stereotype(id).filter(|_| !default.is_null()) {
            self.propagate_tagged_default(stereotype, name, &default);
        }
        Ok(())
    }

    /// Remove an attribute declaration and every value stored for it.
    pub fn delete_attribute(
        &mut self,
        classifier: impl Into<ClassifierId>,
        name: &str,
    ) -> ModelResult<()> {
        let id = classifier.into();
        self.declared_attribute(id, name)?;
        self.classifier_mut(id)?.attributes.retain(|a| a.name != name);

        for object in self.objects.values_mut() {
            object.slots.remove(id, name);
        }
        for link in self.links.values_mut() {
            link.slots.remove(id, name);
        }
        debug!(classifier = %id, attribute = %name, "deleted attribute");
        Ok(())
    }

    // ==================== Attribute Queries ====================

    /// Attribute declared directly on a classifier.
    pub fn attribute(&self, classifier: impl Into<ClassifierId>, name: &str) -> Option<&Attribute> {
        let id: ClassifierId = classifier.into();
        self.classifiers.get(&id)?.get_attr(name)
    }

    /// Attributes declared directly on a classifier, in declaration order.
    pub fn attributes(&self, classifier: impl Into<ClassifierId>) -> &[Attribute] {
        let id: ClassifierId = classifier.into();
        self.classifiers
            .get(&id)
            .map(|c| c.attributes.as_slice())
            .unwrap_or_default()
    }

    /// Attributes of a classifier and all its superclasses, with the
    /// declaring classifier of each.
    pub fn all_attributes(
        &self,
        classifier: impl Into<ClassifierId>,
    ) -> Vec<(ClassifierId, &Attribute)> {
        self.ancestry(classifier)
            .into_iter()
            .filter_map(|id| self.classifiers.get(&id))
            .flat_map(|c| c.attributes.iter().map(move |a| (c.id, a)))
            .collect()
    }

    /// The most specific declaration of `name` visible from `classifier`.
    pub fn find_attribute(
        &self,
        classifier: impl Into<ClassifierId>,
        name: &str,
    ) -> Option<(ClassifierId, &Attribute)> {
        self.ancestry(classifier).into_iter().find_map(|id| {
            let attribute = self.classifiers.get(&id)?.get_attr(name)?;
            Some((id, attribute))
        })
    }

    /// Default values of a classifier and its superclasses, keyed by
    /// declaring classifier.
    pub(crate) fn default_values(
        &self,
        classifier: ClassifierId,
    ) -> Vec<(ClassifierId, String, Value)> {
        self.all_attributes(classifier)
            .into_iter()
            .filter_map(|(owner, attr)| {
                let default = attr.default.clone()?;
                Some((owner, attr.name.clone(), default))
            })
            .collect()
    }

    pub(crate) fn declared_attribute(
        &self,
        classifier: ClassifierId,
        name: &str,
    ) -> ModelResult<&Attribute> {
        let owner = self.classifier_ref(classifier)?;
        owner.get_attr(name).ok_or_else(|| {
            ModelError::Identifier(format!(
                "attribute '{}' is not declared on '{}'",
                name, owner.name
            ))
        })
    }

    /// Check a value against an attribute's declared type.
    ///
    /// `Null` is accepted for every type. Object references must point at a
    /// direct instance of the declared classifier; a class's embedded object
    /// is a direct instance of its metaclass.
    pub(crate) fn check_value(&self, attribute: &Attribute, value: &Value) -> ModelResult<()> {
        if value.is_null() {
            return Ok(());
        }
        match attribute.ty {
            AttrType::Object(expected) => {
                let Some(object) = value.as_object() else {
                    return Err(ModelError::type_mismatch(
                        &attribute.name,
                        self.classifier_label(expected),
                        value.type_name(),
                    ));
                };
                let actual = self.object_ref(object)?.classifier;
                if actual != expected {
                    return Err(ModelError::type_mismatch(
                        &attribute.name,
                        self.classifier_label(expected),
                        self.classifier_label(actual),
                    ));
                }
                Ok(())
            }
            AttrType::Enum(id) => {
                let enumeration = self.enum_ref(id)?;
                match value.as_str() {
                    Some(literal) if enumeration.contains(literal) => Ok(()),
                    Some(literal) => Err(ModelError::type_error(format!(
                        "'{}' is not a literal of enumeration '{}' (attribute '{}')",
                        literal, enumeration.name, attribute.name
                    ))),
                    None => Err(ModelError::type_mismatch(
                        &attribute.name,
                        &enumeration.name,
                        value.type_name(),
                    )),
                }
            }
            ty if ty.matches_primitive(value) => Ok(()),
            ty => Err(ModelError::type_mismatch(&attribute.name, ty, value.type_name())),
        }
    }

    // ==================== Instance Values ====================

    /// Set an attribute value on an object or class.
    ///
    /// The attribute is resolved on the instance's classifier and its
    /// superclasses; the most specific declaration wins.
    pub fn set_value(
        &mut self,
        instance: impl Into<Instance>,
        name: &str,
        value: impl Into<Value>,
    ) -> ModelResult<()> {
        let object = self.resolve_instance(instance.into())?;
        let owner = self.resolve_slot_owner(object, name)?;
        self.store_value(object, owner, name, value.into())
    }

    /// Get an attribute value. Unset attributes read as `Null`.
    pub fn get_value(&self, instance: impl Into<Instance>, name: &str) -> ModelResult<Value> {
        let object = self.resolve_instance(instance.into())?;
        let owner = self.resolve_slot_owner(object, name)?;
        Ok(self.read_slot(object, owner, name))
    }

    /// Set the value of the attribute `name` declared by `classifier`,
    /// which must be the instance's classifier or one of its superclasses.
    pub fn set_value_for(
        &mut self,
        instance: impl Into<Instance>,
        classifier: impl Into<ClassifierId>,
        name: &str,
        value: impl Into<Value>,
    ) -> ModelResult<()> {
        let object = self.resolve_instance(instance.into())?;
        let owner = classifier.into();
        self.check_qualified_owner(object, owner, name)?;
        self.store_value(object, owner, name, value.into())
    }

    /// Get the value of the attribute `name` declared by `classifier`.
    pub fn get_value_for(
        &self,
        instance: impl Into<Instance>,
        classifier: impl Into<ClassifierId>,
        name: &str,
    ) -> ModelResult<Value> {
        let object = self.resolve_instance(instance.into())?;
        let owner = classifier.into();
        self.check_qualified_owner(object, owner, name)?;
        Ok(self.read_slot(object, owner, name))
    }

    /// Reset an attribute to `Null`.
    pub fn clear_value(&mut self, instance: impl Into<Instance>, name: &str) -> ModelResult<()> {
        self.set_value(instance, name, Value::Null)
    }

    fn resolve_slot_owner(&self, object: ObjectId, name: &str) -> ModelResult<ClassifierId> {
        let classifier = self.object_ref(object)?.classifier;
        self.find_attribute(classifier, name)
            .map(|(owner, _)| owner)
            .ok_or_else(|| {
                ModelError::Identifier(format!(
                    "attribute '{}' is not declared on '{}' or its superclasses",
                    name,
                    self.classifier_label(classifier)
                ))
            })
    }

    fn check_qualified_owner(
        &self,
        object: ObjectId,
        owner: ClassifierId,
        name: &str,
    ) -> ModelResult<()> {
        let classifier = self.object_ref(object)?.classifier;
        self.declared_attribute(owner, name)?;
        if !self.ancestry(classifier).contains(&owner) {
            return Err(ModelError::structure(format!(
                "'{}' is not '{}' or one of its superclasses",
                self.classifier_label(owner),
                self.classifier_label(classifier)
            )));
        }
        Ok(())
    }

    fn store_value(
        &mut self,
        object: ObjectId,
        owner: ClassifierId,
        name: &str,
        value: Value,
    ) -> ModelResult<()> {
        let attribute = self.declared_attribute(owner, name)?;
        self.check_value(attribute, &value)?;
        trace!(object = %object, classifier = %owner, attribute = %name, "set value");
        if let Some(object) = self.objects.get_mut(&object) {
            object.slots.set_explicit(owner, name, value);
        }
        Ok(())
    }

    fn read_slot(&self, object: ObjectId, owner: ClassifierId, name: &str) -> Value {
        self.objects
            .get(&object)
            .and_then(|o| o.slots.get(owner, name))
            .cloned()
            .unwrap_or(Value::Null)
    }
}
