//! Generalization graph: superclass/subclass edges and transitive queries.

use crate::handle::ClassifierHandle;
use crate::model::Model;
use reflex_core::{ClassifierId, ModelError, ModelResult};
use std::collections::HashSet;
use tracing::debug;

impl Model {
    /// Direct superclasses, in insertion order.
    pub fn superclasses(&self, id: impl Into<ClassifierId>) -> &[ClassifierId] {
        let id: ClassifierId = id.into();
        self.classifiers
            .get(&id)
            .map(|c| c.superclasses.as_slice())
            .unwrap_or_default()
    }

    /// Direct subclasses, in insertion order.
    pub fn subclasses(&self, id: impl Into<ClassifierId>) -> &[ClassifierId] {
        let id: ClassifierId = id.into();
        self.classifiers
            .get(&id)
            .map(|c| c.subclasses.as_slice())
            .unwrap_or_default()
    }

    /// All transitive superclasses, depth-first, without duplicates.
    /// The classifier itself is not included.
    pub fn all_superclasses(&self, id: impl Into<ClassifierId>) -> Vec<ClassifierId> {
        let id = id.into();
        let mut result = Vec::new();
        let mut visited = HashSet::from([id]);
        self.collect_closure(id, &mut result, &mut visited, |c| &c.superclasses);
        result
    }

    /// All transitive subclasses, depth-first, without duplicates.
    /// The classifier itself is not included.
    pub fn all_subclasses(&self, id: impl Into<ClassifierId>) -> Vec<ClassifierId> {
        let id = id.into();
        let mut result = Vec::new();
        let mut visited = HashSet::from([id]);
        self.collect_closure(id, &mut result, &mut visited, |c| &c.subclasses);
        result
    }

    /// The classifier followed by all its superclasses.
    pub fn ancestry(&self, id: impl Into<ClassifierId>) -> Vec<ClassifierId> {
        let id = id.into();
        let mut result = vec![id];
        result.extend(self.all_superclasses(id));
        result
    }

    /// Check if `superclass` is a direct or transitive superclass of `id`.
    pub fn has_superclass(
        &self,
        id: impl Into<ClassifierId>,
        superclass: impl Into<ClassifierId>,
    ) -> bool {
        self.all_superclasses(id).contains(&superclass.into())
    }

    /// Check if `subclass` is a direct or transitive subclass of `id`.
    pub fn has_subclass(
        &self,
        id: impl Into<ClassifierId>,
        subclass: impl Into<ClassifierId>,
    ) -> bool {
        self.all_subclasses(id).contains(&subclass.into())
    }

    /// Helper to walk one direction of the hierarchy.
    fn collect_closure(
        &self,
        id: ClassifierId,
        result: &mut Vec<ClassifierId>,
        visited: &mut HashSet<ClassifierId>,
        next: fn(&crate::entity::Classifier) -> &Vec<ClassifierId>,
    ) {
        let Some(classifier) = self.classifiers.get(&id) else {
            return;
        };
        for &other in next(classifier) {
            if visited.insert(other) {
                result.push(other);
                self.collect_closure(other, result, visited, next);
            }
        }
    }

    /// Add `superclass` as a direct superclass of `subclass`.
    ///
    /// Both handles have the same kind, so a class can only specialize a
    /// class, a metaclass a metaclass and a stereotype a stereotype.
    pub fn add_superclass<H: ClassifierHandle>(
        &mut self,
        subclass: H,
        superclass: H,
    ) -> ModelResult<()> {
        let (sub, sup) = (subclass.id(), superclass.id());
        let sub_classifier = self.classifier_ref(sub)?;
        let sup_classifier = self.classifier_ref(sup)?;

        if sub == sup {
            return Err(ModelError::structure(format!(
                "{} '{}' cannot be its own superclass",
                H::KIND,
                sub_classifier.name
            )));
        }
        if sub_classifier.superclasses.contains(&sup) {
            return Err(ModelError::structure(format!(
                "'{}' is already a superclass of '{}'",
                sup_classifier.name, sub_classifier.name
            )));
        }
        if sup_classifier.subclasses.contains(&sub) {
            return Err(ModelError::structure(format!(
                "'{}' is already a subclass of '{}'",
                sub_classifier.name, sup_classifier.name
            )));
        }
        if self.config.reject_hierarchy_cycles && self.has_superclass(sup, sub) {
            return Err(ModelError::structure(format!(
                "adding '{}' as superclass of '{}' would create a cycle",
                sup_classifier.name, sub_classifier.name
            )));
        }

        self.classifier_mut(sub)?.superclasses.push(sup);
        self.classifier_mut(sup)?.subclasses.push(sub);
        debug!(subclass = %sub, superclass = %sup, "added superclass");
        Ok(())
    }

    /// Remove the direct edge between `subclass` and `superclass`.
    pub fn delete_superclass<H: ClassifierHandle>(
        &mut self,
        subclass: H,
        superclass: H,
    ) -> ModelResult<()> {
        let (sub, sup) = (subclass.id(), superclass.id());
        let sub_classifier = self.classifier_ref(sub)?;
        let sup_classifier = self.classifier_ref(sup)?;
        if !sub_classifier.superclasses.contains(&sup) {
            return Err(ModelError::structure(format!(
                "'{}' is not a superclass of '{}'",
                sup_classifier.name, sub_classifier.name
            )));
        }

        self.unlink_hierarchy_edge(sub, sup);
        debug!(subclass = %sub, superclass = %sup, "deleted superclass");
        Ok(())
    }

    /// Remove both directions of one edge. Missing sides are ignored.
    pub(crate) fn unlink_hierarchy_edge(&mut self, sub: ClassifierId, sup: ClassifierId) {
        if let Some(c) = self.classifiers.get_mut(&sub) {
            c.superclasses.retain(|&s| s != sup);
        }
        if let Some(c) = self.classifiers.get_mut(&sup) {
            c.subclasses.retain(|&s| s != sub);
        }
    }
}
