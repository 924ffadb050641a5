//! Associations, their ends, and the links realizing them.

use crate::entity::{Association, AssociationEnd, AssociationKind, Link};
use crate::handle::{ClassifierKind, ElementInstance, Instance};
use crate::model::Model;
use reflex_core::{
    AssociationId, ClassifierId, EndId, LinkId, ModelError, ModelResult, Multiplicity, ObjectId,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// An association entered through one of its ends.
#[derive(Debug, Clone, Copy)]
struct Navigation {
    association: AssociationId,
    source: EndId,
    target_is_end1: bool,
}

impl Navigation {
    /// Order a (from, to) pair as (object1, object2).
    fn orient(&self, from: ObjectId, to: ObjectId) -> (ObjectId, ObjectId) {
        if self.target_is_end1 {
            (to, from)
        } else {
            (from, to)
        }
    }

    /// The object sitting at the source end of a link.
    fn source_of(&self, link: &Link) -> ObjectId {
        if self.target_is_end1 {
            link.object2
        } else {
            link.object1
        }
    }

    /// The object sitting at the target end of a link.
    fn target_of(&self, link: &Link) -> ObjectId {
        if self.target_is_end1 {
            link.object1
        } else {
            link.object2
        }
    }
}

impl Model {
    // ==================== Ends ====================

    /// Create a dangling end typed over `classifier`.
    pub fn create_end(
        &mut self,
        classifier: impl Into<ClassifierId>,
        role: &str,
        multiplicity: Multiplicity,
        navigable: bool,
    ) -> ModelResult<EndId> {
        let classifier = classifier.into();
        self.classifier_ref(classifier)?;
        check_role(role)?;

        let id = self.ids.alloc_end_id();
        self.ends.insert(
            id,
            AssociationEnd {
                id,
                role: role.to_string(),
                multiplicity,
                navigable,
                classifier,
                association: None,
            },
        );
        trace!(end = %id, classifier = %classifier, role = %role, "created association end");
        Ok(id)
    }

    pub fn set_navigable(&mut self, end: EndId, navigable: bool) -> ModelResult<()> {
        self.end_ref(end)?;
        if let Some(end) = self.ends.get_mut(&end) {
            end.navigable = navigable;
        }
        Ok(())
    }

    pub fn set_role(&mut self, end: EndId, role: &str) -> ModelResult<()> {
        self.end_ref(end)?;
        check_role(role)?;
        if let Some(end) = self.ends.get_mut(&end) {
            end.role = role.to_string();
        }
        Ok(())
    }

    /// Change an end's multiplicity.
    ///
    /// Fails if an existing object already has more links at this end than
    /// the new upper bound allows.
    pub fn set_multiplicity(&mut self, end: EndId, multiplicity: Multiplicity) -> ModelResult<()> {
        let current = self.end_ref(end)?;
        if let Some(association) = current.association {
            let nav = self.navigate(association, end)?;
            let assoc = self.association_ref(association)?;
            let mut counts: HashMap<ObjectId, usize> = HashMap::new();
            for link in assoc.links.iter().filter_map(|id| self.links.get(id)) {
                *counts.entry(nav.source_of(link)).or_default() += 1;
            }
            if let Some((object, count)) = counts
                .into_iter()
                .find(|(_, count)| multiplicity.exceeds_upper(*count))
            {
                return Err(ModelError::multiplicity(format!(
                    "object {} already has {} '{}' links, more than {}",
                    object, count, current.role, multiplicity
                )));
            }
        }
        if let Some(end) = self.ends.get_mut(&end) {
            end.multiplicity = multiplicity;
        }
        Ok(())
    }

    // ==================== Associations ====================

    /// Create a plain association binding two dangling ends.
    pub fn create_association(
        &mut self,
        name: Option<&str>,
        end1: EndId,
        end2: EndId,
    ) -> ModelResult<AssociationId> {
        self.bind_association(name, end1, end2, AssociationKind::Plain)
    }

    /// Create an aggregation; `end1` is the aggregating end.
    pub fn create_aggregation(
        &mut self,
        name: Option<&str>,
        end1: EndId,
        end2: EndId,
    ) -> ModelResult<AssociationId> {
        self.bind_association(name, end1, end2, AssociationKind::Aggregation)
    }

    /// Create a composition; `end1` is the composing end.
    pub fn create_composition(
        &mut self,
        name: Option<&str>,
        end1: EndId,
        end2: EndId,
    ) -> ModelResult<AssociationId> {
        self.bind_association(name, end1, end2, AssociationKind::Composition)
    }

    fn bind_association(
        &mut self,
        name: Option<&str>,
        end1: EndId,
        end2: EndId,
        kind: AssociationKind,
    ) -> ModelResult<AssociationId> {
        if end1 == end2 {
            return Err(ModelError::structure(format!(
                "association needs two distinct ends, got {} twice",
                end1
            )));
        }
        if name.is_some_and(|n| n.trim().is_empty()) {
            return Err(ModelError::Identifier(
                "association name must not be empty".to_string(),
            ));
        }
        let (first, second) = (self.end_ref(end1)?, self.end_ref(end2)?);
        for end in [first, second] {
            if let Some(bound) = end.association {
                return Err(ModelError::structure(format!(
                    "end '{}' is already bound to association {}",
                    end.role, bound
                )));
            }
        }
        let (c1, c2) = (first.classifier, second.classifier);
        let kind1 = self.classifier_ref(c1)?.kind();
        let kind2 = self.classifier_ref(c2)?.kind();
        let class1 = kind1 == ClassifierKind::Class;
        let class2 = kind2 == ClassifierKind::Class;
        if class1 != class2 {
            return Err(ModelError::structure(format!(
                "cannot associate {} '{}' with {} '{}'",
                kind1,
                self.classifier_label(c1),
                kind2,
                self.classifier_label(c2)
            )));
        }

        let id = self.ids.alloc_association_id();
        for end in [end1, end2] {
            if let Some(end) = self.ends.get_mut(&end) {
                end.association = Some(id);
            }
        }
        for classifier in [c1, c2] {
            self.classifier_mut(classifier)?.associations.push(id);
        }
        self.associations.insert(
            id,
            Association {
                id,
                name: name.map(str::to_string),
                end1,
                end2,
                kind,
                links: Vec::new(),
                stereotypes: Vec::new(),
            },
        );
        debug!(association = %id, ?kind, end1 = %end1, end2 = %end2, "created association");
        Ok(id)
    }

    // ==================== Association Queries ====================

    /// The other end of an association.
    pub fn opposite_end(&self, association: AssociationId, end: EndId) -> Option<EndId> {
        self.associations.get(&association)?.opposite(end)
    }

    /// The end of an association with the given role.
    pub fn end_by_role(&self, association: AssociationId, role: &str) -> Option<EndId> {
        let assoc = self.associations.get(&association)?;
        [assoc.end1, assoc.end2]
            .into_iter()
            .find(|end| self.ends.get(end).is_some_and(|e| e.role == role))
    }

    /// Associations a classifier is an end type of, without duplicates.
    pub fn associations_of(&self, classifier: impl Into<ClassifierId>) -> Vec<AssociationId> {
        let id: ClassifierId = classifier.into();
        let mut seen = HashSet::new();
        self.classifiers
            .get(&id)
            .map(|c| {
                c.associations
                    .iter()
                    .copied()
                    .filter(|a| seen.insert(*a))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Associations of a classifier and of all its superclasses.
    pub fn all_associations_of(&self, classifier: impl Into<ClassifierId>) -> Vec<AssociationId> {
        let mut seen = HashSet::new();
        self.ancestry(classifier)
            .into_iter()
            .flat_map(|c| self.associations_of(c))
            .filter(|a| seen.insert(*a))
            .collect()
    }

    /// Live links of an association, in insertion order.
    pub fn links(&self, association: AssociationId) -> &[LinkId] {
        self.associations
            .get(&association)
            .map(|a| a.links.as_slice())
            .unwrap_or_default()
    }

    /// Every link an instance participates in, across all associations.
    pub fn links_of(&self, instance: impl Into<Instance>) -> Vec<LinkId> {
        let Ok(object) = self.resolve_instance(instance.into()) else {
            return Vec::new();
        };
        self.links
            .values()
            .filter(|l| l.involves(object))
            .map(|l| l.id)
            .collect()
    }

    /// Links of an association where `instance` sits at `end`.
    pub fn get_links_by_object(
        &self,
        association: AssociationId,
        end: EndId,
        instance: impl Into<Instance>,
    ) -> ModelResult<Vec<LinkId>> {
        let assoc = self.association_ref(association)?;
        if !assoc.has_end(end) {
            return Err(self.foreign_end(association, end));
        }
        let object = self.resolve_instance(instance.into())?;
        let at_end1 = end == assoc.end1;
        Ok(assoc
            .links
            .iter()
            .filter_map(|id| self.links.get(id))
            .filter(|l| if at_end1 { l.object1 == object } else { l.object2 == object })
            .map(|l| l.id)
            .collect())
    }

    /// Objects reached from `from` by navigating to `target_end`.
    pub fn linked_objects(
        &self,
        association: AssociationId,
        target_end: EndId,
        from: impl Into<Instance>,
    ) -> ModelResult<Vec<ObjectId>> {
        let nav = self.navigate(association, target_end)?;
        self.require_navigable(target_end)?;
        let from = self.resolve_instance(from.into())?;
        Ok(self
            .links_from(&nav, from)
            .map(|l| nav.target_of(l))
            .collect())
    }

    // ==================== Link Mutation ====================

    /// Link `from` to `to`, with `to` sitting at `target_end`.
    ///
    /// The link is stored with end 1 first regardless of the call
    /// direction. Upper bounds of both ends are checked before insertion.
    pub fn add_link(
        &mut self,
        association: AssociationId,
        target_end: EndId,
        from: impl Into<Instance>,
        to: impl Into<Instance>,
    ) -> ModelResult<LinkId> {
        let nav = self.navigate(association, target_end)?;
        let from = self.resolve_instance(from.into())?;
        let to = self.resolve_instance(to.into())?;
        let (object1, object2) = nav.orient(from, to);

        let assoc = self.association_ref(association)?;
        let end1 = self.end_ref(assoc.end1)?;
        let end2 = self.end_ref(assoc.end2)?;
        self.check_conforms(object1, end1)?;
        self.check_conforms(object2, end2)?;

        let existing: Vec<&Link> = assoc.links.iter().filter_map(|id| self.links.get(id)).collect();
        if existing.iter().any(|l| l.object1 == object1 && l.object2 == object2) {
            return Err(ModelError::structure(format!(
                "objects {} and {} are already linked by association {}",
                object1, object2, association
            )));
        }
        let partners_of_1 = existing.iter().filter(|l| l.object1 == object1).count() + 1;
        if end2.multiplicity.exceeds_upper(partners_of_1) {
            return Err(upper_bound_error(object1, partners_of_1, end2));
        }
        let partners_of_2 = existing.iter().filter(|l| l.object2 == object2).count() + 1;
        if end1.multiplicity.exceeds_upper(partners_of_2) {
            return Err(upper_bound_error(object2, partners_of_2, end1));
        }

        Ok(self.insert_link(association, object1, object2))
    }

    /// Replace every link of `from` at `target_end` by links to `targets`.
    ///
    /// The new target list is validated against both ends before any
    /// existing link is removed.
    pub fn set_links<I>(
        &mut self,
        association: AssociationId,
        target_end: EndId,
        from: impl Into<Instance>,
        targets: I,
    ) -> ModelResult<Vec<LinkId>>
    where
        I: IntoIterator,
        I::Item: Into<Instance>,
    {
        let nav = self.navigate(association, target_end)?;
        let target = self.require_navigable(target_end)?;
        let source = self.end_ref(nav.source)?;
        let from = self.resolve_instance(from.into())?;
        self.check_conforms(from, source)?;

        let mut resolved = Vec::new();
        for instance in targets {
            let object = self.resolve_instance(instance.into())?;
            self.check_conforms(object, target)?;
            if resolved.contains(&object) {
                return Err(ModelError::structure(format!(
                    "object {} appears twice in the new '{}' links",
                    object, target.role
                )));
            }
            resolved.push(object);
        }

        if !target.multiplicity.allows(resolved.len()) {
            return Err(ModelError::multiplicity(format!(
                "{} '{}' links for object {} violate multiplicity {}",
                resolved.len(),
                target.role,
                from,
                target.multiplicity
            )));
        }
        let assoc = self.association_ref(association)?;
        for &object in &resolved {
            let others = assoc
                .links
                .iter()
                .filter_map(|id| self.links.get(id))
                .filter(|l| nav.target_of(l) == object && nav.source_of(l) != from)
                .count();
            if source.multiplicity.exceeds_upper(others + 1) {
                return Err(upper_bound_error(object, others + 1, source));
            }
        }

        let old: Vec<LinkId> = self.links_from(&nav, from).map(|l| l.id).collect();
        for link in old {
            self.detach_link(link);
        }
        let created: Vec<LinkId> = resolved
            .into_iter()
            .map(|to| {
                let (object1, object2) = nav.orient(from, to);
                self.insert_link(association, object1, object2)
            })
            .collect();
        Ok(created)
    }

    /// Remove the link from `from` to `to`, where `to` sits at `target_end`.
    pub fn remove_link(
        &mut self,
        association: AssociationId,
        target_end: EndId,
        from: impl Into<Instance>,
        to: impl Into<Instance>,
    ) -> ModelResult<()> {
        let nav = self.navigate(association, target_end)?;
        let target = self.require_navigable(target_end)?;
        let from = self.resolve_instance(from.into())?;
        let to = self.resolve_instance(to.into())?;

        let remaining: Vec<&Link> = self.links_from(&nav, from).collect();
        let link = remaining
            .iter()
            .find(|l| nav.target_of(l) == to)
            .map(|l| l.id)
            .ok_or_else(|| {
                ModelError::structure(format!(
                    "no '{}' link from {} to {} in association {}",
                    target.role, from, to, association
                ))
            })?;
        if target.multiplicity.below_lower(remaining.len() - 1) {
            return Err(lower_bound_error(from, remaining.len() - 1, target));
        }

        self.detach_link(link);
        Ok(())
    }

    /// Remove every link of `from` at `target_end`. Returns how many were
    /// removed.
    pub fn remove_all_links(
        &mut self,
        association: AssociationId,
        target_end: EndId,
        from: impl Into<Instance>,
    ) -> ModelResult<usize> {
        let nav = self.navigate(association, target_end)?;
        let target = self.require_navigable(target_end)?;
        let from = self.resolve_instance(from.into())?;

        let links: Vec<LinkId> = self.links_from(&nav, from).map(|l| l.id).collect();
        if links.is_empty() {
            return Err(ModelError::structure(format!(
                "object {} has no '{}' links in association {}",
                from, target.role, association
            )));
        }
        if target.multiplicity.below_lower(0) {
            return Err(lower_bound_error(from, 0, target));
        }

        let removed = links.len();
        for link in links {
            self.detach_link(link);
        }
        Ok(removed)
    }

    // ==================== Internals ====================

    fn navigate(&self, association: AssociationId, target_end: EndId) -> ModelResult<Navigation> {
        let assoc = self.association_ref(association)?;
        let source = assoc
            .opposite(target_end)
            .ok_or_else(|| self.foreign_end(association, target_end))?;
        Ok(Navigation {
            association,
            source,
            target_is_end1: target_end == assoc.end1,
        })
    }

    fn foreign_end(&self, association: AssociationId, end: EndId) -> ModelError {
        let what = if self.ends.contains_key(&end) {
            "does not belong to"
        } else {
            "is unknown in"
        };
        ModelError::navigation(format!("end {} {} association {}", end, what, association))
    }

    fn require_navigable(&self, end: EndId) -> ModelResult<&AssociationEnd> {
        let end = self.end_ref(end)?;
        if !end.navigable {
            return Err(ModelError::navigation(format!(
                "end '{}' is not navigable",
                end.role
            )));
        }
        Ok(end)
    }

    /// Links of the navigated association whose source object is `from`.
    fn links_from<'a>(
        &'a self,
        nav: &'a Navigation,
        from: ObjectId,
    ) -> impl Iterator<Item = &'a Link> {
        self.links(nav.association)
            .iter()
            .filter_map(|id| self.links.get(id))
            .filter(move |l| nav.source_of(l) == from)
    }

    /// An object conforms to an end if the end's classifier is the object's
    /// classifier, one of its superclasses or one of its subclasses.
    pub(crate) fn conforms(&self, object: ObjectId, classifier: ClassifierId) -> bool {
        let Some(object) = self.objects.get(&object) else {
            return false;
        };
        object.classifier == classifier
            || self.has_superclass(object.classifier, classifier)
            || self.has_subclass(object.classifier, classifier)
    }

    fn check_conforms(&self, object: ObjectId, end: &AssociationEnd) -> ModelResult<()> {
        if self.conforms(object, end.classifier) {
            return Ok(());
        }
        let actual = self.object_ref(object)?.classifier;
        Err(ModelError::type_error(format!(
            "object {} of '{}' does not conform to end '{}' typed '{}'",
            object,
            self.classifier_label(actual),
            end.role,
            self.classifier_label(end.classifier)
        )))
    }

    fn insert_link(
        &mut self,
        association: AssociationId,
        object1: ObjectId,
        object2: ObjectId,
    ) -> LinkId {
        let id = self.ids.alloc_link_id();
        self.links
            .insert(id, Link::new(id, association, object1, object2));
        if let Some(assoc) = self.associations.get_mut(&association) {
            assoc.links.push(id);
        }
        trace!(
            link = %id,
            association = %association,
            object1 = %object1,
            object2 = %object2,
            "added link"
        );
        id
    }

    /// Remove a link with its stereotype applications. Missing links are
    /// ignored.
    pub(crate) fn detach_link(&mut self, id: LinkId) {
        let Some(link) = self.links.remove(&id) else {
            return;
        };
        if let Some(assoc) = self.associations.get_mut(&link.association) {
            assoc.links.retain(|&l| l != id);
        }
        for stereotype in &link.stereotypes {
            if let Some(data) = self
                .classifiers
                .get_mut(&ClassifierId::from(*stereotype))
                .and_then(|c| c.stereotype_mut())
            {
                data.applied.retain(|&e| e != ElementInstance::Link(id));
            }
        }
        trace!(link = %id, "removed link");
    }
}

fn check_role(role: &str) -> ModelResult<()> {
    if role.trim().is_empty() {
        return Err(ModelError::Identifier("end role must not be empty".to_string()));
    }
    Ok(())
}

fn upper_bound_error(object: ObjectId, count: usize, end: &AssociationEnd) -> ModelError {
    ModelError::multiplicity(format!(
        "object {} would have {} '{}' links, more than {} allows",
        object, count, end.role, end.multiplicity
    ))
}

fn lower_bound_error(object: ObjectId, count: usize, end: &AssociationEnd) -> ModelError {
    ModelError::multiplicity(format!(
        "object {} would have {} '{}' links, fewer than {} requires",
        object, count, end.role, end.multiplicity
    ))
}
