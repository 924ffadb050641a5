//! Name-based handle lookup for scenario steps, plus shared model fixtures.
//!
//! Steps only receive the model, so they find what earlier steps created
//! by name.

use reflex_core::{AssociationId, EndId, ModelError, ModelResult, Multiplicity, ObjectId};
use reflex_model::{ClassId, MetaclassId, Model, StereotypeId};

pub fn metaclass(model: &Model, name: &str) -> ModelResult<MetaclassId> {
    let id = model.require_classifier(name)?;
    model
        .as_metaclass(id)
        .ok_or_else(|| ModelError::Identifier(format!("'{}' is not a metaclass", name)))
}

pub fn class(model: &Model, name: &str) -> ModelResult<ClassId> {
    let id = model.require_classifier(name)?;
    model
        .as_class(id)
        .ok_or_else(|| ModelError::Identifier(format!("'{}' is not a class", name)))
}

pub fn stereotype(model: &Model, name: &str) -> ModelResult<StereotypeId> {
    let id = model.require_classifier(name)?;
    model
        .as_stereotype(id)
        .ok_or_else(|| ModelError::Identifier(format!("'{}' is not a stereotype", name)))
}

pub fn object(model: &Model, name: &str) -> ModelResult<ObjectId> {
    model.require_object(name)
}

/// The single association with the given name.
pub fn association(model: &Model, name: &str) -> ModelResult<AssociationId> {
    match model.get_associations(name).as_slice() {
        [id] => Ok(*id),
        [] => Err(ModelError::unknown_name("association", name)),
        _ => Err(ModelError::Identifier(format!("association name '{}' is ambiguous", name))),
    }
}

/// The end of a named association playing `role`.
pub fn end(model: &Model, association_name: &str, role: &str) -> ModelResult<EndId> {
    let id = association(model, association_name)?;
    model
        .end_by_role(id, role)
        .ok_or_else(|| ModelError::unknown_name("role", role))
}

/// Component metaclass with class `Person` and `Dog`, linked through
/// `owns` (`owner: 1..1`, `pets: 0..*`, both navigable).
pub fn pets_model(model: &mut Model) -> ModelResult<()> {
    let component = model.create_metaclass(Some("Component"))?;
    let person = model.create_class(component, Some("Person"))?;
    let dog = model.create_class(component, Some("Dog"))?;
    model.add_attribute_with_default(person, "name", "anonymous")?;
    model.add_attribute_with_default(dog, "age", 0)?;
    let owner = model.create_end(person, "owner", Multiplicity::exactly(1), true)?;
    let pets = model.create_end(dog, "pets", Multiplicity::many(), true)?;
    model.create_association(Some("owns"), owner, pets)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflex_core::ErrorKind;

    #[test]
    fn test_lookup_by_kind() {
        let mut model = Model::new();
        pets_model(&mut model).unwrap();

        assert!(class(&model, "Person").is_ok());
        assert!(metaclass(&model, "Component").is_ok());
        assert_eq!(
            metaclass(&model, "Person").unwrap_err().kind(),
            ErrorKind::Identifier
        );
        assert_eq!(
            stereotype(&model, "Nobody").unwrap_err().kind(),
            ErrorKind::Identifier
        );
        let owns = association(&model, "owns").unwrap();
        assert_eq!(end(&model, "owns", "pets").ok(), model.end_by_role(owns, "pets"));
    }
}
