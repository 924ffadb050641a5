//! Association and link scenarios: multiplicity, navigation, replacement.

use pretty_assertions::assert_eq;
use reflex_tests::prelude::*;

fn people(model: &mut Model) -> ModelResult<()> {
    pets_model(model)?;
    let person = class(model, "Person")?;
    let dog = class(model, "Dog")?;
    for name in ["alice", "bob"] {
        model.create_object(person, Some(name))?;
    }
    for name in ["rex", "fido"] {
        model.create_object(dog, Some(name))?;
    }
    Ok(())
}

fn adopt(model: &mut Model, owner: &str, dog: &str) -> ModelResult<()> {
    let owns = association(model, "owns")?;
    let pets = end(model, "owns", "pets")?;
    let (owner, dog) = (object(model, owner)?, object(model, dog)?);
    model.add_link(owns, pets, owner, dog).map(drop)
}

fn pets_of(model: &Model, owner: &str) -> Vec<ObjectId> {
    let lookup = || -> ModelResult<Vec<ObjectId>> {
        let owns = association(model, "owns")?;
        let pets = end(model, "owns", "pets")?;
        model.linked_objects(owns, pets, object(model, owner)?)
    };
    lookup().unwrap_or_default()
}

mod single_owner {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("single_owner")
            .step("setup", people, |a| a.ok())
            .step("alice_adopts_rex", |m| adopt(m, "alice", "rex"), |a| a.ok())
            .step(
                "alice_adopts_fido",
                |m| adopt(m, "alice", "fido"),
                |a| a.ok().check("alice has two pets", |m| pets_of(m, "alice").len() == 2),
            )
            .step(
                "bob_adopts_rex",
                |m| adopt(m, "bob", "rex"),
                |a| {
                    a.error(ErrorKind::Multiplicity)
                        .check("bob has no pet", |m| pets_of(m, "bob").is_empty())
                },
            )
            .step(
                "alice_adopts_rex_again",
                |m| adopt(m, "alice", "rex"),
                |a| a.error(ErrorKind::Structure),
            )
    }

    #[test]
    fn test_opposite_upper_bound_caps_links() {
        scenario().run().unwrap();
    }
}

mod replacement {
    use super::*;

    fn set_owner(model: &mut Model, dog: &str, owners: &[&str]) -> ModelResult<()> {
        let owns = association(model, "owns")?;
        let owner = end(model, "owns", "owner")?;
        let dog = object(model, dog)?;
        let owners = owners
            .iter()
            .map(|n| object(model, n))
            .collect::<ModelResult<Vec<_>>>()?;
        model.set_links(owns, owner, dog, owners).map(drop)
    }

    pub fn scenario() -> Scenario {
        Scenario::new("replacement")
            .step("setup", people, |a| a.ok())
            .step("alice_adopts_rex", |m| adopt(m, "alice", "rex"), |a| a.ok())
            .step(
                "clear_owner",
                |m| set_owner(m, "rex", &[]),
                |a| {
                    a.error(ErrorKind::Multiplicity)
                        .check("rex keeps alice", |m| pets_of(m, "alice").len() == 1)
                },
            )
            .step(
                "two_owners",
                |m| set_owner(m, "rex", &["alice", "bob"]),
                |a| a.error(ErrorKind::Multiplicity),
            )
            .step(
                "hand_over",
                |m| set_owner(m, "rex", &["bob"]),
                |a| {
                    a.ok()
                        .check("alice lost rex", |m| pets_of(m, "alice").is_empty())
                        .check("bob got rex", |m| pets_of(m, "bob").len() == 1)
                },
            )
    }

    #[test]
    fn test_set_links_validates_before_replacing() {
        scenario().run().unwrap();
    }
}

// ========== TEST: two_to_one_multiplicity_example ==========
#[test]
fn test_two_to_one_multiplicity_example() {
    // GIVEN ends "a": 1..1 and "b": 0..*
    let mut model = Model::new();
    let mc = model.create_metaclass(None).unwrap();
    let a = model.create_class(mc, Some("A")).unwrap();
    let b = model.create_class(mc, Some("B")).unwrap();
    let end_a = model.create_end(a, "a", Multiplicity::parse("1..1").unwrap(), true).unwrap();
    let end_b = model.create_end(b, "b", Multiplicity::parse("0..*").unwrap(), true).unwrap();
    let assoc = model.create_association(Some("ab"), end_a, end_b).unwrap();
    let x = model.create_object(a, Some("X")).unwrap();
    let x2 = model.create_object(a, Some("X2")).unwrap();
    let y1 = model.create_object(b, Some("Y1")).unwrap();
    let y2 = model.create_object(b, Some("Y2")).unwrap();

    // WHEN X links to Y1 and Y2, then X2 tries Y1
    model.add_link(assoc, end_b, x, y1).unwrap();
    model.add_link(assoc, end_b, x, y2).unwrap();
    let third = model.add_link(assoc, end_b, x2, y1);

    // THEN only the third link fails, on Y1's "a" bound
    assert_eq!(third.unwrap_err().kind(), ErrorKind::Multiplicity);
    assert_eq!(model.links(assoc).len(), 2);
    assert_eq!(model.linked_objects(assoc, end_a, y1).unwrap(), vec![x]);
    assert!(model.add_link(assoc, end_b, x2, y2).is_err());
}

// ========== TEST: navigation_through_either_end ==========
#[test]
fn test_navigation_through_either_end() {
    let mut model = Model::new();
    people(&mut model).unwrap();
    adopt(&mut model, "alice", "rex").unwrap();
    let owns = association(&model, "owns").unwrap();
    let owner = end(&model, "owns", "owner").unwrap();
    let [alice, rex] = ["alice", "rex"].map(|n| object(&model, n).unwrap());

    assert_eq!(model.linked_objects(owns, owner, rex).unwrap(), vec![alice]);
    assert_eq!(model.get_links_by_object(owns, owner, alice).unwrap().len(), 1);
    assert_eq!(model.links_of(rex).len(), 1);
    assert_eq!(model.opposite_end(owns, owner), end(&model, "owns", "pets").ok());
}

// ========== TEST: non_navigable_end_blocks_traversal ==========
#[test]
fn test_non_navigable_end_blocks_traversal() {
    // GIVEN the owner end is not navigable
    let mut model = Model::new();
    people(&mut model).unwrap();
    adopt(&mut model, "alice", "rex").unwrap();
    let owns = association(&model, "owns").unwrap();
    let owner = end(&model, "owns", "owner").unwrap();
    let rex = object(&model, "rex").unwrap();
    model.set_navigable(owner, false).unwrap();

    // WHEN navigating from a dog to its owner
    let result = model.linked_objects(owns, owner, rex);

    // THEN navigation fails
    assert_eq!(result.unwrap_err().kind(), ErrorKind::Navigation);
    let removal = model.remove_all_links(owns, owner, rex);
    assert_eq!(removal.unwrap_err().kind(), ErrorKind::Navigation);
}

// ========== TEST: remove_link_respects_lower_bound ==========
#[test]
fn test_remove_link_respects_lower_bound() {
    // GIVEN rex owned by alice (owner is 1..1)
    let mut model = Model::new();
    people(&mut model).unwrap();
    adopt(&mut model, "alice", "rex").unwrap();
    let owns = association(&model, "owns").unwrap();
    let owner = end(&model, "owns", "owner").unwrap();
    let pets = end(&model, "owns", "pets").unwrap();
    let [alice, rex] = ["alice", "rex"].map(|n| object(&model, n).unwrap());

    // WHEN removing from the dog side, then from the owner side
    let from_dog = model.remove_link(owns, owner, rex, alice);
    let from_owner = model.remove_link(owns, pets, alice, rex);

    // THEN the dog may not drop its owner, but the owner may drop the dog
    assert_eq!(from_dog.unwrap_err().kind(), ErrorKind::Multiplicity);
    assert!(from_owner.is_ok());
    assert!(model.links(owns).is_empty());
}

// ========== TEST: class_participates_through_its_object ==========
#[test]
fn test_class_participates_through_its_object() {
    // GIVEN an association between metaclasses
    let mut model = Model::new();
    let component = model.create_metaclass(Some("Component")).unwrap();
    let client = model.create_end(component, "client", Multiplicity::many(), true).unwrap();
    let supplier = model.create_end(component, "supplier", Multiplicity::many(), true).unwrap();
    let uses = model.create_association(Some("uses"), client, supplier).unwrap();
    let web = model.create_class(component, Some("Web")).unwrap();
    let db = model.create_class(component, Some("Db")).unwrap();

    // WHEN linking two classes
    model.add_link(uses, supplier, web, db).unwrap();

    // THEN the link is stored between their embedded objects
    let db_object = model.class_object(db).unwrap();
    assert_eq!(model.linked_objects(uses, supplier, web).unwrap(), vec![db_object]);
    assert_eq!(model.instance(db_object), Some(Instance::Class(db)));
    assert_eq!(model.associations_of(component), vec![uses]);
}

// ========== TEST: inherited_associations ==========
#[test]
fn test_inherited_associations() {
    let mut model = Model::new();
    people(&mut model).unwrap();
    let mc = metaclass(&model, "Component").unwrap();
    let person = class(&model, "Person").unwrap();
    let student = model.create_class(mc, Some("Student")).unwrap();
    model.add_superclass(student, person).unwrap();
    let pupil = model.create_object(student, Some("pupil")).unwrap();
    let owns = association(&model, "owns").unwrap();

    assert!(model.associations_of(student).is_empty());
    assert_eq!(model.all_associations_of(student), vec![owns]);
    adopt(&mut model, "pupil", "fido").unwrap();
    assert_eq!(pets_of(&model, "pupil").len(), 1);
    assert!(model.instance_of(pupil, person));
}
