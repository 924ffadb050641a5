//! Attribute scenarios: declarations, defaults, values and shadowing.

use pretty_assertions::assert_eq;
use reflex_tests::prelude::*;

mod defaults {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("defaults")
            .step("setup", pets_model, |a| a.ok())
            .step(
                "declare_weight",
                |m| {
                    let dog = class(m, "Dog")?;
                    m.add_attribute(dog, Attribute::new("weight", AttrType::Double))
                },
                |a| a.ok(),
            )
            .step(
                "string_default_on_double",
                |m| {
                    let dog = class(m, "Dog")?;
                    m.set_attribute_default(dog, "weight", "heavy")
                },
                |a| {
                    a.error(ErrorKind::Type).check("default stays unset", |m| {
                        m.get_classifier("Dog")
                            .and_then(|dog| m.attribute(dog, "weight"))
                            .is_some_and(|attr| attr.default.is_none())
                    })
                },
            )
            .step(
                "int_default_on_double",
                |m| {
                    let dog = class(m, "Dog")?;
                    m.set_attribute_default(dog, "weight", 12)
                },
                |a| a.error(ErrorKind::Type),
            )
            .step(
                "double_default",
                |m| {
                    let dog = class(m, "Dog")?;
                    m.set_attribute_default(dog, "weight", 12.5)
                },
                |a| a.ok(),
            )
            .step(
                "new_dog_gets_default",
                |m| {
                    let dog = class(m, "Dog")?;
                    m.create_object(dog, Some("rex")).map(drop)
                },
                |a| {
                    a.ok().check("rex weighs 12.5", |m| {
                        m.get_object("rex")
                            .and_then(|rex| m.get_value(rex, "weight").ok())
                            == Some(Value::Double(12.5))
                    })
                },
            )
    }

    #[test]
    fn test_default_type_is_checked() {
        scenario().run().unwrap();
    }
}

// ========== TEST: inherited_defaults_are_seeded ==========
#[test]
fn test_inherited_defaults_are_seeded() {
    // GIVEN Student -> Person, Person.name defaults to "anonymous"
    let mut model = Model::new();
    pets_model(&mut model).unwrap();
    let mc = metaclass(&model, "Component").unwrap();
    let person = class(&model, "Person").unwrap();
    let student = model.create_class(mc, Some("Student")).unwrap();
    model.add_superclass(student, person).unwrap();
    model.add_attribute_with_default(student, "school", "MIT").unwrap();

    // WHEN creating a student
    let pupil = model.create_object(student, None).unwrap();

    // THEN both own and inherited defaults are present
    assert_eq!(model.get_value(pupil, "name").unwrap(), Value::from("anonymous"));
    assert_eq!(model.get_value(pupil, "school").unwrap(), Value::from("MIT"));
    let names: Vec<&str> = model
        .all_attributes(student)
        .into_iter()
        .map(|(_, a)| a.name.as_str())
        .collect();
    assert_eq!(names, vec!["school", "name"]);
}

// ========== TEST: enum_and_object_values ==========
#[test]
fn test_enum_and_object_values() {
    // GIVEN Dog.color: Color and Dog.owner: Person
    let mut model = Model::new();
    pets_model(&mut model).unwrap();
    let person = class(&model, "Person").unwrap();
    let dog = class(&model, "Dog").unwrap();
    let color = model.create_enum(Some("Color"), ["black", "brown"]).unwrap();
    model.add_enum_attribute(dog, "color", color, Some("brown")).unwrap();
    model.add_object_attribute(dog, "master", person).unwrap();
    let alice = model.create_object(person, Some("alice")).unwrap();
    let rex = model.create_object(dog, Some("rex")).unwrap();

    // WHEN setting legal and illegal values
    model.set_value(rex, "color", "black").unwrap();
    model.set_value(rex, "master", alice).unwrap();
    let bad_literal = model.set_value(rex, "color", "green");
    let bad_target = model.set_value(rex, "master", rex);

    // THEN legal values round-trip and illegal ones leave them intact
    assert_eq!(model.get_value(rex, "color").unwrap(), Value::from("black"));
    assert_eq!(model.get_value(rex, "master").unwrap(), Value::Object(alice));
    assert_eq!(bad_literal.unwrap_err().kind(), ErrorKind::Type);
    assert_eq!(bad_target.unwrap_err().kind(), ErrorKind::Type);
}

// ========== TEST: shadowed_attribute_needs_qualification ==========
#[test]
fn test_shadowed_attribute_needs_qualification() {
    // GIVEN Person.name and Student.name
    let mut model = Model::new();
    pets_model(&mut model).unwrap();
    let mc = metaclass(&model, "Component").unwrap();
    let person = class(&model, "Person").unwrap();
    let student = model.create_class(mc, Some("Student")).unwrap();
    model.add_superclass(student, person).unwrap();
    model.add_attribute(student, Attribute::new("name", AttrType::Int)).unwrap();
    let pupil = model.create_object(student, None).unwrap();

    // WHEN writing through both paths
    model.set_value(pupil, "name", 7).unwrap();
    model.set_value_for(pupil, person, "name", "Ann").unwrap();

    // THEN the slots stay separate
    assert_eq!(model.get_value(pupil, "name").unwrap(), Value::Int(7));
    assert_eq!(model.get_value_for(pupil, person, "name").unwrap(), Value::from("Ann"));
    let dog = class(&model, "Dog").unwrap();
    let foreign = model.get_value_for(pupil, dog, "age");
    assert_eq!(foreign.unwrap_err().kind(), ErrorKind::Structure);
}

// ========== TEST: class_values_live_on_metaclass_attributes ==========
#[test]
fn test_class_values_live_on_metaclass_attributes() {
    // GIVEN Component.version with a default
    let mut model = Model::new();
    let component = model.create_metaclass(Some("Component")).unwrap();
    model.add_attribute_with_default(component, "version", 1).unwrap();
    let web = model.create_class(component, Some("Web")).unwrap();

    // WHEN the class value is changed and cleared
    assert_eq!(model.get_value(web, "version").unwrap(), Value::Int(1));
    model.set_value(web, "version", 2).unwrap();
    let changed = model.get_value(web, "version").unwrap();
    model.clear_value(web, "version").unwrap();

    // THEN the class behaves like an instance of its metaclass
    assert_eq!(changed, Value::Int(2));
    assert_eq!(model.get_value(web, "version").unwrap(), Value::Null);
    let undeclared = model.get_value(web, "missing");
    assert_eq!(undeclared.unwrap_err().kind(), ErrorKind::Identifier);
}
