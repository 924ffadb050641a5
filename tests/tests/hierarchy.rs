//! Classifier hierarchy scenarios: generalization edges, cycles, closures.

use pretty_assertions::assert_eq;
use reflex_tests::prelude::*;

fn vehicles(model: &mut Model) -> ModelResult<()> {
    let mc = model.create_metaclass(Some("Kind"))?;
    for name in ["Vehicle", "Car", "Truck", "Pickup"] {
        model.create_class(mc, Some(name))?;
    }
    Ok(())
}

fn edge(model: &mut Model, sub: &str, sup: &str) -> ModelResult<()> {
    let (sub, sup) = (class(model, sub)?, class(model, sup)?);
    model.add_superclass(sub, sup)
}

mod duplicate_edges {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("duplicate_edges")
            .step("setup", vehicles, |a| a.ok())
            .step("car_is_vehicle", |m| edge(m, "Car", "Vehicle"), |a| a.ok())
            .step(
                "again",
                |m| edge(m, "Car", "Vehicle"),
                |a| {
                    a.error(ErrorKind::Structure)
                        .error_contains("already a superclass")
                        .check("edge stored once", |m| {
                            let car = m.get_classifier("Car").unwrap_or(ClassifierId::new(0));
                            m.superclasses(car).len() == 1
                        })
                },
            )
            .step(
                "reverse",
                |m| edge(m, "Vehicle", "Car"),
                |a| a.error(ErrorKind::Structure),
            )
            .step("self", |m| edge(m, "Car", "Car"), |a| a.error(ErrorKind::Structure))
    }

    #[test]
    fn test_duplicate_and_reverse_edges_rejected() {
        scenario().run().unwrap();
    }
}

mod cycles {
    use super::*;

    pub fn strict() -> Scenario {
        Scenario::new("strict_cycles")
            .step("setup", vehicles, |a| a.ok())
            .step(
                "chain",
                |m| {
                    edge(m, "Pickup", "Truck")?;
                    edge(m, "Truck", "Car")?;
                    edge(m, "Car", "Vehicle")
                },
                |a| a.ok(),
            )
            .step(
                "close",
                |m| edge(m, "Vehicle", "Pickup"),
                |a| a.error(ErrorKind::Structure).error_contains("cycle"),
            )
    }

    pub fn lenient() -> Scenario {
        Scenario::new("lenient_cycles")
            .config(ModelConfig::new().with_reject_hierarchy_cycles(false))
            .step("setup", vehicles, |a| a.ok())
            .step(
                "chain",
                |m| {
                    edge(m, "Truck", "Car")?;
                    edge(m, "Car", "Vehicle")
                },
                |a| a.ok(),
            )
            .step(
                "close",
                |m| edge(m, "Vehicle", "Truck"),
                |a| {
                    a.ok().check("closure stays finite", |m| {
                        let truck = m.get_classifier("Truck").unwrap_or(ClassifierId::new(0));
                        m.all_superclasses(truck).len() == 2
                    })
                },
            )
    }

    #[test]
    fn test_long_cycle_rejected_by_default() {
        strict().run().unwrap();
    }

    #[test]
    fn test_long_cycle_allowed_when_configured() {
        let model = lenient().run().unwrap();
        let vehicle = class(&model, "Vehicle").unwrap();
        let truck = class(&model, "Truck").unwrap();

        assert!(model.has_superclass(vehicle, truck));
        assert!(model.has_superclass(truck, vehicle));
        assert!(!model.all_superclasses(vehicle).contains(&vehicle.id()));
    }
}

// ========== TEST: closures_follow_multiple_inheritance ==========
#[test]
fn test_closures_follow_multiple_inheritance() {
    // GIVEN Pickup -> (Truck, Car), Truck -> Vehicle, Car -> Vehicle
    let mut model = Model::new();
    vehicles(&mut model).unwrap();
    edge(&mut model, "Pickup", "Truck").unwrap();
    edge(&mut model, "Pickup", "Car").unwrap();
    edge(&mut model, "Truck", "Vehicle").unwrap();
    edge(&mut model, "Car", "Vehicle").unwrap();
    let [vehicle, car, truck, pickup] =
        ["Vehicle", "Car", "Truck", "Pickup"].map(|n| class(&model, n).unwrap().id());

    // WHEN walking the closures
    let ups = model.all_superclasses(pickup);
    let downs = model.all_subclasses(vehicle);

    // THEN every ancestor appears once, depth first
    assert_eq!(ups, vec![truck, vehicle, car]);
    assert_eq!(downs, vec![truck, pickup, car]);
    assert_eq!(model.ancestry(pickup)[0], pickup);
}

// ========== TEST: deleting_edge_keeps_symmetry ==========
#[test]
fn test_deleting_edge_keeps_symmetry() {
    let mut model = Model::new();
    vehicles(&mut model).unwrap();
    edge(&mut model, "Car", "Vehicle").unwrap();
    let car = class(&model, "Car").unwrap();
    let vehicle = class(&model, "Vehicle").unwrap();

    model.delete_superclass(car, vehicle).unwrap();

    assert!(model.superclasses(car).is_empty());
    assert!(model.subclasses(vehicle).is_empty());
    let missing = model.delete_superclass(car, vehicle);
    assert_eq!(missing.unwrap_err().kind(), ErrorKind::Structure);
}

// ========== TEST: metaclass_and_stereotype_hierarchies ==========
#[test]
fn test_metaclass_and_stereotype_hierarchies() {
    // GIVEN metaclasses and stereotypes with their own hierarchies
    let mut model = Model::new();
    let element = model.create_metaclass(Some("Element")).unwrap();
    let node = model.create_metaclass(Some("Node")).unwrap();
    let tagged = model.create_stereotype(Some("Tagged")).unwrap();
    let secure = model.create_stereotype(Some("Secure")).unwrap();

    // WHEN adding same-kind edges
    model.add_superclass(node, element).unwrap();
    model.add_superclass(secure, tagged).unwrap();

    // THEN each kind keeps its own hierarchy
    assert!(model.has_subclass(element, node));
    assert!(model.has_superclass(secure, tagged));
    assert_eq!(model.classifier_kind(node.id()), Some(ClassifierKind::Metaclass));
}
