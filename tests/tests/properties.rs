//! # Property-Based Tests
//!
//! For-all invariants of the kernel: hierarchy symmetry, multiplicity
//! bounds and value round trips.

use proptest::collection::vec;
use proptest::prelude::*;
use reflex_tests::prelude::*;

const CLASSES: usize = 6;

fn classes(config: ModelConfig) -> (Model, Vec<ClassId>) {
    let mut model = Model::with_config(config);
    let mc = model.create_metaclass(None).expect("metaclass");
    let classes = (0..CLASSES)
        .map(|_| model.create_class(mc, None).expect("class"))
        .collect();
    (model, classes)
}

fn hierarchy_is_symmetric(model: &Model) -> bool {
    model.classifiers().all(|c| {
        c.superclasses
            .iter()
            .all(|&sup| model.subclasses(sup).contains(&c.id))
            && c.subclasses
                .iter()
                .all(|&sub| model.superclasses(sub).contains(&c.id))
    })
}

fn value_strategy() -> impl Strategy<Value = (AttrType, Value)> {
    prop_oneof![
        any::<bool>().prop_map(|v| (AttrType::Bool, Value::Bool(v))),
        any::<i32>().prop_map(|v| (AttrType::Int, Value::Int(v))),
        any::<i64>().prop_map(|v| (AttrType::Long, Value::Long(v))),
        any::<i16>().prop_map(|v| (AttrType::Short, Value::Short(v))),
        any::<i8>().prop_map(|v| (AttrType::Byte, Value::Byte(v))),
        any::<char>().prop_map(|v| (AttrType::Char, Value::Char(v))),
        (-1.0e6f32..1.0e6).prop_map(|v| (AttrType::Float, Value::Float(v))),
        (-1.0e12f64..1.0e12).prop_map(|v| (AttrType::Double, Value::Double(v))),
        ".{0,16}".prop_map(|v| (AttrType::String, Value::String(v))),
    ]
}

proptest! {
    /// Every accepted edge is visible from both sides, and every rejected
    /// edge leaves the hierarchy as it was.
    #[test]
    fn superclass_edges_stay_symmetric(
        edges in vec((0..CLASSES, 0..CLASSES), 1..30),
        reject_cycles in any::<bool>()
    ) {
        let config = ModelConfig::new().with_reject_hierarchy_cycles(reject_cycles);
        let (mut model, classes) = classes(config);

        for (sub, sup) in edges {
            let (sub, sup) = (classes[sub], classes[sup]);
            let before = model.superclasses(sub).to_vec();
            match model.add_superclass(sub, sup) {
                Ok(()) => {
                    prop_assert!(model.subclasses(sup).contains(&sub.id()));
                    prop_assert!(model.all_superclasses(sub).contains(&sup.id()));
                    prop_assert!(model.add_superclass(sub, sup).is_err());
                }
                Err(e) => {
                    prop_assert_eq!(e.kind(), ErrorKind::Structure);
                    prop_assert_eq!(model.superclasses(sub), before.as_slice());
                }
            }
            prop_assert!(hierarchy_is_symmetric(&model));
        }
    }

    /// With cycle rejection on, no classifier is its own ancestor.
    #[test]
    fn strict_hierarchy_is_acyclic(edges in vec((0..CLASSES, 0..CLASSES), 1..30)) {
        let (mut model, classes) = classes(ModelConfig::new());

        for (sub, sup) in edges {
            let _ = model.add_superclass(classes[sub], classes[sup]);
        }

        for class in &classes {
            for sup in model.all_superclasses(*class) {
                prop_assert!(!model.all_superclasses(sup).contains(&class.id()));
            }
        }
    }

    /// No sequence of link attempts pushes a per-object count over an
    /// upper bound.
    #[test]
    fn links_never_exceed_upper_bounds(
        upper_a in 1u32..4,
        upper_b in 1u32..4,
        attempts in vec((0usize..3, 0usize..3), 1..20)
    ) {
        let mut model = Model::new();
        let mc = model.create_metaclass(None).expect("metaclass");
        let a = model.create_class(mc, None).expect("class");
        let b = model.create_class(mc, None).expect("class");
        let end_a = model
            .create_end(a, "a", Multiplicity::range(0, upper_a).expect("bounds"), true)
            .expect("end");
        let end_b = model
            .create_end(b, "b", Multiplicity::range(0, upper_b).expect("bounds"), true)
            .expect("end");
        let assoc = model.create_association(None, end_a, end_b).expect("association");
        let xs: Vec<ObjectId> = (0..3)
            .map(|_| model.create_object(a, None).expect("object"))
            .collect();
        let ys: Vec<ObjectId> = (0..3)
            .map(|_| model.create_object(b, None).expect("object"))
            .collect();

        for (x, y) in attempts {
            let _ = model.add_link(assoc, end_b, xs[x], ys[y]);
        }

        for &x in &xs {
            let count = model.linked_objects(assoc, end_b, x).expect("navigable").len();
            prop_assert!(count <= upper_b as usize);
        }
        for &y in &ys {
            let count = model.linked_objects(assoc, end_a, y).expect("navigable").len();
            prop_assert!(count <= upper_a as usize);
        }
    }

    /// A legal value reads back exactly as written.
    #[test]
    fn primitive_values_round_trip((ty, value) in value_strategy()) {
        let mut model = Model::new();
        let mc = model.create_metaclass(None).expect("metaclass");
        let class = model.create_class(mc, None).expect("class");
        model.add_attribute(class, Attribute::new("slot", ty)).expect("attribute");
        let object = model.create_object(class, None).expect("object");

        model.set_value(object, "slot", value.clone()).expect("set");

        prop_assert_eq!(model.get_value(object, "slot").expect("get"), value);
    }

    /// Enumeration literals and object references round-trip too.
    #[test]
    fn reference_values_round_trip(literal in 0usize..3, target in 0usize..4) {
        let mut model = Model::new();
        let mc = model.create_metaclass(None).expect("metaclass");
        let class = model.create_class(mc, None).expect("class");
        let level = model.create_enum(None, ["low", "mid", "high"]).expect("enum");
        model.add_enum_attribute(class, "level", level, None).expect("attribute");
        model.add_object_attribute(class, "peer", class).expect("attribute");
        let objects: Vec<ObjectId> = (0..4)
            .map(|_| model.create_object(class, None).expect("object"))
            .collect();
        let literal = ["low", "mid", "high"][literal];

        model.set_value(objects[0], "level", literal).expect("set");
        model.set_value(objects[0], "peer", objects[target]).expect("set");

        prop_assert_eq!(model.get_value(objects[0], "level").expect("get"), Value::from(literal));
        prop_assert_eq!(
            model.get_value(objects[0], "peer").expect("get"),
            Value::Object(objects[target])
        );
    }
}
