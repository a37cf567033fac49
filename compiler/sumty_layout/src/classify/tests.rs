#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;
use sumty_ir::{GenericConstraints, Origin, PrimitiveKind, TypeIdx, TypePool};

use super::*;

fn classifier(pool: &TypePool) -> EligibilityClassifier<'_> {
    EligibilityClassifier::new(pool, TargetInfo::default())
}

#[test]
fn primitives() {
    let pool = TypePool::new();
    let c = classifier(&pool);

    let int = c.classify(TypeIdx::I32).unwrap();
    assert_eq!(int.display_name, "i32");
    assert_eq!(int.kind, TypeKind::ConcreteValueType);
    assert!(int.recursively_unmanaged);
    assert_eq!(int.static_size, Some(4));
    assert_eq!(int.alignment, Some(4));

    assert_eq!(c.classify(TypeIdx::CHAR).unwrap().static_size, Some(4));
    assert_eq!(c.classify(TypeIdx::USIZE).unwrap().static_size, Some(8));

    let string = c.classify(TypeIdx::STRING).unwrap();
    assert_eq!(string.kind, TypeKind::ConcreteReferenceType);
    assert_eq!(string.value_category, ValueCategory::Reference);
    assert!(!string.recursively_unmanaged);
    assert_eq!(string.static_size, None);
}

#[test]
fn pointer_width_follows_target() {
    let mut pool = TypePool::new();
    let ptr = pool.pointer(TypeIdx::STRING).unwrap();
    let narrow = EligibilityClassifier::new(&pool, TargetInfo::new(4));

    let desc = narrow.classify(ptr).unwrap();
    assert_eq!(desc.display_name, "*const string");
    assert!(desc.recursively_unmanaged);
    assert_eq!(desc.static_size, Some(4));
    assert_eq!(narrow.classify(TypeIdx::ISIZE).unwrap().static_size, Some(4));
}

#[test]
fn enums_take_their_representation() {
    let mut pool = TypePool::new();
    let color = pool.enum_type("Color", PrimitiveKind::U8).unwrap();
    let desc = classifier(&pool).classify(color).unwrap();
    assert!(desc.recursively_unmanaged);
    assert_eq!(desc.static_size, Some(1));
}

#[test]
fn local_struct_layout_is_sequential() {
    let mut pool = TypePool::new();
    // u8 at 0, pad to 4, i32 at 4, u8 at 8, pad to 12
    let padded = pool
        .struct_type(
            "Padded",
            Origin::Local,
            [("a", TypeIdx::U8), ("b", TypeIdx::I32), ("c", TypeIdx::U8)],
        )
        .unwrap();
    let empty = pool
        .struct_type("Empty", Origin::Local, Vec::<(&str, TypeIdx)>::new())
        .unwrap();

    let c = classifier(&pool);
    let desc = c.classify(padded).unwrap();
    assert!(desc.recursively_unmanaged);
    assert_eq!(desc.static_size, Some(12));
    assert_eq!(desc.alignment, Some(4));

    let desc = c.classify(empty).unwrap();
    assert!(desc.recursively_unmanaged);
    assert_eq!(desc.static_size, Some(1));
}

#[test]
fn nested_structs_are_followed() {
    let mut pool = TypePool::new();
    let point = pool
        .struct_type("Point", Origin::Local, [("x", TypeIdx::F64), ("y", TypeIdx::F64)])
        .unwrap();
    let segment = pool
        .struct_type("Segment", Origin::Local, [("from", point), ("to", point)])
        .unwrap();
    let named = pool
        .struct_type("Named", Origin::Local, [("at", point), ("label", TypeIdx::STRING)])
        .unwrap();

    let c = classifier(&pool);
    assert_eq!(c.classify(segment).unwrap().static_size, Some(32));
    assert!(c.is_unmanaged(segment));

    let named = c.classify(named).unwrap();
    assert!(!named.recursively_unmanaged);
    assert_eq!(named.kind, TypeKind::ConcreteValueType);
    assert_eq!(named.static_size, None);
}

#[test]
fn external_and_undefined_structs_are_opaque() {
    let mut pool = TypePool::new();
    let external = pool
        .struct_type("Guid", Origin::External, [("lo", TypeIdx::U64), ("hi", TypeIdx::U64)])
        .unwrap();
    let pending = pool.declare_struct("Pending", Origin::Local).unwrap();

    let c = classifier(&pool);
    for idx in [external, pending] {
        let desc = c.classify(idx).unwrap();
        assert!(!desc.recursively_unmanaged);
        assert_eq!(desc.static_size, None);
        assert!(desc.is_always_value_type());
    }
}

#[test]
fn self_containing_struct_terminates() {
    let mut pool = TypePool::new();
    let a = pool.declare_struct("A", Origin::Local).unwrap();
    let b = pool.declare_struct("B", Origin::Local).unwrap();
    pool.define_struct(a, [("b", b)]).unwrap();
    pool.define_struct(b, [("a", a), ("n", TypeIdx::I32)]).unwrap();

    let c = classifier(&pool);
    assert!(!c.is_unmanaged(a));
    assert!(!c.is_unmanaged(b));
}

#[test]
fn self_reference_through_pointer_is_fine() {
    let mut pool = TypePool::new();
    let node = pool.declare_struct("Node", Origin::Local).unwrap();
    let next = pool.pointer(node).unwrap();
    pool.define_struct(node, [("value", TypeIdx::I64), ("next", next)])
        .unwrap();

    let desc = classifier(&pool).classify(node).unwrap();
    assert!(desc.recursively_unmanaged);
    assert_eq!(desc.static_size, Some(16));
}

#[test]
fn reference_shapes_are_never_eligible() {
    let mut pool = TypePool::new();
    let class = pool.class("Widget");
    let array = pool.array(TypeIdx::I32).unwrap();
    let iface = pool.interface("IShape");

    let c = classifier(&pool);
    let kinds: Vec<_> = [class, array, iface]
        .into_iter()
        .map(|idx| c.classify(idx).unwrap())
        .map(|d| (d.kind, d.recursively_unmanaged, d.may_live_in_block()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (TypeKind::ConcreteReferenceType, false, false),
            (TypeKind::ArrayType, false, false),
            (TypeKind::Interface, false, false),
        ]
    );
    assert_eq!(c.classify(array).unwrap().display_name, "[i32]");
}

#[test]
fn generic_parameters_follow_constraints() {
    let mut pool = TypePool::new();
    let plain = pool.generic("T", GenericConstraints::empty());
    let unmanaged = pool.generic("U", GenericConstraints::UNMANAGED);
    let value = pool.generic("V", GenericConstraints::VALUE_TYPE);
    let class = pool.generic("C", GenericConstraints::REFERENCE_TYPE);

    let c = classifier(&pool);
    let plain = c.classify(plain).unwrap();
    assert!(plain.is_generic());
    assert!(!plain.recursively_unmanaged);
    assert_eq!(plain.value_category, ValueCategory::Either);
    assert_eq!(plain.static_size, None);

    let unmanaged = c.classify(unmanaged).unwrap();
    assert!(unmanaged.recursively_unmanaged);
    assert_eq!(unmanaged.value_category, ValueCategory::Value);
    assert_eq!(unmanaged.static_size, None);

    assert_eq!(c.classify(value).unwrap().value_category, ValueCategory::Value);
    assert!(!c.classify(class).unwrap().may_live_in_block());
}

#[test]
fn foreign_index_is_not_classified() {
    let pool = TypePool::new();
    assert!(classifier(&pool).classify(TypeIdx::from_raw(999)).is_none());
}

#[test]
fn sequential_layout_rules() {
    assert_eq!(sequential_layout(Vec::new()), (1, 1));
    assert_eq!(sequential_layout([(1, 1), (8, 8)]), (16, 8));
    assert_eq!(sequential_layout([(8, 8), (1, 1)]), (16, 8));
    assert_eq!(sequential_layout([(2, 2), (1, 1)]), (4, 2));
}
