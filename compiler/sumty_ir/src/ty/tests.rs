#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;

use super::*;

#[test]
fn primitives_have_fixed_indices() {
    let pool = TypePool::new();
    for kind in PrimitiveKind::ALL {
        assert_eq!(pool.get(kind.idx()), &TypeData::Primitive(kind));
        assert_eq!(PrimitiveKind::from_idx(kind.idx()), Some(kind));
        assert!(kind.idx().is_primitive());
    }
    assert_eq!(pool.len(), TypeIdx::PRIMITIVE_COUNT as usize);
    assert_eq!(TypeIdx::STRING, PrimitiveKind::Str.idx());
}

#[test]
fn structural_types_are_interned() {
    let mut pool = TypePool::new();
    let a = pool.array(TypeIdx::I32).unwrap();
    let b = pool.array(TypeIdx::I32).unwrap();
    let c = pool.array(TypeIdx::I64).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);

    let t1 = pool.generic("T", GenericConstraints::empty());
    let t2 = pool.generic("T", GenericConstraints::empty());
    let t3 = pool.generic("T", GenericConstraints::UNMANAGED);
    assert_eq!(t1, t2);
    assert_ne!(t1, t3);
}

#[test]
fn struct_declared_then_defined() {
    let mut pool = TypePool::new();
    let node = pool.declare_struct("Node", Origin::Local).unwrap();
    let edge = pool.declare_struct("Edge", Origin::Local).unwrap();
    pool.define_struct(node, [("edge", edge)]).unwrap();
    pool.define_struct(edge, [("node", node)]).unwrap();

    assert_eq!(pool.struct_named("Node"), Some(node));
    match pool.get(node) {
        TypeData::Struct { fields: Some(fields), .. } => {
            assert_eq!(fields.len(), 1);
            assert_eq!(fields[0].ty, edge);
        }
        other => panic!("unexpected entry {other:?}"),
    }
}

#[test]
fn struct_fields_set_once() {
    let mut pool = TypePool::new();
    let point = pool
        .struct_type("Point", Origin::Local, [("x", TypeIdx::I32)])
        .unwrap();
    assert_eq!(
        pool.define_struct(point, [("y", TypeIdx::I32)]),
        Err(PoolError::AlreadyDefined {
            name: "Point".to_string()
        })
    );
    assert_eq!(
        pool.define_struct(TypeIdx::I32, [("y", TypeIdx::I32)]),
        Err(PoolError::NotAStruct(TypeIdx::I32))
    );
}

#[test]
fn redeclaring_struct_with_other_origin_fails() {
    let mut pool = TypePool::new();
    let first = pool.declare_struct("Guid", Origin::External).unwrap();
    assert_eq!(pool.declare_struct("Guid", Origin::External), Ok(first));
    assert!(matches!(
        pool.declare_struct("Guid", Origin::Local),
        Err(PoolError::ConflictingOrigin { .. })
    ));
}

#[test]
fn enum_requires_integer_repr() {
    let mut pool = TypePool::new();
    assert!(pool.enum_type("Color", PrimitiveKind::U8).is_ok());
    assert_eq!(
        pool.enum_type("Bad", PrimitiveKind::F32),
        Err(PoolError::InvalidEnumRepr {
            name: "Bad".to_string(),
            underlying: PrimitiveKind::F32,
        })
    );
}

#[test]
fn foreign_indices_are_rejected() {
    let mut pool = TypePool::new();
    let bogus = TypeIdx::from_raw(999);
    assert_eq!(pool.array(bogus), Err(PoolError::UnknownType(bogus)));
    assert!(pool.try_get(bogus).is_none());
}

#[test]
fn display_names() {
    let mut pool = TypePool::new();
    let ptr = pool.pointer(TypeIdx::I32).unwrap();
    let arr = pool.array(TypeIdx::STRING).unwrap();
    let list = pool.class("List");
    let t = pool.generic("T", GenericConstraints::VALUE_TYPE);

    assert_eq!(pool.display(ptr), "*const i32");
    assert_eq!(pool.display(arr), "[string]");
    assert_eq!(pool.display(list), "List");
    assert_eq!(pool.display(t), "T");
    assert_eq!(pool.display(TypeIdx::F64), "f64");
}

#[test]
fn nested_display_names() {
    let mut pool = TypePool::new();
    let ptr = pool.pointer(TypeIdx::U8).unwrap();
    let arr = pool.array(ptr).unwrap();
    let nested = pool.array(arr).unwrap();
    let outer = pool.pointer(nested).unwrap();
    assert_eq!(pool.display(outer), "*const [[*const u8]]");
}

#[test]
fn deep_pointer_chain_displays() {
    let mut pool = TypePool::new();
    let mut ty = TypeIdx::I32;
    for _ in 0..200_000 {
        ty = pool.pointer(ty).unwrap();
    }
    let name = pool.display(ty);
    assert!(name.ends_with("*const i32"));
    assert_eq!(name.len(), 200_000 * "*const ".len() + "i32".len());
}

#[test]
fn primitive_sizes_follow_pointer_width() {
    assert_eq!(PrimitiveKind::USize.size(4), Some(4));
    assert_eq!(PrimitiveKind::USize.size(8), Some(8));
    assert_eq!(PrimitiveKind::Char.size(8), Some(4));
    assert_eq!(PrimitiveKind::Str.size(8), None);
}
