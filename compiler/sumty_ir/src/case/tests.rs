#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;

use super::*;

fn optional() -> UnionDefinition {
    UnionDefinition::builder("Optional")
        .type_param("T")
        .payload_case("Some", TypeIdx::I32)
        .unit_case("None")
        .build()
        .unwrap()
}

#[test]
fn indices_follow_declaration_order() {
    let def = UnionDefinition::builder("Shape")
        .payload_case("Circle", TypeIdx::F64)
        .payload_case("Square", TypeIdx::F64)
        .unit_case("Empty")
        .build()
        .unwrap();

    let indices: Vec<_> = def.cases().iter().map(|c| c.index.index()).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_eq!(
        def.case_names().collect::<Vec<_>>(),
        vec!["Circle", "Square", "Empty"]
    );
    assert_eq!(def.len(), 3);
    assert!(!def.is_empty());
}

#[test]
fn lookups() {
    let def = optional();
    assert_eq!(def.name(), "Optional");
    assert!(def.is_generic());
    assert_eq!(def.case_by_name("None").map(|c| c.index), Some(CaseIndex::new(1)));
    assert!(def.case_by_name("Nope").is_none());
    assert_eq!(def.case(CaseIndex::new(0)).map(|c| c.name.as_str()), Some("Some"));
    assert!(def.case(CaseIndex::new(2)).is_none());
    assert_eq!(def.payload_cases().count(), 1);
    assert_eq!(def.strategy(), StorageStrategy::InlineValueTypes);
    assert_eq!(def.block_capacity(), None);
}

#[test]
fn case_decl_options_are_kept() {
    let def = UnionDefinition::builder("Packed")
        .strategy(StorageStrategy::OneObject)
        .block_capacity(16)
        .case(
            CaseDecl::new("Raw")
                .payload(TypeIdx::U64)
                .storage(CaseStorage::Inline)
                .unmanaged(true)
                .size(8),
        )
        .build()
        .unwrap();

    let raw = &def.cases()[0];
    assert_eq!(raw.storage, CaseStorage::Inline);
    assert_eq!(raw.unmanaged_override, Some(true));
    assert_eq!(raw.size_override, Some(8));
    assert_eq!(def.strategy(), StorageStrategy::OneObject);
    assert_eq!(def.block_capacity(), Some(16));
}

#[test]
fn empty_union_is_rejected() {
    assert_eq!(
        UnionDefinition::builder("Never").build(),
        Err(DefinitionError::NoCases {
            union: "Never".to_string()
        })
    );
}

#[test]
fn duplicate_case_is_rejected() {
    let err = UnionDefinition::builder("Dup")
        .unit_case("A")
        .payload_case("A", TypeIdx::I32)
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        DefinitionError::DuplicateCase {
            union: "Dup".to_string(),
            case: "A".to_string(),
        }
    );
    assert_eq!(err.to_string(), "union `Dup` declares case `A` more than once");
}

#[test]
fn catch_all_name_is_reserved() {
    let err = UnionDefinition::builder("U")
        .unit_case(CATCH_ALL)
        .build()
        .unwrap_err();
    assert!(matches!(err, DefinitionError::ReservedCaseName { .. }));
}

#[test]
fn duplicate_type_param_is_rejected() {
    let err = UnionDefinition::builder("Pair")
        .type_param("T")
        .type_param("T")
        .unit_case("A")
        .build()
        .unwrap_err();
    assert!(matches!(err, DefinitionError::DuplicateTypeParam { param, .. } if param == "T"));
}

#[test]
fn zero_sizes_are_rejected() {
    let err = UnionDefinition::builder("U")
        .block_capacity(0)
        .unit_case("A")
        .build()
        .unwrap_err();
    assert!(matches!(err, DefinitionError::ZeroCapacity { .. }));

    let err = UnionDefinition::builder("U")
        .case(CaseDecl::new("A").payload(TypeIdx::I32).size(0))
        .build()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "case `A` of union `U` declares a zero-byte size"
    );
}

#[test]
fn unique_case_lookup() {
    let def = UnionDefinition::builder("Value")
        .payload_case("Int", TypeIdx::I32)
        .payload_case("Left", TypeIdx::STRING)
        .payload_case("Right", TypeIdx::STRING)
        .unit_case("Nothing")
        .build()
        .unwrap();

    assert_eq!(def.unique_case_for(TypeIdx::I32), Some(CaseIndex::new(0)));
    assert_eq!(def.unique_case_for(TypeIdx::STRING), None);
    assert_eq!(def.unique_case_for(TypeIdx::F64), None);
}

#[test]
fn value_equality_is_on_by_default() {
    assert!(optional().value_equality());
    let def = UnionDefinition::builder("Handle")
        .disable_value_equality()
        .unit_case("Closed")
        .build()
        .unwrap();
    assert!(!def.value_equality());
}
