//! A planned union, ready to construct instances.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use sumty_ir::{CaseIndex, CaseSpec, PrimitiveKind, TypeData, TypeIdx, TypePool, UnionDefinition};
use sumty_layout::{plan_union, PlanCache, PlanningError, StoragePlan};

use crate::error::ConstructError;
use crate::gate::CapacityGate;
use crate::payload::Payload;

/// A Rust type standing in for a declared payload type.
#[derive(Copy, Clone, Debug)]
struct RustType {
    id: TypeId,
    name: &'static str,
}

impl RustType {
    fn of<T: 'static>() -> Self {
        RustType {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }
}

fn primitive_rust_type(kind: PrimitiveKind) -> RustType {
    match kind {
        PrimitiveKind::Bool => RustType::of::<bool>(),
        PrimitiveKind::Char => RustType::of::<char>(),
        PrimitiveKind::I8 => RustType::of::<i8>(),
        PrimitiveKind::U8 => RustType::of::<u8>(),
        PrimitiveKind::I16 => RustType::of::<i16>(),
        PrimitiveKind::U16 => RustType::of::<u16>(),
        PrimitiveKind::I32 => RustType::of::<i32>(),
        PrimitiveKind::U32 => RustType::of::<u32>(),
        PrimitiveKind::I64 => RustType::of::<i64>(),
        PrimitiveKind::U64 => RustType::of::<u64>(),
        PrimitiveKind::ISize => RustType::of::<isize>(),
        PrimitiveKind::USize => RustType::of::<usize>(),
        PrimitiveKind::F32 => RustType::of::<f32>(),
        PrimitiveKind::F64 => RustType::of::<f64>(),
        PrimitiveKind::Str => RustType::of::<String>(),
    }
}

/// How a case's declared payload type constrains the Rust payload.
#[derive(Clone, Debug)]
enum Binding {
    /// Payload-less case, or a generic parameter: any type instantiates it.
    Open,
    /// A primitive with a fixed Rust counterpart.
    Fixed { declared: String, rust: RustType },
    /// A user type, bound to the Rust type of its first payload.
    Pinned { declared: String, ty: TypeIdx },
}

fn binding(pool: &TypePool, case: &CaseSpec) -> Binding {
    let Some(ty) = case.payload else {
        return Binding::Open;
    };
    match pool.try_get(ty) {
        Some(TypeData::Generic { .. }) | None => Binding::Open,
        Some(TypeData::Primitive(kind)) => Binding::Fixed {
            declared: kind.name().to_string(),
            rust: primitive_rust_type(*kind),
        },
        Some(_) => Binding::Pinned {
            declared: pool.display(ty),
            ty,
        },
    }
}

/// Definition, plan and capacity gate of one union.
///
/// Shared by every instance through an `Arc`. A generic union has one layout
/// for all its instantiations; the capacity gate tracks each concrete payload
/// type separately.
///
/// Each concrete declared payload type is bound to one Rust type: primitives
/// to their Rust counterpart (`string` to `String`), user types to whichever
/// Rust type first instantiates them. Cases declaring the same type share
/// the binding.
pub struct UnionLayout {
    definition: UnionDefinition,
    plan: Arc<StoragePlan>,
    gate: Option<CapacityGate>,
    bindings: Vec<Binding>,
    pinned: DashMap<TypeIdx, RustType>,
}

impl UnionLayout {
    /// Plan `definition` and build its layout.
    pub fn plan(pool: &TypePool, definition: UnionDefinition) -> Result<Arc<Self>, PlanningError> {
        let plan = plan_union(pool, &definition)?;
        Ok(Self::with_plan(pool, definition, Arc::new(plan)))
    }

    /// Build a layout from a cached plan.
    pub fn from_cache(
        cache: &PlanCache,
        pool: &TypePool,
        definition: UnionDefinition,
    ) -> Result<Arc<Self>, PlanningError> {
        let plan = cache.get_or_plan(pool, &definition)?;
        Ok(Self::with_plan(pool, definition, plan))
    }

    fn with_plan(pool: &TypePool, definition: UnionDefinition, plan: Arc<StoragePlan>) -> Arc<Self> {
        let gate = plan
            .block_capacity()
            .map(|capacity| CapacityGate::new(definition.name(), capacity));
        let bindings = definition
            .cases()
            .iter()
            .map(|case| binding(pool, case))
            .collect();
        Arc::new(UnionLayout {
            definition,
            plan,
            gate,
            bindings,
            pinned: DashMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn definition(&self) -> &UnionDefinition {
        &self.definition
    }

    pub fn storage_plan(&self) -> &StoragePlan {
        &self.plan
    }

    /// Capacity gate of the overlapping block, if the plan has one.
    pub fn gate(&self) -> Option<&CapacityGate> {
        self.gate.as_ref()
    }

    pub fn case(&self, case: CaseIndex) -> Option<&CaseSpec> {
        self.definition.case(case)
    }

    pub fn case_index(&self, name: &str) -> Option<CaseIndex> {
        self.definition.case_by_name(name).map(|c| c.index)
    }

    /// The one case whose declared payload type is `ty`.
    pub fn unique_case_for(&self, ty: TypeIdx) -> Option<CaseIndex> {
        self.definition.unique_case_for(ty)
    }

    /// Check that `T` instantiates the payload type declared by `case`.
    pub(crate) fn bind_payload<T: Payload>(&self, case: CaseIndex) -> Result<(), ConstructError> {
        let given = RustType::of::<T>();
        let (declared, bound) = match self.bindings.get(case.index()) {
            None | Some(Binding::Open) => return Ok(()),
            Some(Binding::Fixed { declared, rust }) => (declared, *rust),
            Some(Binding::Pinned { declared, ty }) => {
                (declared, *self.pinned.entry(*ty).or_insert(given))
            }
        };
        if bound.id == given.id {
            return Ok(());
        }
        Err(ConstructError::TypeMismatch {
            case: self.case_name(case).to_string(),
            declared: declared.clone(),
            bound: bound.name,
            given: given.name,
        })
    }

    /// Name of a case, or `"?"` for an index outside the union.
    pub fn case_name(&self, case: CaseIndex) -> &str {
        self.case(case).map_or("?", |c| c.name.as_str())
    }
}

impl fmt::Debug for UnionLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnionLayout")
            .field("name", &self.name())
            .field("fields", &self.plan.fields().len())
            .finish_non_exhaustive()
    }
}
