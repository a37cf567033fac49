//! Storage layout planning.
//!
//! Turns a [`UnionDefinition`] into a [`StoragePlan`]: the set of data fields
//! an instance needs and which field each payload-bearing case writes to.
//!
//! # Field kinds
//!
//! - `SharedObject`: one slot holding any boxed payload. Every case routed to
//!   object storage shares it.
//! - `Dedicated(ty)`: a field of exactly one type. Cases with the same
//!   concrete payload type share it; distinct types never do.
//! - `OverlappingBlock`: raw bytes sized to the largest layout-eligible
//!   payload. At most one per plan.
//!
//! Payload-less cases get no field; the discriminant alone identifies them.
//! Fields are listed in the order of the first case that needs them.

use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use sumty_diagnostic::{Diagnostic, ErrorCode};
use sumty_ir::{
    CaseIndex, CaseSpec, CaseStorage, StorageStrategy, TypeIdx, TypePool, UnionDefinition,
};

use crate::classify::{EligibilityClassifier, TargetInfo, TypeDescriptor};

/// Position of a field in [`StoragePlan::fields`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct FieldId(u32);

impl FieldId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    fn from_usize(index: usize) -> Self {
        FieldId(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldKind {
    SharedObject,
    Dedicated(TypeIdx),
    OverlappingBlock { capacity: usize },
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldSpec {
    pub id: FieldId,
    pub kind: FieldKind,
    /// Payload type name, for `Dedicated` fields.
    pub type_name: Option<String>,
    /// Cases stored in this field, in declaration order.
    pub cases: SmallVec<[CaseIndex; 4]>,
}

/// A concrete payload whose known size exceeds the declared block capacity.
///
/// The plan is still valid: constructing this case fails at runtime with a
/// capacity error before any byte is written.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CapacityShortfall {
    pub case: String,
    pub type_name: String,
    pub required: usize,
    pub available: usize,
}

impl CapacityShortfall {
    pub fn to_diagnostic(&self, union_name: &str) -> Diagnostic {
        Diagnostic::warning(ErrorCode::W2001)
            .with_message(format!(
                "case `{}` of union `{union_name}` needs {} bytes for `{}` but the block holds {}",
                self.case, self.required, self.type_name, self.available
            ))
            .with_note("constructing this case will fail at runtime")
            .with_suggestion(format!(
                "raise the block capacity to at least {} bytes",
                self.required
            ))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlanningErrorKind {
    #[error(
        "case `{case}` stores `{type_name}` in the overlapping block but its size cannot be known before instantiation"
    )]
    UnsizedUnmanagedPayload { case: String, type_name: String },
    #[error("case `{case}` cannot store reference type `{type_name}` in the overlapping block")]
    ReferenceTypeInBlock { case: String, type_name: String },
    #[error("a different definition was already planned under this name")]
    ConflictingDefinition,
    #[error("payload of case `{case}` is not in the type pool ({ty:?})")]
    UnknownPayloadType { case: String, ty: TypeIdx },
}

/// A union whose layout cannot be planned. Blocks code emission.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("cannot plan union `{union_name}`: {kind}")]
pub struct PlanningError {
    pub union_name: String,
    pub kind: PlanningErrorKind,
}

impl PlanningError {
    /// The offending case, when the error is about one.
    pub fn case_name(&self) -> Option<&str> {
        match &self.kind {
            PlanningErrorKind::UnsizedUnmanagedPayload { case, .. }
            | PlanningErrorKind::ReferenceTypeInBlock { case, .. }
            | PlanningErrorKind::UnknownPayloadType { case, .. } => Some(case),
            PlanningErrorKind::ConflictingDefinition => None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self.kind {
            PlanningErrorKind::UnsizedUnmanagedPayload { .. } => ErrorCode::E2001,
            PlanningErrorKind::ReferenceTypeInBlock { .. } => ErrorCode::E2002,
            PlanningErrorKind::ConflictingDefinition => ErrorCode::E2003,
            PlanningErrorKind::UnknownPayloadType { .. } => ErrorCode::E2004,
        }
    }
}

impl From<&PlanningError> for Diagnostic {
    fn from(err: &PlanningError) -> Self {
        let diag = Diagnostic::error(err.code()).with_message(err.to_string());
        match err.kind {
            PlanningErrorKind::UnsizedUnmanagedPayload { .. } => diag
                .with_note("generic payloads have no size until instantiated")
                .with_suggestion("declare an explicit size for the case or a block capacity"),
            PlanningErrorKind::ReferenceTypeInBlock { .. } => {
                diag.with_suggestion("remove the unmanaged override or store the case as an object")
            }
            _ => diag,
        }
    }
}

impl From<PlanningError> for Diagnostic {
    fn from(err: PlanningError) -> Self {
        Diagnostic::from(&err)
    }
}

/// Computed layout of one union.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoragePlan {
    union_name: String,
    case_names: Vec<String>,
    fields: Vec<FieldSpec>,
    per_case: Vec<Option<FieldId>>,
    capacity_shortfalls: Vec<CapacityShortfall>,
    uniform: bool,
}

impl StoragePlan {
    pub fn union_name(&self) -> &str {
        &self.union_name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    fn case_name(&self, case: CaseIndex) -> &str {
        self.case_names.get(case.index()).map_or("?", String::as_str)
    }

    pub fn field(&self, id: FieldId) -> Option<&FieldSpec> {
        self.fields.get(id.index())
    }

    /// Field assigned to a case. `None` for payload-less cases.
    pub fn field_id_for(&self, case: CaseIndex) -> Option<FieldId> {
        self.per_case.get(case.index()).copied().flatten()
    }

    pub fn field_for(&self, case: CaseIndex) -> Option<&FieldSpec> {
        self.field_id_for(case).and_then(|id| self.field(id))
    }

    /// The overlapping block, if any case uses one.
    pub fn block(&self) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|f| matches!(f.kind, FieldKind::OverlappingBlock { .. }))
    }

    pub fn block_capacity(&self) -> Option<usize> {
        self.block().and_then(|f| match f.kind {
            FieldKind::OverlappingBlock { capacity } => Some(capacity),
            _ => None,
        })
    }

    pub fn shared_object(&self) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|f| f.kind == FieldKind::SharedObject)
    }

    /// Whether the uniform-type shortcut produced this plan.
    pub fn is_uniform(&self) -> bool {
        self.uniform
    }

    pub fn capacity_shortfalls(&self) -> &[CapacityShortfall] {
        &self.capacity_shortfalls
    }

    /// Warnings attached to an otherwise valid plan.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.capacity_shortfalls
            .iter()
            .map(|s| s.to_diagnostic(&self.union_name))
            .collect()
    }
}

impl fmt::Display for StoragePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.union_name)?;
        for field in &self.fields {
            write!(f, "\n  {} ", field.id)?;
            match (&field.kind, &field.type_name) {
                (FieldKind::SharedObject, _) => write!(f, "object")?,
                (FieldKind::Dedicated(_), Some(name)) => write!(f, "{name}")?,
                (FieldKind::Dedicated(ty), None) => write!(f, "{ty:?}")?,
                (FieldKind::OverlappingBlock { capacity }, _) => write!(f, "block[{capacity}]")?,
            }
            write!(f, " <-")?;
            for case in &field.cases {
                write!(f, " {}", self.case_name(*case))?;
            }
        }
        let mut units = self
            .per_case
            .iter()
            .zip(&self.case_names)
            .filter(|(field, _)| field.is_none())
            .map(|(_, name)| name)
            .peekable();
        if units.peek().is_some() {
            write!(f, "\n  unit:")?;
            for name in units {
                write!(f, " {name}")?;
            }
        }
        Ok(())
    }
}

/// Plans unions against one type pool, sharing classification results.
pub struct Planner<'pool> {
    classifier: EligibilityClassifier<'pool>,
}

enum Route {
    Object,
    Inline,
}

impl<'pool> Planner<'pool> {
    pub fn new(pool: &'pool TypePool, target: TargetInfo) -> Self {
        Planner {
            classifier: EligibilityClassifier::new(pool, target),
        }
    }

    pub fn classifier(&self) -> &EligibilityClassifier<'pool> {
        &self.classifier
    }

    pub fn plan(&self, definition: &UnionDefinition) -> Result<StoragePlan, PlanningError> {
        let union_name = definition.name();
        let fail = |kind| PlanningError {
            union_name: union_name.to_string(),
            kind,
        };

        let mut payloads: Vec<(&CaseSpec, TypeDescriptor)> = Vec::new();
        for case in definition.payload_cases() {
            let Some(ty) = case.payload else { continue };
            let desc = self.classifier.classify(ty).ok_or_else(|| {
                fail(PlanningErrorKind::UnknownPayloadType {
                    case: case.name.clone(),
                    ty,
                })
            })?;
            payloads.push((case, desc));
        }

        let mut builder = PlanBuilder::new(definition);

        if let Some(ty) = uniform_type(&payloads) {
            for (case, desc) in &payloads {
                builder.dedicated(case.index, ty, &desc.display_name);
            }
            let plan = builder.finish(true);
            tracing::debug!(union = union_name, "uniform payload type, one dedicated field");
            return Ok(plan);
        }

        for (case, desc) in &payloads {
            match route(definition.strategy(), case, desc) {
                Route::Object => builder.shared_object(case.index),
                Route::Inline => {
                    let eligible = case
                        .unmanaged_override
                        .unwrap_or(desc.recursively_unmanaged || case.size_override.is_some());
                    if !eligible {
                        builder.dedicated(case.index, desc.ty, &desc.display_name);
                        continue;
                    }
                    if !desc.may_live_in_block() {
                        return Err(fail(PlanningErrorKind::ReferenceTypeInBlock {
                            case: case.name.clone(),
                            type_name: desc.display_name.clone(),
                        }));
                    }
                    let known = if desc.is_generic() { None } else { desc.static_size };
                    let required = case.size_override.max(known);
                    if required.is_none() && definition.block_capacity().is_none() {
                        return Err(fail(PlanningErrorKind::UnsizedUnmanagedPayload {
                            case: case.name.clone(),
                            type_name: desc.display_name.clone(),
                        }));
                    }
                    builder.block(case, &desc.display_name, required);
                }
            }
        }

        let plan = builder.finish(false);
        for shortfall in plan.capacity_shortfalls() {
            tracing::warn!(
                union = union_name,
                case = %shortfall.case,
                required = shortfall.required,
                available = shortfall.available,
                "block capacity shortfall"
            );
        }
        tracing::debug!(union = union_name, fields = plan.fields.len(), "planned union");
        Ok(plan)
    }
}

/// Plan a union with the default target.
pub fn plan_union(
    pool: &TypePool,
    definition: &UnionDefinition,
) -> Result<StoragePlan, PlanningError> {
    Planner::new(pool, TargetInfo::default()).plan(definition)
}

/// The shared payload type when every payload case carries the same concrete
/// type and none asks for object storage.
fn uniform_type(payloads: &[(&CaseSpec, TypeDescriptor)]) -> Option<TypeIdx> {
    let ((_, first), rest) = payloads.split_first()?;
    if first.is_generic() {
        return None;
    }
    let same_type = rest.iter().all(|(_, desc)| desc.ty == first.ty);
    let none_boxed = payloads
        .iter()
        .all(|(case, _)| case.storage != CaseStorage::AsSharedObject);
    (same_type && none_boxed).then_some(first.ty)
}

fn route(strategy: StorageStrategy, case: &CaseSpec, desc: &TypeDescriptor) -> Route {
    match case.storage {
        CaseStorage::AsSharedObject => Route::Object,
        CaseStorage::Inline => Route::Inline,
        // Declared eligibility is honoured or rejected inline, never boxed.
        CaseStorage::Default if case.unmanaged_override == Some(true) => Route::Inline,
        CaseStorage::Default => match strategy {
            StorageStrategy::OneObject => Route::Object,
            StorageStrategy::InlineValueTypes if desc.is_always_value_type() => Route::Inline,
            StorageStrategy::InlineValueTypes => Route::Object,
        },
    }
}

struct PlanBuilder {
    union_name: String,
    case_names: Vec<String>,
    declared_capacity: Option<usize>,
    fields: Vec<FieldSpec>,
    per_case: Vec<Option<FieldId>>,
    dedicated: FxHashMap<TypeIdx, FieldId>,
    shared: Option<FieldId>,
    block: Option<FieldId>,
    block_requirement: usize,
    shortfalls: Vec<CapacityShortfall>,
}

impl PlanBuilder {
    fn new(definition: &UnionDefinition) -> Self {
        PlanBuilder {
            union_name: definition.name().to_string(),
            case_names: definition.case_names().map(str::to_string).collect(),
            declared_capacity: definition.block_capacity(),
            fields: Vec::new(),
            per_case: vec![None; definition.len()],
            dedicated: FxHashMap::default(),
            shared: None,
            block: None,
            block_requirement: 0,
            shortfalls: Vec::new(),
        }
    }

    fn push_field(&mut self, kind: FieldKind, type_name: Option<String>) -> FieldId {
        let id = FieldId::from_usize(self.fields.len());
        self.fields.push(FieldSpec {
            id,
            kind,
            type_name,
            cases: SmallVec::new(),
        });
        id
    }

    fn assign(&mut self, case: CaseIndex, id: FieldId) {
        if let Some(field) = self.fields.get_mut(id.index()) {
            field.cases.push(case);
        }
        if let Some(slot) = self.per_case.get_mut(case.index()) {
            *slot = Some(id);
        }
    }

    fn shared_object(&mut self, case: CaseIndex) {
        let id = match self.shared {
            Some(id) => id,
            None => {
                let id = self.push_field(FieldKind::SharedObject, None);
                self.shared = Some(id);
                id
            }
        };
        self.assign(case, id);
    }

    fn dedicated(&mut self, case: CaseIndex, ty: TypeIdx, type_name: &str) {
        let id = match self.dedicated.get(&ty) {
            Some(&id) => id,
            None => {
                let id = self.push_field(FieldKind::Dedicated(ty), Some(type_name.to_string()));
                self.dedicated.insert(ty, id);
                id
            }
        };
        self.assign(case, id);
    }

    fn block(&mut self, case: &CaseSpec, type_name: &str, required: Option<usize>) {
        let id = match self.block {
            Some(id) => id,
            None => {
                let id = self.push_field(FieldKind::OverlappingBlock { capacity: 0 }, None);
                self.block = Some(id);
                id
            }
        };
        if let Some(required) = required {
            self.block_requirement = self.block_requirement.max(required);
            if let Some(available) = self.declared_capacity.filter(|&cap| cap < required) {
                self.shortfalls.push(CapacityShortfall {
                    case: case.name.clone(),
                    type_name: type_name.to_string(),
                    required,
                    available,
                });
            }
        }
        self.assign(case.index, id);
    }

    fn finish(mut self, uniform: bool) -> StoragePlan {
        let capacity = self.declared_capacity.unwrap_or(self.block_requirement);
        if let Some(field) = self.block.and_then(|id| self.fields.get_mut(id.index())) {
            field.kind = FieldKind::OverlappingBlock { capacity };
        }
        StoragePlan {
            union_name: self.union_name,
            case_names: self.case_names,
            fields: self.fields,
            per_case: self.per_case,
            capacity_shortfalls: self.shortfalls,
            uniform,
        }
    }
}
