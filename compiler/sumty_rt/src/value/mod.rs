//! Union instances.
//!
//! A [`UnionValue`] holds its discriminant plus the one field the plan
//! assigns to the active case. Other fields do not exist at all, so they can
//! never be read.
//!
//! Unions declared without value equality compare by identity: a value
//! equals its clones and nothing else.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use sumty_ir::{CaseIndex, TypeIdx};
use sumty_layout::FieldKind;

use crate::block::OverlapBlock;
use crate::error::{AccessError, ConstructError};
use crate::layout::UnionLayout;
use crate::payload::{DynPayload, Payload};

/// Storage of the active case's payload.
enum Slot {
    /// Payload-less case.
    Vacant,
    /// Boxed into the shared object slot.
    Object(Arc<dyn DynPayload>),
    /// Stored in a field of its own type.
    Dedicated(Box<dyn DynPayload>),
    /// Written into the overlapping block.
    Block(OverlapBlock),
}

impl Clone for Slot {
    fn clone(&self) -> Self {
        match self {
            Slot::Vacant => Slot::Vacant,
            Slot::Object(value) => Slot::Object(Arc::clone(value)),
            Slot::Dedicated(value) => Slot::Dedicated(value.clone_boxed()),
            Slot::Block(block) => Slot::Block(block.clone()),
        }
    }
}

impl Slot {
    fn read<T: Payload>(&self) -> Option<T> {
        match self {
            Slot::Vacant => None,
            Slot::Object(value) => value.as_any().downcast_ref::<T>().cloned(),
            Slot::Dedicated(value) => value.as_any().downcast_ref::<T>().cloned(),
            Slot::Block(block) => block.read::<T>(),
        }
    }

    fn stored_type(&self) -> &'static str {
        match self {
            Slot::Vacant => "()",
            Slot::Object(value) => value.type_name(),
            Slot::Dedicated(value) => value.type_name(),
            Slot::Block(block) => block.type_name(),
        }
    }

    fn payload_eq(&self, other: &Slot) -> bool {
        match (self, other) {
            (Slot::Vacant, Slot::Vacant) => true,
            (Slot::Object(a), Slot::Object(b)) => Arc::ptr_eq(a, b) || a.dyn_eq(&**b),
            (Slot::Dedicated(a), Slot::Dedicated(b)) => a.dyn_eq(&**b),
            (Slot::Block(a), Slot::Block(b)) => a == b,
            _ => false,
        }
    }

    fn payload_hash(&self, state: &mut dyn Hasher) {
        match self {
            Slot::Vacant => {}
            Slot::Object(value) => value.dyn_hash(state),
            Slot::Dedicated(value) => value.dyn_hash(state),
            Slot::Block(block) => block.hash_into(state),
        }
    }

    fn debug(&self) -> Option<&dyn fmt::Debug> {
        match self {
            Slot::Vacant => None,
            Slot::Object(value) => Some(value),
            Slot::Dedicated(value) => Some(value),
            Slot::Block(block) => Some(block),
        }
    }
}

/// An instance of a planned union.
#[derive(Clone)]
pub struct UnionValue {
    layout: Arc<UnionLayout>,
    discriminant: CaseIndex,
    slot: Slot,
    /// Shared by clones; set only for unions without value equality.
    identity: Option<Arc<()>>,
}

impl UnionValue {
    // ── Construction ────────────────────────────────────────────────

    /// Build a payload-bearing case.
    pub fn new<T: Payload>(
        layout: &Arc<UnionLayout>,
        case: CaseIndex,
        value: T,
    ) -> Result<Self, ConstructError> {
        let spec = layout.case(case).ok_or_else(|| ConstructError::UnknownCase {
            union_name: layout.name().to_string(),
            case,
        })?;
        let Some(field) = layout.storage_plan().field_for(case) else {
            return Err(ConstructError::UnexpectedPayload {
                union_name: layout.name().to_string(),
                case: spec.name.clone(),
            });
        };
        layout.bind_payload::<T>(case)?;

        let slot = match field.kind {
            FieldKind::SharedObject => Slot::Object(Arc::new(value)),
            FieldKind::Dedicated(_) => Slot::Dedicated(Box::new(value)),
            FieldKind::OverlappingBlock { capacity } => {
                let blit = T::BLIT.ok_or_else(|| ConstructError::NotBlittable {
                    case: spec.name.clone(),
                    type_name: std::any::type_name::<T>(),
                })?;
                if let Some(gate) = layout.gate() {
                    gate.check::<T>(|| blit.size)?;
                }
                Slot::Block(OverlapBlock::write(&value, blit, capacity))
            }
        };

        Ok(Self::assemble(layout, case, slot))
    }

    /// Build a payload-bearing case by name.
    pub fn new_named<T: Payload>(
        layout: &Arc<UnionLayout>,
        name: &str,
        value: T,
    ) -> Result<Self, ConstructError> {
        let case = Self::resolve(layout, name)?;
        Self::new(layout, case, value)
    }

    /// Build a payload-less case. Carries no payload storage.
    pub fn unit(layout: &Arc<UnionLayout>, case: CaseIndex) -> Result<Self, ConstructError> {
        let spec = layout.case(case).ok_or_else(|| ConstructError::UnknownCase {
            union_name: layout.name().to_string(),
            case,
        })?;
        if spec.has_payload() {
            return Err(ConstructError::MissingPayload {
                union_name: layout.name().to_string(),
                case: spec.name.clone(),
            });
        }
        Ok(Self::assemble(layout, case, Slot::Vacant))
    }

    pub fn unit_named(layout: &Arc<UnionLayout>, name: &str) -> Result<Self, ConstructError> {
        let case = Self::resolve(layout, name)?;
        Self::unit(layout, case)
    }

    /// Build the one case whose declared payload type is `ty`.
    pub fn from_payload<T: Payload>(
        layout: &Arc<UnionLayout>,
        ty: TypeIdx,
        value: T,
    ) -> Result<Self, ConstructError> {
        let case = layout
            .unique_case_for(ty)
            .ok_or_else(|| ConstructError::NoUniqueCase {
                union_name: layout.name().to_string(),
                ty,
            })?;
        Self::new(layout, case, value)
    }

    fn assemble(layout: &Arc<UnionLayout>, discriminant: CaseIndex, slot: Slot) -> Self {
        let identity = (!layout.definition().value_equality()).then(|| Arc::new(()));
        UnionValue {
            layout: Arc::clone(layout),
            discriminant,
            slot,
            identity,
        }
    }

    fn resolve(layout: &UnionLayout, name: &str) -> Result<CaseIndex, ConstructError> {
        layout
            .case_index(name)
            .ok_or_else(|| ConstructError::UnknownCaseName {
                union_name: layout.name().to_string(),
                name: name.to_string(),
            })
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn layout(&self) -> &Arc<UnionLayout> {
        &self.layout
    }

    pub fn discriminant(&self) -> CaseIndex {
        self.discriminant
    }

    pub fn case_name(&self) -> &str {
        self.layout.case_name(self.discriminant)
    }

    pub fn is_case(&self, case: CaseIndex) -> bool {
        self.discriminant == case
    }

    pub fn is_case_named(&self, name: &str) -> bool {
        self.layout.case_index(name) == Some(self.discriminant)
    }

    // ── Access ──────────────────────────────────────────────────────

    fn invalid_state(&self, expected: CaseIndex) -> AccessError {
        if self.layout.case(expected).is_none() {
            return AccessError::UnknownCase {
                union_name: self.layout.name().to_string(),
                case: expected,
            };
        }
        AccessError::InvalidState {
            union_name: self.layout.name().to_string(),
            expected: self.layout.case_name(expected).to_string(),
            actual: self.case_name().to_string(),
        }
    }

    /// Read the payload of the active case, which must be `T`.
    fn payload<T: Payload>(&self) -> Result<T, AccessError> {
        self.slot
            .read::<T>()
            .ok_or_else(|| AccessError::TypeMismatch {
                case: self.case_name().to_string(),
                requested: std::any::type_name::<T>(),
                stored: self.slot.stored_type(),
            })
    }

    /// The payload of `case`. Fails with `InvalidState` if another case is
    /// active.
    pub fn as_case<T: Payload>(&self, case: CaseIndex) -> Result<T, AccessError> {
        if !self.is_case(case) {
            return Err(self.invalid_state(case));
        }
        self.payload()
    }

    /// Check that `case` is active. The accessor for payload-less cases.
    pub fn ensure_case(&self, case: CaseIndex) -> Result<(), AccessError> {
        if self.is_case(case) {
            Ok(())
        } else {
            Err(self.invalid_state(case))
        }
    }

    /// The payload of `case`, or `T::default()` if another case is active.
    pub fn as_case_or_default<T: Payload + Default>(
        &self,
        case: CaseIndex,
    ) -> Result<T, AccessError> {
        self.as_case_or_else(case, T::default)
    }

    /// The payload of `case`, or `fallback` if another case is active.
    pub fn as_case_or<T: Payload>(&self, case: CaseIndex, fallback: T) -> Result<T, AccessError> {
        self.as_case_or_else(case, || fallback)
    }

    /// The payload of `case`, or the factory's value if another case is active.
    pub fn as_case_or_else<T: Payload>(
        &self,
        case: CaseIndex,
        factory: impl FnOnce() -> T,
    ) -> Result<T, AccessError> {
        if self.is_case(case) {
            self.payload()
        } else {
            Ok(factory())
        }
    }

    /// Run `f` on the payload if `case` is active. Returns whether it ran.
    pub fn if_case<T: Payload>(
        &self,
        case: CaseIndex,
        f: impl FnOnce(T),
    ) -> Result<bool, AccessError> {
        if !self.is_case(case) {
            return Ok(false);
        }
        f(self.payload()?);
        Ok(true)
    }

    /// Run `f` on the payload if `case` is active, `or_else` otherwise.
    pub fn if_case_else<T: Payload, R>(
        &self,
        case: CaseIndex,
        f: impl FnOnce(T) -> R,
        or_else: impl FnOnce() -> R,
    ) -> Result<R, AccessError> {
        if self.is_case(case) {
            Ok(f(self.payload()?))
        } else {
            Ok(or_else())
        }
    }
}

impl PartialEq for UnionValue {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (&self.identity, &other.identity) {
            return Arc::ptr_eq(a, b);
        }
        if self.identity.is_some() || other.identity.is_some() {
            return false;
        }
        let same_union = Arc::ptr_eq(&self.layout, &other.layout)
            || self.layout.definition() == other.layout.definition();
        same_union
            && self.discriminant == other.discriminant
            && self.slot.payload_eq(&other.slot)
    }
}

impl Eq for UnionValue {}

impl Hash for UnionValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if let Some(identity) = &self.identity {
            std::ptr::hash(Arc::as_ptr(identity), state);
            return;
        }
        self.discriminant.hash(state);
        self.slot.payload_hash(state);
    }
}

impl fmt::Display for UnionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot.debug() {
            Some(payload) => write!(f, "{}({payload:?})", self.case_name()),
            None => f.write_str(self.case_name()),
        }
    }
}

impl fmt::Debug for UnionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("UnionValue");
        s.field("union", &self.layout.name())
            .field("case", &self.case_name());
        if let Some(payload) = self.slot.debug() {
            s.field("payload", payload);
        }
        s.finish()
    }
}
