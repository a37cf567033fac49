//! Storage layout planning for sumty unions.
//!
//! Two stages, both pure functions of a [`UnionDefinition`] and its
//! [`TypePool`](sumty_ir::TypePool):
//!
//! 1. [`EligibilityClassifier`] decides for every payload type whether its
//!    bytes can live in the shared overlapping block, and how large it is.
//! 2. [`Planner`] routes every payload-bearing case to a shared object slot,
//!    a dedicated field, or the overlapping block, producing a
//!    [`StoragePlan`] or a [`PlanningError`].
//!
//! [`PlanCache`] memoizes plans so each union is planned once per process.
//!
//! [`UnionDefinition`]: sumty_ir::UnionDefinition

mod cache;
mod classify;
mod plan;

pub use cache::PlanCache;
pub use classify::{
    sequential_layout, EligibilityClassifier, TargetInfo, TypeDescriptor, TypeKind,
    ValueCategory,
};
pub use plan::{
    plan_union, CapacityShortfall, FieldId, FieldKind, FieldSpec, Planner, PlanningError,
    PlanningErrorKind, StoragePlan,
};
