//! Declarative model for sumty unions.
//!
//! Everything downstream (layout planning, the runtime contract and the
//! exhaustiveness checker) consumes the types defined here:
//!
//! - [`UnionDefinition`] / [`CaseSpec`]: the validated, ordered case list of a
//!   tagged union plus its storage policy.
//! - [`TypePool`] / [`TypeIdx`] / [`TypeData`]: the closed set of payload type
//!   shapes, interned so index equality is type identity.
//! - [`Span`]: host source locations attached to diagnostics.
//!
//! The host's declaration parser builds these values; this crate only
//! guarantees their invariants.

mod case;
mod span;
mod ty;

pub use case::{
    CaseDecl, CaseIndex, CaseSpec, CaseStorage, DefinitionError, StorageStrategy,
    UnionDefinition, UnionDefinitionBuilder, CATCH_ALL,
};
pub use span::Span;
pub use ty::{
    GenericConstraints, Origin, PoolError, PrimitiveKind, StructField, TypeData, TypeIdx,
    TypePool,
};
