//! Runtime contract for sumty union instances.
//!
//! A [`UnionLayout`] pairs a union definition with its storage plan. Instances
//! ([`UnionValue`]) are built per case, hold the discriminant plus the single
//! field their plan assigns to the active case, and support typed access,
//! structural equality and hashing, and exhaustive dispatch.
//!
//! Payloads stored in the overlapping block are validated lazily: the first
//! write of each Rust type checks its size against the block capacity through
//! a per-layout [`CapacityGate`], once, even under concurrent first use.

mod block;
mod dispatch;
mod error;
mod gate;
mod layout;
mod payload;
mod value;

pub use block::OverlapBlock;
pub use dispatch::Matcher;
pub use error::{
    AccessError, ConstructError, DispatchError, MatchFailure, RuntimeCapacityError,
};
pub use gate::CapacityGate;
pub use layout::UnionLayout;
pub use payload::{read_array, write_bytes, Blit, DynPayload, Payload};
pub use value::UnionValue;
