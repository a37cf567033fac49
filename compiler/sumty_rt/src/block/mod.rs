//! The overlapping byte block.
//!
//! Every case routed to the block writes its payload into the same bytes; the
//! discriminant says which payload they currently hold. The block remembers
//! the Rust type it was written with through a small table of monomorphized
//! functions, so reads can be type-checked and two blocks compared or hashed
//! without knowing the type statically.

use std::any::TypeId;
use std::fmt;
use std::hash::Hasher;

use smallvec::{smallvec, SmallVec};

use crate::payload::{Blit, Payload};

/// Type-erased operations for the payload currently in a block.
#[derive(Copy, Clone)]
struct BlockOps {
    type_id: TypeId,
    type_name: &'static str,
    eq: fn(&[u8], &[u8]) -> bool,
    hash: fn(&[u8], &mut dyn Hasher),
    debug: fn(&[u8], &mut fmt::Formatter<'_>) -> fmt::Result,
}

impl BlockOps {
    fn of<T: Payload>() -> Self {
        BlockOps {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            eq: eq_bytes::<T>,
            hash: hash_bytes::<T>,
            debug: debug_bytes::<T>,
        }
    }
}

fn decode<T: Payload>(bytes: &[u8]) -> Option<T> {
    T::BLIT.and_then(|blit| (blit.read)(bytes))
}

fn eq_bytes<T: Payload>(a: &[u8], b: &[u8]) -> bool {
    match (decode::<T>(a), decode::<T>(b)) {
        (Some(a), Some(b)) => a.payload_eq(&b),
        _ => a == b,
    }
}

fn hash_bytes<T: Payload>(bytes: &[u8], state: &mut dyn Hasher) {
    match decode::<T>(bytes) {
        Some(value) => value.payload_hash(state),
        None => state.write(bytes),
    }
}

fn debug_bytes<T: Payload>(bytes: &[u8], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match decode::<T>(bytes) {
        Some(value) => fmt::Debug::fmt(&value, f),
        None => write!(f, "<{} undecodable>", std::any::type_name::<T>()),
    }
}

/// Raw block bytes plus the type they were written with.
#[derive(Clone)]
pub struct OverlapBlock {
    bytes: SmallVec<[u8; 16]>,
    ops: BlockOps,
}

impl OverlapBlock {
    /// Write `value` into a zeroed block of `capacity` bytes.
    ///
    /// The caller has already checked `blit.size <= capacity` through the
    /// layout's capacity gate.
    pub fn write<T: Payload>(value: &T, blit: Blit<T>, capacity: usize) -> Self {
        let mut bytes: SmallVec<[u8; 16]> = smallvec![0; capacity];
        (blit.write)(value, &mut bytes);
        OverlapBlock {
            bytes,
            ops: BlockOps::of::<T>(),
        }
    }

    /// Read the payload back. `None` if it was written as another type.
    pub fn read<T: Payload>(&self) -> Option<T> {
        if self.ops.type_id != TypeId::of::<T>() {
            return None;
        }
        decode::<T>(&self.bytes)
    }

    pub fn holds<T: Payload>(&self) -> bool {
        self.ops.type_id == TypeId::of::<T>()
    }

    pub fn type_name(&self) -> &'static str {
        self.ops.type_name
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn hash_into(&self, state: &mut dyn Hasher) {
        (self.ops.hash)(&self.bytes, state);
    }
}

impl PartialEq for OverlapBlock {
    fn eq(&self, other: &Self) -> bool {
        self.ops.type_id == other.ops.type_id && (self.ops.eq)(&self.bytes, &other.bytes)
    }
}

impl fmt::Debug for OverlapBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.ops.debug)(&self.bytes, f)
    }
}
