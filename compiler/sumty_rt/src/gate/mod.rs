//! Deferred capacity validation for the overlapping block.
//!
//! The first time a Rust type is written through a union's block, its size is
//! compared against the block capacity. The outcome is memoized per type, and
//! concurrent first writers block on the same one-time computation, so every
//! caller sees one consistent pass or fail.

use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::error::RuntimeCapacityError;

type CheckCell = Arc<OnceLock<Result<(), RuntimeCapacityError>>>;

pub struct CapacityGate {
    union_name: String,
    capacity: usize,
    checks: DashMap<TypeId, CheckCell>,
    computations: AtomicUsize,
}

impl CapacityGate {
    pub fn new(union_name: impl Into<String>, capacity: usize) -> Self {
        CapacityGate {
            union_name: union_name.into(),
            capacity,
            checks: DashMap::new(),
            computations: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Check that `T` fits, computing its size with `required` on first use.
    pub fn check<T: Any>(
        &self,
        required: impl FnOnce() -> usize,
    ) -> Result<(), RuntimeCapacityError> {
        // Clone the cell out so the shard lock is released before computing.
        let cell = Arc::clone(self.checks.entry(TypeId::of::<T>()).or_default().value());
        cell.get_or_init(|| {
            self.computations.fetch_add(1, Ordering::Relaxed);
            let required_bytes = required();
            let type_name = std::any::type_name::<T>();
            if required_bytes <= self.capacity {
                tracing::debug!(
                    union = %self.union_name,
                    ty = type_name,
                    required_bytes,
                    capacity = self.capacity,
                    "payload fits overlapping block"
                );
                Ok(())
            } else {
                tracing::warn!(
                    union = %self.union_name,
                    ty = type_name,
                    required_bytes,
                    capacity = self.capacity,
                    "payload exceeds overlapping block"
                );
                Err(RuntimeCapacityError {
                    union_name: self.union_name.clone(),
                    type_name: type_name.to_string(),
                    required_bytes,
                    available_bytes: self.capacity,
                })
            }
        })
        .clone()
    }

    /// Number of distinct size computations performed.
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::Relaxed)
    }
}
