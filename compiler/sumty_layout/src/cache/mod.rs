//! Memoized plans, one per union name.
//!
//! Each entry is initialized exactly once, even under concurrent first use:
//! callers racing on the same union block on the entry's `OnceLock` and all
//! observe the same result. Failures are cached as well; planning is
//! deterministic, so retrying could never succeed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use sumty_ir::{TypePool, UnionDefinition};

use crate::classify::TargetInfo;
use crate::plan::{Planner, PlanningError, PlanningErrorKind, StoragePlan};

type PlanResult = Result<Arc<StoragePlan>, PlanningError>;

struct Entry {
    definition: UnionDefinition,
    plan: OnceLock<PlanResult>,
}

/// Thread-safe cache of storage plans keyed by union name.
///
/// A union is planned against the pool passed on its first lookup.
#[derive(Default)]
pub struct PlanCache {
    target: TargetInfo,
    entries: RwLock<FxHashMap<String, Arc<Entry>>>,
    computed: AtomicUsize,
}

impl PlanCache {
    pub fn new(target: TargetInfo) -> Self {
        PlanCache {
            target,
            entries: RwLock::new(FxHashMap::default()),
            computed: AtomicUsize::new(0),
        }
    }

    /// Get the plan for `definition`, computing it on first request.
    ///
    /// A structurally different definition under an already cached name is
    /// rejected with [`PlanningErrorKind::ConflictingDefinition`].
    pub fn get_or_plan(&self, pool: &TypePool, definition: &UnionDefinition) -> PlanResult {
        let entry = self.entry(definition);

        if entry.definition != *definition {
            tracing::warn!(union = definition.name(), "conflicting union definition");
            return Err(PlanningError {
                union_name: definition.name().to_string(),
                kind: PlanningErrorKind::ConflictingDefinition,
            });
        }

        entry
            .plan
            .get_or_init(|| {
                self.computed.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(union = definition.name(), "plan cache miss");
                Planner::new(pool, self.target)
                    .plan(definition)
                    .map(Arc::new)
            })
            .clone()
    }

    /// A previously computed plan, without computing anything.
    pub fn get(&self, union_name: &str) -> Option<Arc<StoragePlan>> {
        let entries = self.entries.read();
        entries
            .get(union_name)
            .and_then(|entry| entry.plan.get())
            .and_then(|result| result.as_ref().ok())
            .cloned()
    }

    /// Number of plans computed (successfully or not) since creation.
    pub fn plans_computed(&self) -> usize {
        self.computed.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn entry(&self, definition: &UnionDefinition) -> Arc<Entry> {
        if let Some(entry) = self.entries.read().get(definition.name()) {
            return Arc::clone(entry);
        }
        let mut entries = self.entries.write();
        Arc::clone(
            entries
                .entry(definition.name().to_string())
                .or_insert_with(|| {
                    Arc::new(Entry {
                        definition: definition.clone(),
                        plan: OnceLock::new(),
                    })
                }),
        )
    }
}
