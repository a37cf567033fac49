//! Union definitions and their cases.
//!
//! A [`UnionDefinition`] is the immutable input to planning and checking. It
//! can only be produced by [`UnionDefinitionBuilder::build`], which assigns
//! case indices in declaration order and rejects malformed declarations, so
//! every definition in circulation already satisfies:
//!
//! - at least one case,
//! - case names unique and never the catch-all marker `_`,
//! - indices contiguous from 0,
//! - every explicit size is non-zero.

use std::fmt;

use rustc_hash::FxHashSet;

use crate::TypeIdx;

/// Name reserved for the catch-all handler at dispatch call sites.
pub const CATCH_ALL: &str = "_";

/// Position of a case in its union's declaration order; also the runtime
/// discriminant.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct CaseIndex(u32);

impl CaseIndex {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Build from a `usize` position, saturating at `u32::MAX`.
    #[inline]
    pub fn from_usize(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CaseIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-case storage request.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CaseStorage {
    /// Follow the union's [`StorageStrategy`].
    #[default]
    Default,
    /// Store in the shared object slot (boxing value types).
    AsSharedObject,
    /// Store inline: in the overlapping block when layout-eligible, otherwise
    /// in a dedicated field.
    Inline,
}

/// Union-wide storage policy for cases without an explicit [`CaseStorage`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StorageStrategy {
    /// Value-type payloads inline, reference payloads in the shared object slot.
    #[default]
    InlineValueTypes,
    /// Every payload in the shared object slot.
    OneObject,
}

/// One declared case.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CaseSpec {
    pub index: CaseIndex,
    pub name: String,
    pub payload: Option<TypeIdx>,
    pub storage: CaseStorage,
    /// Explicit assertion (or denial) that the payload is layout-eligible.
    pub unmanaged_override: Option<bool>,
    /// Explicit byte size of the payload. Implies layout eligibility.
    pub size_override: Option<usize>,
}

impl CaseSpec {
    #[inline]
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }
}

/// Errors raised by [`UnionDefinitionBuilder::build`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    #[error("union `{union}` declares no cases")]
    NoCases { union: String },
    #[error("union `{union}` declares case `{case}` more than once")]
    DuplicateCase { union: String, case: String },
    #[error("union `{union}` uses the reserved name `_` for a case")]
    ReservedCaseName { union: String },
    #[error("union `{union}` declares type parameter `{param}` more than once")]
    DuplicateTypeParam { union: String, param: String },
    #[error("union `{union}` declares a zero-byte block capacity")]
    ZeroCapacity { union: String },
    #[error("case `{case}` of union `{union}` declares a zero-byte size")]
    ZeroCaseSize { union: String, case: String },
}

/// A validated, immutable union declaration.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnionDefinition {
    name: String,
    type_params: Vec<String>,
    cases: Vec<CaseSpec>,
    strategy: StorageStrategy,
    block_capacity: Option<usize>,
    value_equality: bool,
}

impl UnionDefinition {
    /// Start declaring a union.
    pub fn builder(name: impl Into<String>) -> UnionDefinitionBuilder {
        UnionDefinitionBuilder {
            name: name.into(),
            type_params: Vec::new(),
            cases: Vec::new(),
            strategy: StorageStrategy::default(),
            block_capacity: None,
            value_equality: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_params(&self) -> &[String] {
        &self.type_params
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    pub fn cases(&self) -> &[CaseSpec] {
        &self.cases
    }

    /// Number of declared cases (always at least one).
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Always `false`; a definition has at least one case.
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn strategy(&self) -> StorageStrategy {
        self.strategy
    }

    /// Explicit capacity of the overlapping block, if declared.
    pub fn block_capacity(&self) -> Option<usize> {
        self.block_capacity
    }

    /// Whether instances compare by case and payload. When `false` they
    /// compare by identity.
    pub fn value_equality(&self) -> bool {
        self.value_equality
    }

    /// The one case whose payload is `ty`, if exactly one case declares it.
    pub fn unique_case_for(&self, ty: TypeIdx) -> Option<CaseIndex> {
        let mut matching = self.cases.iter().filter(|case| case.payload == Some(ty));
        match (matching.next(), matching.next()) {
            (Some(case), None) => Some(case.index),
            _ => None,
        }
    }

    pub fn case(&self, index: CaseIndex) -> Option<&CaseSpec> {
        self.cases.get(index.index())
    }

    pub fn case_by_name(&self, name: &str) -> Option<&CaseSpec> {
        self.cases.iter().find(|case| case.name == name)
    }

    /// Case names in declaration order.
    pub fn case_names(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.cases.iter().map(|case| case.name.as_str())
    }

    /// Cases that carry a payload, in declaration order.
    pub fn payload_cases(&self) -> impl Iterator<Item = &CaseSpec> + '_ {
        self.cases.iter().filter(|case| case.has_payload())
    }
}

/// Declaration of a single case, consumed by [`UnionDefinitionBuilder::case`].
#[derive(Clone, Debug)]
pub struct CaseDecl {
    name: String,
    payload: Option<TypeIdx>,
    storage: CaseStorage,
    unmanaged_override: Option<bool>,
    size_override: Option<usize>,
}

impl CaseDecl {
    /// A case without payload.
    pub fn new(name: impl Into<String>) -> Self {
        CaseDecl {
            name: name.into(),
            payload: None,
            storage: CaseStorage::Default,
            unmanaged_override: None,
            size_override: None,
        }
    }

    #[must_use]
    pub fn payload(mut self, ty: TypeIdx) -> Self {
        self.payload = Some(ty);
        self
    }

    #[must_use]
    pub fn storage(mut self, storage: CaseStorage) -> Self {
        self.storage = storage;
        self
    }

    #[must_use]
    pub fn unmanaged(mut self, unmanaged: bool) -> Self {
        self.unmanaged_override = Some(unmanaged);
        self
    }

    #[must_use]
    pub fn size(mut self, bytes: usize) -> Self {
        self.size_override = Some(bytes);
        self
    }
}

/// Builder for [`UnionDefinition`].
#[derive(Clone, Debug)]
#[must_use]
pub struct UnionDefinitionBuilder {
    name: String,
    type_params: Vec<String>,
    cases: Vec<CaseDecl>,
    strategy: StorageStrategy,
    block_capacity: Option<usize>,
    value_equality: bool,
}

impl UnionDefinitionBuilder {
    pub fn type_param(mut self, name: impl Into<String>) -> Self {
        self.type_params.push(name.into());
        self
    }

    pub fn strategy(mut self, strategy: StorageStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn block_capacity(mut self, bytes: usize) -> Self {
        self.block_capacity = Some(bytes);
        self
    }

    /// Compare instances by identity instead of by case and payload.
    pub fn disable_value_equality(mut self) -> Self {
        self.value_equality = false;
        self
    }

    pub fn case(mut self, case: CaseDecl) -> Self {
        self.cases.push(case);
        self
    }

    /// Shorthand for a payload-bearing case with default storage.
    pub fn payload_case(self, name: impl Into<String>, ty: TypeIdx) -> Self {
        self.case(CaseDecl::new(name).payload(ty))
    }

    /// Shorthand for a payload-less case.
    pub fn unit_case(self, name: impl Into<String>) -> Self {
        self.case(CaseDecl::new(name))
    }

    /// Validate the declaration and assign case indices.
    pub fn build(self) -> Result<UnionDefinition, DefinitionError> {
        let union = self.name;

        if self.cases.is_empty() {
            return Err(DefinitionError::NoCases { union });
        }

        let mut params = FxHashSet::default();
        for param in &self.type_params {
            if !params.insert(param.as_str()) {
                return Err(DefinitionError::DuplicateTypeParam {
                    union,
                    param: param.clone(),
                });
            }
        }

        if self.block_capacity == Some(0) {
            return Err(DefinitionError::ZeroCapacity { union });
        }

        let mut names = FxHashSet::default();
        let mut cases = Vec::with_capacity(self.cases.len());
        for (position, decl) in self.cases.into_iter().enumerate() {
            if decl.name == CATCH_ALL {
                return Err(DefinitionError::ReservedCaseName { union });
            }
            if !names.insert(decl.name.clone()) {
                return Err(DefinitionError::DuplicateCase {
                    union,
                    case: decl.name,
                });
            }
            if decl.size_override == Some(0) {
                return Err(DefinitionError::ZeroCaseSize {
                    union,
                    case: decl.name,
                });
            }
            cases.push(CaseSpec {
                index: CaseIndex::from_usize(position),
                name: decl.name,
                payload: decl.payload,
                storage: decl.storage,
                unmanaged_override: decl.unmanaged_override,
                size_override: decl.size_override,
            });
        }

        Ok(UnionDefinition {
            name: union,
            type_params: self.type_params,
            cases,
            strategy: self.strategy,
            block_capacity: self.block_capacity,
            value_equality: self.value_equality,
        })
    }
}

#[cfg(test)]
mod tests;
