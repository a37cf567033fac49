//! Payload type eligibility classifier.
//!
//! Walks the type pool to decide, for each payload type, whether it is a value
//! or reference type, whether its bytes can be stored in the overlapping block
//! ("unmanaged": fixed layout, no references anywhere inside), and its static
//! size when one can be proven.
//!
//! Struct fields are followed recursively. Results are memoized and in-progress
//! types are tracked, so a value type that contains itself (directly or through
//! other value types) terminates and is classified as not eligible.

use std::cell::RefCell;

use rustc_hash::{FxHashMap, FxHashSet};
use sumty_ir::{GenericConstraints, Origin, PrimitiveKind, TypeData, TypeIdx, TypePool};

/// Target parameters that affect type sizes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetInfo {
    /// Width of pointers and `isize`/`usize`, in bytes.
    pub pointer_width: usize,
}

impl TargetInfo {
    pub const fn new(pointer_width: usize) -> Self {
        TargetInfo { pointer_width }
    }

    /// The target this crate was compiled for.
    pub const fn host() -> Self {
        TargetInfo {
            pointer_width: std::mem::size_of::<usize>(),
        }
    }
}

impl Default for TargetInfo {
    fn default() -> Self {
        TargetInfo { pointer_width: 8 }
    }
}

/// Coarse shape of a payload type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeKind {
    ConcreteValueType,
    ConcreteReferenceType,
    ArrayType,
    GenericParameter,
    Interface,
}

/// Whether every instantiation of a type is a value type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueCategory {
    Value,
    Reference,
    /// Unconstrained generic parameter.
    Either,
}

/// Classification result for one payload type.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeDescriptor {
    pub ty: TypeIdx,
    pub display_name: String,
    pub kind: TypeKind,
    pub value_category: ValueCategory,
    /// Fixed layout with no references anywhere inside.
    pub recursively_unmanaged: bool,
    pub static_size: Option<usize>,
    pub alignment: Option<usize>,
}

impl TypeDescriptor {
    #[inline]
    pub fn is_generic(&self) -> bool {
        self.kind == TypeKind::GenericParameter
    }

    #[inline]
    pub fn is_always_value_type(&self) -> bool {
        self.value_category == ValueCategory::Value
    }

    /// References, arrays and interfaces can never be rebuilt from bytes,
    /// whatever a case declares about them.
    pub fn may_live_in_block(&self) -> bool {
        match self.kind {
            TypeKind::ConcreteValueType => true,
            TypeKind::GenericParameter => self.value_category != ValueCategory::Reference,
            TypeKind::ConcreteReferenceType | TypeKind::ArrayType | TypeKind::Interface => false,
        }
    }
}

/// Eligibility classifier over a [`TypePool`].
///
/// Uses `RefCell` for the cache and cycle-detection set so classification
/// can take `&self` while recursing through struct fields.
pub struct EligibilityClassifier<'pool> {
    pool: &'pool TypePool,
    target: TargetInfo,
    cache: RefCell<FxHashMap<TypeIdx, TypeDescriptor>>,
    /// Structs currently being classified. Meeting one again means the
    /// value type contains itself.
    classifying: RefCell<FxHashSet<TypeIdx>>,
}

impl<'pool> EligibilityClassifier<'pool> {
    pub fn new(pool: &'pool TypePool, target: TargetInfo) -> Self {
        Self {
            pool,
            target,
            cache: RefCell::new(FxHashMap::default()),
            classifying: RefCell::new(FxHashSet::default()),
        }
    }

    pub fn pool(&self) -> &'pool TypePool {
        self.pool
    }

    pub fn target(&self) -> TargetInfo {
        self.target
    }

    /// Classify a payload type. `None` if `idx` does not belong to the pool.
    pub fn classify(&self, idx: TypeIdx) -> Option<TypeDescriptor> {
        self.pool.contains(idx).then(|| self.describe(idx))
    }

    /// Shorthand for `classify(idx).is_some_and(|d| d.recursively_unmanaged)`.
    pub fn is_unmanaged(&self, idx: TypeIdx) -> bool {
        self.classify(idx).is_some_and(|d| d.recursively_unmanaged)
    }

    fn describe(&self, idx: TypeIdx) -> TypeDescriptor {
        if let Some(cached) = self.cache.borrow().get(&idx) {
            return cached.clone();
        }

        if !self.classifying.borrow_mut().insert(idx) {
            tracing::trace!(ty = %self.pool.display(idx), "value type contains itself");
            return self.cyclic(idx);
        }

        let result = sumty_stack::ensure_sufficient_stack(|| self.describe_by_shape(idx));

        self.classifying.borrow_mut().remove(&idx);
        self.cache.borrow_mut().insert(idx, result.clone());
        result
    }

    fn cyclic(&self, idx: TypeIdx) -> TypeDescriptor {
        TypeDescriptor {
            ty: idx,
            display_name: self.pool.display(idx),
            kind: TypeKind::ConcreteValueType,
            value_category: ValueCategory::Value,
            recursively_unmanaged: false,
            static_size: None,
            alignment: None,
        }
    }

    fn describe_by_shape(&self, idx: TypeIdx) -> TypeDescriptor {
        let display_name = self.pool.display(idx);
        let ptr = self.target.pointer_width;

        let (kind, value_category, unmanaged, size, align) = match self.pool.get(idx) {
            TypeData::Primitive(PrimitiveKind::Str) => (
                TypeKind::ConcreteReferenceType,
                ValueCategory::Reference,
                false,
                None,
                None,
            ),
            TypeData::Primitive(kind) => {
                let size = kind.size(ptr);
                (TypeKind::ConcreteValueType, ValueCategory::Value, true, size, size)
            }
            TypeData::Pointer(_) => (
                TypeKind::ConcreteValueType,
                ValueCategory::Value,
                true,
                Some(ptr),
                Some(ptr),
            ),
            TypeData::Enum { underlying, .. } => {
                let size = underlying.size(ptr);
                (TypeKind::ConcreteValueType, ValueCategory::Value, true, size, size)
            }
            TypeData::Struct {
                origin: Origin::Local,
                fields: Some(fields),
                ..
            } => {
                let mut unmanaged = true;
                let mut layout = Some(Vec::with_capacity(fields.len()));
                for field in fields {
                    let desc = self.describe(field.ty);
                    unmanaged &= desc.recursively_unmanaged;
                    layout = match (layout, desc.static_size, desc.alignment) {
                        (Some(mut acc), Some(size), Some(align)) => {
                            acc.push((size, align));
                            Some(acc)
                        }
                        _ => None,
                    };
                }
                let (size, align) = match layout.map(sequential_layout) {
                    Some((size, align)) => (Some(size), Some(align)),
                    None => (None, None),
                };
                (TypeKind::ConcreteValueType, ValueCategory::Value, unmanaged, size, align)
            }
            // Declared but never defined, or defined in another unit: the
            // field layout cannot be inspected.
            TypeData::Struct { .. } => (
                TypeKind::ConcreteValueType,
                ValueCategory::Value,
                false,
                None,
                None,
            ),
            TypeData::Class { .. } => (
                TypeKind::ConcreteReferenceType,
                ValueCategory::Reference,
                false,
                None,
                None,
            ),
            TypeData::Array(_) => (
                TypeKind::ArrayType,
                ValueCategory::Reference,
                false,
                None,
                None,
            ),
            TypeData::Interface { .. } => (
                TypeKind::Interface,
                ValueCategory::Reference,
                false,
                None,
                None,
            ),
            TypeData::Generic { constraints, .. } => {
                let unmanaged = constraints.contains(GenericConstraints::UNMANAGED);
                let category = generic_category(*constraints);
                (TypeKind::GenericParameter, category, unmanaged, None, None)
            }
        };

        TypeDescriptor {
            ty: idx,
            display_name,
            kind,
            value_category,
            recursively_unmanaged: unmanaged,
            static_size: size,
            alignment: align,
        }
    }
}

fn generic_category(constraints: GenericConstraints) -> ValueCategory {
    if constraints.intersects(GenericConstraints::UNMANAGED | GenericConstraints::VALUE_TYPE) {
        ValueCategory::Value
    } else if constraints
        .intersects(GenericConstraints::REFERENCE_TYPE | GenericConstraints::INTERFACE)
    {
        ValueCategory::Reference
    } else {
        ValueCategory::Either
    }
}

/// C-like sequential layout of `(size, align)` fields: each field at the next
/// multiple of its alignment, total rounded up to the largest alignment.
/// Returns `(size, align)`; an empty struct occupies one byte.
pub fn sequential_layout(fields: impl IntoIterator<Item = (usize, usize)>) -> (usize, usize) {
    let mut offset = 0usize;
    let mut max_align = 1usize;
    for (size, align) in fields {
        let align = align.max(1);
        offset = offset.next_multiple_of(align).saturating_add(size);
        max_align = max_align.max(align);
    }
    if offset == 0 {
        return (1, 1);
    }
    (offset.next_multiple_of(max_align), max_align)
}

#[cfg(test)]
mod tests;
