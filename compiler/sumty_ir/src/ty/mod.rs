//! Payload type pool.
//!
//! Every payload type a union case may carry is stored once in a [`TypePool`]
//! and referenced by a 32-bit [`TypeIdx`]. The set of shapes is closed
//! ([`TypeData`]): the layout classifier matches on it exhaustively instead of
//! inspecting types at runtime.
//!
//! # Interning
//!
//! - Primitives are pre-interned at fixed indices (`TypeIdx::I32`, ...).
//! - Structural types (pointers, arrays, enums, classes, interfaces, generic
//!   parameters) are deduplicated, so equal shapes share one index and index
//!   equality is type identity.
//! - Structs are nominal: [`TypePool::declare_struct`] reserves an index by
//!   name and [`TypePool::define_struct`] fills in the fields later. This lets
//!   hosts declare mutually-referencing structs in any order.

use std::fmt;

use rustc_hash::FxHashMap;

/// A 32-bit index into the [`TypePool`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct TypeIdx(u32);

impl TypeIdx {
    // === Primitive Types (indices 0-14) ===
    pub const BOOL: Self = Self(0);
    pub const CHAR: Self = Self(1);
    pub const I8: Self = Self(2);
    pub const U8: Self = Self(3);
    pub const I16: Self = Self(4);
    pub const U16: Self = Self(5);
    pub const I32: Self = Self(6);
    pub const U32: Self = Self(7);
    pub const I64: Self = Self(8);
    pub const U64: Self = Self(9);
    pub const ISIZE: Self = Self(10);
    pub const USIZE: Self = Self(11);
    pub const F32: Self = Self(12);
    pub const F64: Self = Self(13);
    /// The `string` type (heap-allocated, reference semantics).
    pub const STRING: Self = Self(14);

    /// Number of pre-interned primitive types.
    pub const PRIMITIVE_COUNT: u32 = 15;

    /// Create an index from a raw value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Position in the pool's entry table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Check if this is a pre-interned primitive.
    #[inline]
    pub const fn is_primitive(self) -> bool {
        self.0 < Self::PRIMITIVE_COUNT
    }
}

impl fmt::Debug for TypeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match PrimitiveKind::from_idx(*self) {
            Some(kind) => write!(f, "TypeIdx({})", kind.name()),
            None => write!(f, "TypeIdx({})", self.0),
        }
    }
}

/// Built-in scalar kinds, plus `string` (the one built-in reference type).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrimitiveKind {
    Bool,
    Char,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    ISize,
    USize,
    F32,
    F64,
    Str,
}

impl PrimitiveKind {
    /// All kinds, in pre-interned index order.
    pub const ALL: [PrimitiveKind; 15] = [
        PrimitiveKind::Bool,
        PrimitiveKind::Char,
        PrimitiveKind::I8,
        PrimitiveKind::U8,
        PrimitiveKind::I16,
        PrimitiveKind::U16,
        PrimitiveKind::I32,
        PrimitiveKind::U32,
        PrimitiveKind::I64,
        PrimitiveKind::U64,
        PrimitiveKind::ISize,
        PrimitiveKind::USize,
        PrimitiveKind::F32,
        PrimitiveKind::F64,
        PrimitiveKind::Str,
    ];

    /// The fixed pool index of this primitive.
    #[inline]
    pub const fn idx(self) -> TypeIdx {
        TypeIdx(self as u32)
    }

    /// Reverse of [`idx`](Self::idx).
    pub fn from_idx(idx: TypeIdx) -> Option<Self> {
        Self::ALL.get(idx.index()).copied()
    }

    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Char => "char",
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::ISize => "isize",
            PrimitiveKind::USize => "usize",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
            PrimitiveKind::Str => "string",
        }
    }

    /// Byte width on a target with the given pointer width.
    ///
    /// `None` for `string`, which has no inline representation.
    pub const fn size(self, pointer_width: usize) -> Option<usize> {
        match self {
            PrimitiveKind::Bool | PrimitiveKind::I8 | PrimitiveKind::U8 => Some(1),
            PrimitiveKind::I16 | PrimitiveKind::U16 => Some(2),
            PrimitiveKind::Char | PrimitiveKind::I32 | PrimitiveKind::U32 | PrimitiveKind::F32 => {
                Some(4)
            }
            PrimitiveKind::I64 | PrimitiveKind::U64 | PrimitiveKind::F64 => Some(8),
            PrimitiveKind::ISize | PrimitiveKind::USize => Some(pointer_width),
            PrimitiveKind::Str => None,
        }
    }

    /// Integer kinds, the only valid enum representations.
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            PrimitiveKind::I8
                | PrimitiveKind::U8
                | PrimitiveKind::I16
                | PrimitiveKind::U16
                | PrimitiveKind::I32
                | PrimitiveKind::U32
                | PrimitiveKind::I64
                | PrimitiveKind::U64
                | PrimitiveKind::ISize
                | PrimitiveKind::USize
        )
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags::bitflags! {
    /// Constraints declared on a generic type parameter.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct GenericConstraints: u8 {
        /// Every instantiation is a value type.
        const VALUE_TYPE = 1 << 0;
        /// Every instantiation is a reference type.
        const REFERENCE_TYPE = 1 << 1;
        /// Every instantiation has a fixed, pointer-free layout. Implies `VALUE_TYPE`.
        const UNMANAGED = 1 << 2;
        /// Every instantiation is an interface.
        const INTERFACE = 1 << 3;
    }
}

/// Where a struct is defined relative to the union being planned.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Origin {
    /// Same compilation unit: fields can be inspected.
    Local,
    /// Another compilation unit: field layout is opaque.
    External,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructField {
    pub name: String,
    pub ty: TypeIdx,
}

/// The closed set of payload type shapes.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeData {
    Primitive(PrimitiveKind),
    /// Raw pointer to another type.
    Pointer(TypeIdx),
    /// Fieldless enum with an integer representation.
    Enum {
        name: String,
        underlying: PrimitiveKind,
    },
    /// User value type. `fields` is `None` until defined.
    Struct {
        name: String,
        origin: Origin,
        fields: Option<Vec<StructField>>,
    },
    /// User reference type.
    Class { name: String },
    /// Type parameter of the union (or of an enclosing scope).
    Generic {
        name: String,
        constraints: GenericConstraints,
    },
    Array(TypeIdx),
    Interface { name: String },
}

/// Errors raised while populating a [`TypePool`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("enum `{name}` cannot be represented by non-integer type `{underlying}`")]
    InvalidEnumRepr {
        name: String,
        underlying: PrimitiveKind,
    },
    #[error("{0:?} is not a struct")]
    NotAStruct(TypeIdx),
    #[error("struct `{name}` already has fields")]
    AlreadyDefined { name: String },
    #[error("struct `{name}` was already declared with a different origin")]
    ConflictingOrigin { name: String },
    #[error("{0:?} does not belong to this pool")]
    UnknownType(TypeIdx),
}

/// Interned storage for payload types.
#[derive(Clone, Debug)]
pub struct TypePool {
    entries: Vec<TypeData>,
    /// Structural entries, deduplicated by shape.
    interned: FxHashMap<TypeData, TypeIdx>,
    /// Nominal struct entries, by name.
    structs: FxHashMap<String, TypeIdx>,
}

impl Default for TypePool {
    fn default() -> Self {
        Self::new()
    }
}

impl TypePool {
    /// Create a pool holding only the pre-interned primitives.
    pub fn new() -> Self {
        let mut pool = TypePool {
            entries: Vec::with_capacity(64),
            interned: FxHashMap::default(),
            structs: FxHashMap::default(),
        };
        for kind in PrimitiveKind::ALL {
            let idx = pool.push(TypeData::Primitive(kind));
            debug_assert_eq!(idx, kind.idx());
            pool.interned.insert(TypeData::Primitive(kind), idx);
        }
        pool
    }

    fn push(&mut self, data: TypeData) -> TypeIdx {
        let raw = u32::try_from(self.entries.len()).unwrap_or(u32::MAX);
        self.entries.push(data);
        TypeIdx(raw)
    }

    fn intern(&mut self, data: TypeData) -> TypeIdx {
        if let Some(&idx) = self.interned.get(&data) {
            return idx;
        }
        let idx = self.push(data.clone());
        self.interned.insert(data, idx);
        idx
    }

    fn check(&self, idx: TypeIdx) -> Result<TypeIdx, PoolError> {
        if self.contains(idx) {
            Ok(idx)
        } else {
            Err(PoolError::UnknownType(idx))
        }
    }

    /// Number of entries, primitives included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `idx` was issued by this pool.
    pub fn contains(&self, idx: TypeIdx) -> bool {
        idx.index() < self.entries.len()
    }

    /// Look up an entry.
    ///
    /// # Panics
    /// Panics if `idx` was not issued by this pool.
    pub fn get(&self, idx: TypeIdx) -> &TypeData {
        &self.entries[idx.index()]
    }

    pub fn try_get(&self, idx: TypeIdx) -> Option<&TypeData> {
        self.entries.get(idx.index())
    }

    // ── Constructors ────────────────────────────────────────────────

    pub fn pointer(&mut self, pointee: TypeIdx) -> Result<TypeIdx, PoolError> {
        self.check(pointee)?;
        Ok(self.intern(TypeData::Pointer(pointee)))
    }

    pub fn array(&mut self, elem: TypeIdx) -> Result<TypeIdx, PoolError> {
        self.check(elem)?;
        Ok(self.intern(TypeData::Array(elem)))
    }

    pub fn enum_type(
        &mut self,
        name: impl Into<String>,
        underlying: PrimitiveKind,
    ) -> Result<TypeIdx, PoolError> {
        let name = name.into();
        if !underlying.is_integer() {
            return Err(PoolError::InvalidEnumRepr { name, underlying });
        }
        Ok(self.intern(TypeData::Enum { name, underlying }))
    }

    pub fn class(&mut self, name: impl Into<String>) -> TypeIdx {
        self.intern(TypeData::Class { name: name.into() })
    }

    pub fn interface(&mut self, name: impl Into<String>) -> TypeIdx {
        self.intern(TypeData::Interface { name: name.into() })
    }

    pub fn generic(&mut self, name: impl Into<String>, constraints: GenericConstraints) -> TypeIdx {
        self.intern(TypeData::Generic {
            name: name.into(),
            constraints,
        })
    }

    /// Reserve a struct by name, returning the existing index on redeclaration.
    pub fn declare_struct(
        &mut self,
        name: impl Into<String>,
        origin: Origin,
    ) -> Result<TypeIdx, PoolError> {
        let name = name.into();
        if let Some(&idx) = self.structs.get(&name) {
            return match self.get(idx) {
                TypeData::Struct { origin: existing, .. } if *existing == origin => Ok(idx),
                _ => Err(PoolError::ConflictingOrigin { name }),
            };
        }
        let idx = self.push(TypeData::Struct {
            name: name.clone(),
            origin,
            fields: None,
        });
        self.structs.insert(name, idx);
        Ok(idx)
    }

    /// Set the fields of a declared struct. Fields can be set once.
    pub fn define_struct<N: Into<String>>(
        &mut self,
        idx: TypeIdx,
        fields: impl IntoIterator<Item = (N, TypeIdx)>,
    ) -> Result<(), PoolError> {
        let fields = fields
            .into_iter()
            .map(|(name, ty)| {
                self.check(ty).map(|ty| StructField {
                    name: name.into(),
                    ty,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        match self.entries.get_mut(idx.index()) {
            Some(TypeData::Struct {
                fields: slot @ None,
                ..
            }) => {
                *slot = Some(fields);
                Ok(())
            }
            Some(TypeData::Struct { name, .. }) => {
                Err(PoolError::AlreadyDefined { name: name.clone() })
            }
            Some(_) => Err(PoolError::NotAStruct(idx)),
            None => Err(PoolError::UnknownType(idx)),
        }
    }

    /// Declare and define a struct in one step.
    pub fn struct_type<N: Into<String>>(
        &mut self,
        name: impl Into<String>,
        origin: Origin,
        fields: impl IntoIterator<Item = (N, TypeIdx)>,
    ) -> Result<TypeIdx, PoolError> {
        let idx = self.declare_struct(name, origin)?;
        self.define_struct(idx, fields)?;
        Ok(idx)
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Look up a struct by name.
    pub fn struct_named(&self, name: &str) -> Option<TypeIdx> {
        self.structs.get(name).copied()
    }

    /// Human-readable type name, e.g. `*const i32` or `[Point]`.
    pub fn display(&self, idx: TypeIdx) -> String {
        let mut out = String::new();
        self.write_name(idx, &mut out);
        out
    }

    /// Pointer and array chains are peeled in a loop, so arbitrarily deep
    /// chains render in linear time without recursion.
    fn write_name(&self, idx: TypeIdx, out: &mut String) {
        let mut arrays = 0usize;
        let mut current = idx;
        loop {
            match self.try_get(current) {
                Some(TypeData::Pointer(pointee)) => {
                    out.push_str("*const ");
                    current = *pointee;
                }
                Some(TypeData::Array(elem)) => {
                    out.push('[');
                    arrays += 1;
                    current = *elem;
                }
                None => {
                    out.push_str("<unknown>");
                    break;
                }
                Some(TypeData::Primitive(kind)) => {
                    out.push_str(kind.name());
                    break;
                }
                Some(
                    TypeData::Enum { name, .. }
                    | TypeData::Struct { name, .. }
                    | TypeData::Class { name }
                    | TypeData::Generic { name, .. }
                    | TypeData::Interface { name },
                ) => {
                    out.push_str(name);
                    break;
                }
            }
        }
        for _ in 0..arrays {
            out.push(']');
        }
    }
}

#[cfg(test)]
mod tests;
