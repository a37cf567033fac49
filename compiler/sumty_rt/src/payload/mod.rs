//! Payload values carried by union cases.
//!
//! Any `'static` value can be a payload once it implements [`Payload`]:
//! structural equality, hashing, and optionally a [`Blit`] describing how to
//! write it to and read it back from raw bytes. Only blittable payloads can be
//! stored in an overlapping block.
//!
//! Instances store payloads type-erased, through [`DynPayload`].

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Byte codec for a fixed-layout payload.
pub struct Blit<T> {
    /// Bytes written by `write` and consumed by `read`.
    pub size: usize,
    /// Write the value to the front of the buffer. The buffer holds at least
    /// `size` bytes.
    pub write: fn(&T, &mut [u8]),
    /// Read a value back. `None` if the bytes are too short or invalid.
    pub read: fn(&[u8]) -> Option<T>,
}

impl<T> Clone for Blit<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Blit<T> {}

impl<T> fmt::Debug for Blit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blit").field("size", &self.size).finish()
    }
}

/// A value that can be stored in a union case.
pub trait Payload: Any + Clone + fmt::Debug + Send + Sync {
    /// Byte codec, for payloads with a fixed, reference-free layout.
    const BLIT: Option<Blit<Self>> = None;

    /// Structural equality. Must be reflexive.
    fn payload_eq(&self, other: &Self) -> bool;

    /// Hash consistent with [`payload_eq`](Self::payload_eq).
    fn payload_hash(&self, state: &mut dyn Hasher);
}

/// Copy `bytes` to the front of `buf`, if it fits.
pub fn write_bytes(buf: &mut [u8], bytes: &[u8]) {
    if let Some(dst) = buf.get_mut(..bytes.len()) {
        dst.copy_from_slice(bytes);
    }
}

/// The first `N` bytes of `buf` as an array.
pub fn read_array<const N: usize>(buf: &[u8]) -> Option<[u8; N]> {
    buf.get(..N)?.try_into().ok()
}

macro_rules! int_payload {
    ($($ty:ty),* $(,)?) => {$(
        impl Payload for $ty {
            const BLIT: Option<Blit<Self>> = Some(Blit {
                size: std::mem::size_of::<$ty>(),
                write: |value, buf| write_bytes(buf, &value.to_le_bytes()),
                read: |buf| read_array(buf).map(<$ty>::from_le_bytes),
            });

            fn payload_eq(&self, other: &Self) -> bool {
                self == other
            }

            fn payload_hash(&self, mut state: &mut dyn Hasher) {
                self.hash(&mut state);
            }
        }
    )*};
}

int_payload!(i8, u8, i16, u16, i32, u32, i64, u64, i128, u128, isize, usize);

// NaN equals NaN and -0.0 equals 0.0, so equality stays reflexive and
// hashing stays consistent with it.
macro_rules! float_payload {
    ($($ty:ty),* $(,)?) => {$(
        impl Payload for $ty {
            const BLIT: Option<Blit<Self>> = Some(Blit {
                size: std::mem::size_of::<$ty>(),
                write: |value, buf| write_bytes(buf, &value.to_le_bytes()),
                read: |buf| read_array(buf).map(<$ty>::from_le_bytes),
            });

            fn payload_eq(&self, other: &Self) -> bool {
                self == other || (self.is_nan() && other.is_nan())
            }

            fn payload_hash(&self, mut state: &mut dyn Hasher) {
                let canonical = if self.is_nan() {
                    <$ty>::NAN
                } else if *self == 0.0 {
                    0.0
                } else {
                    *self
                };
                canonical.to_bits().hash(&mut state);
            }
        }
    )*};
}

float_payload!(f32, f64);

impl Payload for bool {
    const BLIT: Option<Blit<Self>> = Some(Blit {
        size: 1,
        write: |value, buf| write_bytes(buf, &[u8::from(*value)]),
        read: |buf| match buf.first() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
    });

    fn payload_eq(&self, other: &Self) -> bool {
        self == other
    }

    fn payload_hash(&self, mut state: &mut dyn Hasher) {
        self.hash(&mut state);
    }
}

impl Payload for char {
    const BLIT: Option<Blit<Self>> = Some(Blit {
        size: 4,
        write: |value, buf| write_bytes(buf, &u32::from(*value).to_le_bytes()),
        read: |buf| read_array(buf).map(u32::from_le_bytes).and_then(char::from_u32),
    });

    fn payload_eq(&self, other: &Self) -> bool {
        self == other
    }

    fn payload_hash(&self, mut state: &mut dyn Hasher) {
        self.hash(&mut state);
    }
}

macro_rules! managed_payload {
    ($($ty:ty),* $(,)?) => {$(
        impl Payload for $ty {
            fn payload_eq(&self, other: &Self) -> bool {
                self == other
            }

            fn payload_hash(&self, mut state: &mut dyn Hasher) {
                self.hash(&mut state);
            }
        }
    )*};
}

managed_payload!(String, &'static str, Arc<str>);

impl<T: Payload> Payload for Vec<T> {
    fn payload_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.payload_eq(b))
    }

    fn payload_hash(&self, mut state: &mut dyn Hasher) {
        self.len().hash(&mut state);
        for item in self {
            item.payload_hash(state);
        }
    }
}

impl<T: Payload> Payload for Option<T> {
    fn payload_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.payload_eq(b),
            (None, None) => true,
            _ => false,
        }
    }

    fn payload_hash(&self, mut state: &mut dyn Hasher) {
        self.is_some().hash(&mut state);
        if let Some(value) = self {
            value.payload_hash(state);
        }
    }
}

/// Object-safe view of a [`Payload`].
pub trait DynPayload: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// Equal iff `other` holds the same Rust type and the values are equal.
    fn dyn_eq(&self, other: &dyn DynPayload) -> bool;

    fn dyn_hash(&self, state: &mut dyn Hasher);

    fn clone_boxed(&self) -> Box<dyn DynPayload>;

    fn type_name(&self) -> &'static str;
}

impl<T: Payload> DynPayload for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn DynPayload) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self.payload_eq(other))
    }

    fn dyn_hash(&self, state: &mut dyn Hasher) {
        self.payload_hash(state);
    }

    fn clone_boxed(&self) -> Box<dyn DynPayload> {
        Box::new(self.clone())
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}
