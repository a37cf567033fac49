//! Runtime errors raised by union instances.

use sumty_diagnostic::{Diagnostic, ErrorCode};
use sumty_ir::{CaseIndex, TypeIdx};

/// A payload type is larger than the union's overlapping block.
///
/// Raised on first use of the type, before any byte is written.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error(
    "the unmanaged type {type_name} requires {required_bytes} bytes of storage but {union_name} has only {available_bytes} bytes available"
)]
pub struct RuntimeCapacityError {
    pub union_name: String,
    pub type_name: String,
    pub required_bytes: usize,
    pub available_bytes: usize,
}

impl From<&RuntimeCapacityError> for Diagnostic {
    fn from(err: &RuntimeCapacityError) -> Self {
        Diagnostic::error(ErrorCode::E3001)
            .with_message(err.to_string())
            .with_suggestion(format!(
                "declare a block capacity of at least {} bytes",
                err.required_bytes
            ))
    }
}

/// Dispatch reached a case with no handler.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("failed to handle case {case_name} of {union_name}")]
pub struct MatchFailure {
    pub union_name: String,
    pub case_name: String,
}

impl From<&MatchFailure> for Diagnostic {
    fn from(err: &MatchFailure) -> Self {
        Diagnostic::error(ErrorCode::E3002)
            .with_message(err.to_string())
            .with_suggestion("handle every case or add a catch-all handler")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConstructError {
    #[error("union {union_name} has no case {case}")]
    UnknownCase { union_name: String, case: CaseIndex },
    #[error("union {union_name} has no case named `{name}`")]
    UnknownCaseName { union_name: String, name: String },
    #[error("case {case} of {union_name} carries no payload")]
    UnexpectedPayload { union_name: String, case: String },
    #[error("case {case} of {union_name} requires a payload")]
    MissingPayload { union_name: String, case: String },
    #[error("case {case} stores its payload as bytes but {type_name} has no byte layout")]
    NotBlittable { case: String, type_name: &'static str },
    #[error("case {case} declares `{declared}`, bound to {bound}, but was given {given}")]
    TypeMismatch {
        case: String,
        declared: String,
        bound: &'static str,
        given: &'static str,
    },
    #[error("union {union_name} has no single case carrying {ty:?}")]
    NoUniqueCase { union_name: String, ty: TypeIdx },
    #[error(transparent)]
    Capacity(#[from] RuntimeCapacityError),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("cannot access case {expected} of {union_name}: the instance holds {actual}")]
    InvalidState {
        union_name: String,
        expected: String,
        actual: String,
    },
    #[error("case {case} holds {stored}, not {requested}")]
    TypeMismatch {
        case: String,
        requested: &'static str,
        stored: &'static str,
    },
    #[error("union {union_name} has no case {case}")]
    UnknownCase { union_name: String, case: CaseIndex },
}

/// A [`Matcher`](crate::Matcher) that could not produce a result.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Unhandled(#[from] MatchFailure),
    /// A payload handler asked for the wrong Rust type.
    #[error(transparent)]
    Access(#[from] AccessError),
}

impl From<&DispatchError> for Diagnostic {
    fn from(err: &DispatchError) -> Self {
        match err {
            DispatchError::Unhandled(failure) => Diagnostic::from(failure),
            DispatchError::Access(access) => {
                Diagnostic::error(ErrorCode::E3002).with_message(access.to_string())
            }
        }
    }
}
