//! Lowering of [`DefinitionError`] into diagnostics.
//!
//! Definition errors carry no span of their own; the host attaches one with
//! [`Diagnostic::with_label`] when it knows where the declaration lives.

use sumty_ir::DefinitionError;

use crate::{Diagnostic, ErrorCode};

impl DefinitionErrorExt for DefinitionError {
    fn code(&self) -> ErrorCode {
        match self {
            DefinitionError::NoCases { .. } => ErrorCode::E1001,
            DefinitionError::DuplicateCase { .. } => ErrorCode::E1002,
            DefinitionError::ReservedCaseName { .. } => ErrorCode::E1003,
            DefinitionError::DuplicateTypeParam { .. } => ErrorCode::E1004,
            DefinitionError::ZeroCapacity { .. } | DefinitionError::ZeroCaseSize { .. } => {
                ErrorCode::E1005
            }
        }
    }
}

/// Error-code lookup for [`DefinitionError`], which lives upstream of this crate.
pub trait DefinitionErrorExt {
    fn code(&self) -> ErrorCode;
}

impl From<&DefinitionError> for Diagnostic {
    fn from(err: &DefinitionError) -> Self {
        let diag = Diagnostic::error(err.code()).with_message(err.to_string());
        match err {
            DefinitionError::NoCases { .. } => {
                diag.with_suggestion("declare at least one case")
            }
            DefinitionError::ReservedCaseName { .. } => {
                diag.with_note("`_` is the catch-all handler name at dispatch sites")
            }
            _ => diag,
        }
    }
}

impl From<DefinitionError> for Diagnostic {
    fn from(err: DefinitionError) -> Self {
        Diagnostic::from(&err)
    }
}
