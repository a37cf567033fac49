//! Diagnostic system for sumty.
//!
//! Every failure the workspace can report can be lowered to one
//! [`Diagnostic`] shape: an [`ErrorCode`] for searchability, a [`Severity`],
//! a message saying what went wrong, labelled spans saying where (when the
//! host knows), and any notes or suggestions.
//!
//! Producers live in the crates that detect the problem; this crate owns the
//! shared vocabulary plus the lowering of definition errors, which every
//! producer sees first.

mod definition;
mod diagnostic;
mod error_code;

pub use definition::DefinitionErrorExt;
pub use diagnostic::{bracketed_list, Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
