//! Exhaustiveness checks for union dispatch call sites.
//!
//! A call site passes handlers to a union's dispatch, each bound either by
//! case name (or the `_` catch-all) or by position. [`check_call_site`]
//! compares those handlers with the union's declared cases and reports
//! missing cases, unreachable catch-alls, positional bindings, handlers that
//! name no case and cases handled twice. Every finding is an advisory
//! warning; an unhandled case surfaces at runtime as a match failure.
//!
//! Checks share no state, so [`check_call_sites`] runs them in parallel.

mod call_site;
mod check;

pub use call_site::{CallSite, HandlerArg};
pub use check::{
    check_call_site, check_call_sites, check_union_call, ExhaustivenessDiagnostic, RuleId,
};
