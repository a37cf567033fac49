//! Call-site rules.
//!
//! Handlers resolve to case ordinals first; the rules then look only at
//! which ordinals were bound, how, and how often.

use std::fmt;

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use sumty_diagnostic::{bracketed_list, Diagnostic, ErrorCode};
use sumty_ir::{Span, UnionDefinition, CATCH_ALL};

use crate::call_site::{CallSite, HandlerArg};

/// Which rule a finding comes from.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum RuleId {
    /// Some cases have no handler and there is no catch-all.
    NonExhaustive,
    /// Every case is handled, so the catch-all never runs.
    RedundantDefault,
    /// Handlers bound by position.
    PreferNamedBinding,
    /// A handler names no declared case.
    UnknownHandler,
    /// A case is handled more than once.
    DuplicateHandler,
}

impl RuleId {
    pub fn code(self) -> ErrorCode {
        match self {
            RuleId::NonExhaustive => ErrorCode::W1001,
            RuleId::RedundantDefault => ErrorCode::W1002,
            RuleId::PreferNamedBinding => ErrorCode::W1003,
            RuleId::UnknownHandler => ErrorCode::W1004,
            RuleId::DuplicateHandler => ErrorCode::W1005,
        }
    }
}

/// One finding at one call site.
///
/// `case_names` depends on the rule: the missing cases, the positionally
/// bound cases, the unresolved handlers (`#n` for a position past the last
/// case) or the cases handled twice. Empty for `RedundantDefault`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ExhaustivenessDiagnostic {
    pub rule: RuleId,
    pub span: Span,
    pub case_names: Vec<String>,
}

impl ExhaustivenessDiagnostic {
    fn new(rule: RuleId, span: Span, case_names: Vec<String>) -> Self {
        ExhaustivenessDiagnostic {
            rule,
            span,
            case_names,
        }
    }

    fn names(&self) -> String {
        bracketed_list(self.case_names.iter().map(String::as_str))
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let names = self.names();
        let diag = Diagnostic::warning(self.rule.code());
        match self.rule {
            RuleId::NonExhaustive => diag
                .with_message(format!("non-exhaustive dispatch: missing handlers for {names}"))
                .with_label(self.span, "not all cases are handled")
                .with_suggestion(format!("add handlers for {names} or a `{CATCH_ALL}` catch-all")),
            RuleId::RedundantDefault => diag
                .with_message(format!("the `{CATCH_ALL}` handler can never run"))
                .with_label(self.span, "every case already has a handler")
                .with_suggestion(format!("remove the `{CATCH_ALL}` handler")),
            RuleId::PreferNamedBinding => diag
                .with_message(format!("handlers for {names} are bound by position"))
                .with_label(self.span, "positional handlers")
                .with_note("positional handlers silently change meaning when cases are reordered")
                .with_suggestion("bind each handler by case name"),
            RuleId::UnknownHandler => diag
                .with_message(format!("handlers {names} match no declared case"))
                .with_label(self.span, "unknown handler"),
            RuleId::DuplicateHandler => diag
                .with_message(format!("cases {names} are handled more than once"))
                .with_label(self.span, "duplicate handler")
                .with_note("only the first handler for a case runs"),
        }
    }
}

impl From<&ExhaustivenessDiagnostic> for Diagnostic {
    fn from(diag: &ExhaustivenessDiagnostic) -> Self {
        diag.to_diagnostic()
    }
}

impl fmt::Display for ExhaustivenessDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.rule)?;
        if !self.case_names.is_empty() {
            write!(f, " {}", self.names())?;
        }
        Ok(())
    }
}

/// A handler argument after resolution.
enum Resolved {
    Case { ordinal: usize, positional: bool },
    CatchAll,
    Unknown(String),
}

fn resolve<S: AsRef<str>>(
    case_names: &[S],
    by_name: &FxHashMap<&str, usize>,
    position: usize,
    arg: &HandlerArg,
) -> Resolved {
    match arg {
        HandlerArg::Named(name) if name == CATCH_ALL => Resolved::CatchAll,
        HandlerArg::Named(name) => match by_name.get(name.as_str()) {
            Some(&ordinal) => Resolved::Case {
                ordinal,
                positional: false,
            },
            None => Resolved::Unknown(name.clone()),
        },
        HandlerArg::Positional if position < case_names.len() => Resolved::Case {
            ordinal: position,
            positional: true,
        },
        HandlerArg::Positional => Resolved::Unknown(format!("#{position}")),
    }
}

/// Check one call site against a union's cases, in declaration order.
///
/// Findings come out in rule order: `NonExhaustive` or `RedundantDefault`,
/// then `PreferNamedBinding`, `UnknownHandler`, `DuplicateHandler`.
pub fn check_call_site<S: AsRef<str>>(
    case_names: &[S],
    call: &CallSite,
) -> Vec<ExhaustivenessDiagnostic> {
    let by_name: FxHashMap<&str, usize> = case_names
        .iter()
        .enumerate()
        .map(|(ordinal, name)| (name.as_ref(), ordinal))
        .collect();

    let mut bound = vec![0u32; case_names.len()];
    let mut catch_alls = 0u32;
    let mut positional: SmallVec<[usize; 8]> = SmallVec::new();
    let mut unknown = Vec::new();

    for (position, arg) in call.args.iter().enumerate() {
        match resolve(case_names, &by_name, position, arg) {
            Resolved::Case {
                ordinal,
                positional: by_position,
            } => {
                bound[ordinal] += 1;
                if by_position {
                    positional.push(ordinal);
                }
            }
            Resolved::CatchAll => catch_alls += 1,
            Resolved::Unknown(label) => unknown.push(label),
        }
    }

    let name_of = |ordinal: usize| case_names[ordinal].as_ref().to_string();
    let mut findings = Vec::new();

    let missing: Vec<String> = (0..case_names.len())
        .filter(|&ordinal| bound[ordinal] == 0)
        .map(name_of)
        .collect();
    if !missing.is_empty() && catch_alls == 0 {
        findings.push(ExhaustivenessDiagnostic::new(
            RuleId::NonExhaustive,
            call.span,
            missing,
        ));
    } else if missing.is_empty() && catch_alls > 0 {
        findings.push(ExhaustivenessDiagnostic::new(
            RuleId::RedundantDefault,
            call.span,
            Vec::new(),
        ));
    }

    if !positional.is_empty() {
        findings.push(ExhaustivenessDiagnostic::new(
            RuleId::PreferNamedBinding,
            call.span,
            positional.into_iter().map(name_of).collect(),
        ));
    }

    if !unknown.is_empty() {
        findings.push(ExhaustivenessDiagnostic::new(
            RuleId::UnknownHandler,
            call.span,
            unknown,
        ));
    }

    let mut duplicates: Vec<String> = (0..case_names.len())
        .filter(|&ordinal| bound[ordinal] > 1)
        .map(name_of)
        .collect();
    if catch_alls > 1 {
        duplicates.push(CATCH_ALL.to_string());
    }
    if !duplicates.is_empty() {
        findings.push(ExhaustivenessDiagnostic::new(
            RuleId::DuplicateHandler,
            call.span,
            duplicates,
        ));
    }

    tracing::trace!(call = %call, findings = findings.len(), "checked call site");
    findings
}

/// Check a call site against a declared union.
pub fn check_union_call(
    definition: &UnionDefinition,
    call: &CallSite,
) -> Vec<ExhaustivenessDiagnostic> {
    let names: SmallVec<[&str; 8]> = definition.case_names().collect();
    check_call_site(&names, call)
}

/// Check many call sites in parallel. Results are in input order.
pub fn check_call_sites<S: AsRef<str> + Sync>(
    case_names: &[S],
    calls: &[CallSite],
) -> Vec<Vec<ExhaustivenessDiagnostic>> {
    tracing::debug!(calls = calls.len(), "checking call sites");
    calls
        .par_iter()
        .map(|call| check_call_site(case_names, call))
        .collect()
}

#[cfg(test)]
mod tests;
