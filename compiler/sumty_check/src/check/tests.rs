#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

const ABC: [&str; 3] = ["A", "B", "C"];

fn span() -> Span {
    Span::new(10, 20)
}

fn check_named(names: &[&str]) -> Vec<ExhaustivenessDiagnostic> {
    check_call_site(&ABC, &CallSite::named(span(), names.iter().copied()))
}

fn rules(findings: &[ExhaustivenessDiagnostic]) -> Vec<RuleId> {
    findings.iter().map(|d| d.rule).collect()
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

#[test]
fn missing_case_is_non_exhaustive() {
    assert_eq!(
        check_named(&["A", "B"]),
        vec![ExhaustivenessDiagnostic {
            rule: RuleId::NonExhaustive,
            span: span(),
            case_names: strings(&["C"]),
        }]
    );
}

#[test]
fn missing_cases_in_declaration_order() {
    let findings = check_named(&["B"]);
    assert_eq!(findings[0].case_names, strings(&["A", "C"]));
}

#[test]
fn all_cases_handled_is_clean() {
    assert!(check_named(&["A", "B", "C"]).is_empty());
    assert!(check_named(&["C", "A", "B"]).is_empty());
}

#[test]
fn catch_all_covers_missing_cases() {
    assert!(check_named(&["A", "_"]).is_empty());
    assert!(check_named(&["_"]).is_empty());
}

#[test]
fn catch_all_after_every_case_is_redundant() {
    assert_eq!(
        rules(&check_named(&["A", "B", "C", "_"])),
        vec![RuleId::RedundantDefault]
    );
}

#[test]
fn positional_binding_is_advised() {
    let findings = check_call_site(&ABC, &CallSite::positional(span(), 3));
    assert_eq!(
        findings,
        vec![ExhaustivenessDiagnostic {
            rule: RuleId::PreferNamedBinding,
            span: span(),
            case_names: strings(&["A", "B", "C"]),
        }]
    );
}

#[test]
fn positions_count_named_arguments_too() {
    let call = CallSite::new(
        span(),
        [HandlerArg::named("A"), HandlerArg::Positional, HandlerArg::catch_all()],
    );
    let findings = check_call_site(&ABC, &call);
    assert_eq!(
        rules(&findings),
        vec![RuleId::PreferNamedBinding]
    );
    assert_eq!(findings[0].case_names, strings(&["B"]));
}

#[test]
fn positional_short_of_every_case() {
    let findings = check_call_site(&ABC, &CallSite::positional(span(), 2));
    assert_eq!(
        rules(&findings),
        vec![RuleId::NonExhaustive, RuleId::PreferNamedBinding]
    );
    assert_eq!(findings[0].case_names, strings(&["C"]));
    assert_eq!(findings[1].case_names, strings(&["A", "B"]));
}

#[test]
fn unknown_handlers_resolve_to_nothing() {
    let findings = check_call_site(&ABC, &CallSite::positional(span(), 4));
    assert_eq!(
        rules(&findings),
        vec![RuleId::PreferNamedBinding, RuleId::UnknownHandler]
    );
    assert_eq!(findings[1].case_names, strings(&["#3"]));

    let findings = check_named(&["A", "B", "D"]);
    assert_eq!(
        rules(&findings),
        vec![RuleId::NonExhaustive, RuleId::UnknownHandler]
    );
    assert_eq!(findings[1].case_names, strings(&["D"]));
}

#[test]
fn case_bound_twice_is_duplicate() {
    let call = CallSite::new(
        span(),
        [
            HandlerArg::Positional,
            HandlerArg::named("A"),
            HandlerArg::named("B"),
            HandlerArg::named("C"),
        ],
    );
    let findings = check_call_site(&ABC, &call);
    assert_eq!(
        rules(&findings),
        vec![RuleId::PreferNamedBinding, RuleId::DuplicateHandler]
    );
    assert_eq!(findings[1].case_names, strings(&["A"]));

    let findings = check_named(&["_", "_"]);
    assert_eq!(rules(&findings), vec![RuleId::DuplicateHandler]);
    assert_eq!(findings[0].case_names, strings(&["_"]));
}

#[test]
fn union_definitions_can_be_checked_directly() {
    let def = UnionDefinition::builder("Shape")
        .payload_case("Circle", sumty_ir::TypeIdx::F64)
        .unit_case("Empty")
        .build()
        .unwrap();
    let findings = check_union_call(&def, &CallSite::named(span(), ["Circle"]));
    assert_eq!(findings[0].case_names, strings(&["Empty"]));
}

#[test]
fn parallel_results_keep_input_order() {
    let calls: Vec<CallSite> = (0..64)
        .map(|i| {
            if i % 2 == 0 {
                CallSite::named(Span::new(i, i + 1), ["A"])
            } else {
                CallSite::named(Span::new(i, i + 1), ["A", "B", "C"])
            }
        })
        .collect();

    let results = check_call_sites(&ABC, &calls);
    assert_eq!(results.len(), 64);
    for (i, findings) in results.iter().enumerate() {
        if i % 2 == 0 {
            assert_eq!(findings.len(), 1);
            assert_eq!(findings[0].span, calls[i].span);
        } else {
            assert!(findings.is_empty());
        }
    }
}

#[test]
fn diagnostics_carry_codes_and_names() {
    let findings = check_named(&["A"]);
    let diag = findings[0].to_diagnostic();
    assert_eq!(diag.code, ErrorCode::W1001);
    assert!(!diag.is_error());
    assert_eq!(
        diag.message,
        "non-exhaustive dispatch: missing handlers for [B, C]"
    );
    assert_eq!(diag.primary_span(), Some(span()));

    let redundant = Diagnostic::from(&check_named(&["A", "B", "C", "_"])[0]);
    assert_eq!(redundant.code, ErrorCode::W1002);
}

#[test]
fn rule_codes() {
    assert_eq!(RuleId::PreferNamedBinding.code(), ErrorCode::W1003);
    assert_eq!(RuleId::UnknownHandler.code(), ErrorCode::W1004);
    assert_eq!(RuleId::DuplicateHandler.code(), ErrorCode::W1005);
}

#[test]
fn display() {
    assert_eq!(check_named(&["A"])[0].to_string(), "NonExhaustive [B, C]");
    assert_eq!(
        check_named(&["A", "B", "C", "_"])[0].to_string(),
        "RedundantDefault"
    );
}

const CASES: [&str; 5] = ["A", "B", "C", "D", "E"];

proptest! {
    #[test]
    fn missing_is_the_set_difference(
        handled in proptest::collection::vec(any::<bool>(), CASES.len()),
        catch_all in any::<bool>(),
    ) {
        let mut names: Vec<&str> = CASES
            .iter()
            .zip(&handled)
            .filter(|&(_, &h)| h)
            .map(|(&name, _)| name)
            .collect();
        if catch_all {
            names.push("_");
        }
        let findings = check_call_site(&CASES, &CallSite::named(Span::DUMMY, names));

        let expected_missing: Vec<String> = CASES
            .iter()
            .zip(&handled)
            .filter(|&(_, &h)| !h)
            .map(|(&name, _)| name.to_string())
            .collect();

        let non_exhaustive = findings.iter().find(|d| d.rule == RuleId::NonExhaustive);
        let redundant = findings.iter().any(|d| d.rule == RuleId::RedundantDefault);

        if catch_all {
            prop_assert!(non_exhaustive.is_none());
            prop_assert_eq!(redundant, expected_missing.is_empty());
        } else {
            prop_assert!(!redundant);
            prop_assert_eq!(
                non_exhaustive.map(|d| d.case_names.clone()).unwrap_or_default(),
                expected_missing
            );
        }
        prop_assert!(findings.iter().all(|d| d.rule != RuleId::PreferNamedBinding));
    }
}
