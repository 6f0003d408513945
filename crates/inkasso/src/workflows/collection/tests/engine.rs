use super::common::*;
use crate::workflows::collection::case::CollectionCase;
use crate::workflows::collection::domain::{CaseStatus, DeadlineKind, WorkflowError};
use crate::workflows::collection::engine::{
    AdvanceWorkflowRequest, StandardWorkflowEngine, TransitionContext, WorkflowEngine,
};

fn context(today: chrono::NaiveDate) -> TransitionContext {
    TransitionContext {
        actor: "j.becker".to_string(),
        today,
    }
}

fn walk(
    engine: &StandardWorkflowEngine,
    case: &mut CollectionCase,
    steps: &[(CaseStatus, chrono::NaiveDate)],
) {
    for &(status, on) in steps {
        let mut request = advance_to(status, on);
        if status == CaseStatus::DunningOrderIssued {
            request = request.with_court_reference("25-1234567-0-4");
        }
        engine
            .advance(case, request, &context(on))
            .unwrap_or_else(|err| panic!("advance to {status:?} on {on}: {err}"));
    }
}

fn served_case(engine: &StandardWorkflowEngine, served_on: chrono::NaiveDate) -> CollectionCase {
    let mut case = new_case();
    walk(
        engine,
        &mut case,
        &[
            (CaseStatus::DunningOrderApplied, date(2025, 3, 10)),
            (CaseStatus::DunningOrderIssued, date(2025, 3, 20)),
            (CaseStatus::DunningOrderServed, served_on),
        ],
    );
    case
}

#[test]
fn reminder_escalation_waits_for_payment_window() {
    let engine = engine();
    let mut case = new_case();
    walk(&engine, &mut case, &[(CaseStatus::FirstReminder, opened_on())]);

    let err = engine
        .advance(
            &mut case,
            advance_to(CaseStatus::SecondReminder, date(2025, 3, 17)),
            &context(date(2025, 3, 17)),
        )
        .expect_err("payment window still running");
    assert_eq!(
        err,
        WorkflowError::DeadlinePending {
            kind: DeadlineKind::PaymentWindow,
            ends_on: date(2025, 3, 17),
        }
    );
    assert_eq!(case.status, CaseStatus::FirstReminder);
    assert_eq!(case.history.len(), 1);

    let transition = engine
        .advance(
            &mut case,
            advance_to(CaseStatus::SecondReminder, date(2025, 3, 18)),
            &context(date(2025, 3, 20)),
        )
        .expect("window lapsed");
    assert_eq!(transition.from, CaseStatus::FirstReminder);
    assert_eq!(transition.to, CaseStatus::SecondReminder);
    assert!(!transition.phase_changed);
    assert_eq!(case.status_since, date(2025, 3, 18));
    assert_eq!(transition.deadlines.len(), 1);
    assert_eq!(transition.deadlines[0].ends_on, date(2025, 4, 1));
}

#[test]
fn override_skips_waiting_period_and_is_recorded() {
    let engine = engine();
    let mut case = new_case();
    walk(&engine, &mut case, &[(CaseStatus::FirstReminder, opened_on())]);

    let mut request = advance_to(CaseStatus::DunningOrderApplied, date(2025, 3, 5));
    request.override_waiting_period = true;
    request.note = Some("Debtor announced insolvency filing".to_string());

    let transition = engine
        .advance(&mut case, request, &context(date(2025, 3, 5)))
        .expect("override accepted");

    assert!(transition.overridden);
    assert!(transition.phase_changed);
    let entry = case.history.last().expect("history entry");
    assert!(entry.overridden);
    assert_eq!(entry.recorded_by, "j.becker");
    assert_eq!(
        entry.note.as_deref(),
        Some("Debtor announced insolvency filing")
    );
}

#[test]
fn closing_is_possible_while_waiting_but_requires_zero_balance_for_payment() {
    let engine = engine();
    let mut case = new_case();
    walk(&engine, &mut case, &[(CaseStatus::FirstReminder, opened_on())]);
    let today = date(2025, 3, 6);

    let err = engine
        .advance(
            &mut case,
            AdvanceWorkflowRequest::to(CaseStatus::PaidInFull),
            &context(today),
        )
        .expect_err("balance outstanding");
    assert_eq!(
        err,
        WorkflowError::OutstandingBalance {
            outstanding_cents: 50_160
        }
    );

    case.record_payment(50_160, today).expect("payment fits");
    engine
        .advance(
            &mut case,
            AdvanceWorkflowRequest::to(CaseStatus::PaidInFull),
            &context(today),
        )
        .expect("paid cases close");
    assert!(case.status.is_closed());

    let err = engine
        .advance(
            &mut case,
            AdvanceWorkflowRequest::to(CaseStatus::Withdrawn),
            &context(today),
        )
        .expect_err("closed cases are final");
    assert_eq!(err, WorkflowError::CaseClosed(CaseStatus::PaidInFull));
}

#[test]
fn rejects_transitions_outside_the_blueprint() {
    let engine = engine();
    let mut case = new_case();

    let err = engine
        .advance(
            &mut case,
            AdvanceWorkflowRequest::to(CaseStatus::EnforcementOrderApplied),
            &context(opened_on()),
        )
        .expect_err("cannot skip the dunning order");
    assert_eq!(
        err,
        WorkflowError::InvalidTransition {
            from: CaseStatus::New,
            to: CaseStatus::EnforcementOrderApplied,
        }
    );

    let err = engine
        .advance(
            &mut case,
            AdvanceWorkflowRequest::to(CaseStatus::New),
            &context(opened_on()),
        )
        .expect_err("same status");
    assert_eq!(err, WorkflowError::AlreadyInStatus(CaseStatus::New));

    let err = engine
        .advance(
            &mut case,
            AdvanceWorkflowRequest::to(CaseStatus::Uncollectible),
            &context(opened_on()),
        )
        .expect_err("write-off needs failed enforcement");
    assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    assert!(case.history.is_empty());
}

#[test]
fn validates_effective_dates() {
    let engine = engine();
    let mut case = new_case();

    let err = engine
        .advance(
            &mut case,
            advance_to(CaseStatus::FirstReminder, date(2025, 3, 10)),
            &context(date(2025, 3, 9)),
        )
        .expect_err("future date");
    assert!(matches!(err, WorkflowError::EffectiveDateInFuture { .. }));

    let err = engine
        .advance(
            &mut case,
            advance_to(CaseStatus::FirstReminder, date(2025, 3, 1)),
            &context(date(2025, 3, 9)),
        )
        .expect_err("date before case opened");
    assert_eq!(
        err,
        WorkflowError::EffectiveDateBeforeStatus {
            effective_on: date(2025, 3, 1),
            status_since: opened_on(),
        }
    );
}

#[test]
fn issued_dunning_order_requires_court_reference() {
    let engine = engine();
    let mut case = new_case();
    walk(
        &engine,
        &mut case,
        &[(CaseStatus::DunningOrderApplied, date(2025, 3, 10))],
    );

    let mut request = advance_to(CaseStatus::DunningOrderIssued, date(2025, 3, 20));
    request.court_reference = Some("   ".to_string());
    let err = engine
        .advance(&mut case, request, &context(date(2025, 3, 20)))
        .expect_err("blank references do not count");
    assert_eq!(
        err,
        WorkflowError::MissingCourtReference(CaseStatus::DunningOrderIssued)
    );

    let request = advance_to(CaseStatus::DunningOrderIssued, date(2025, 3, 20))
        .with_court_reference(" 25-1234567-0-4 ");
    engine
        .advance(&mut case, request, &context(date(2025, 3, 20)))
        .expect("reference supplied");
    assert_eq!(case.court_reference.as_deref(), Some("25-1234567-0-4"));
}

#[test]
fn enforcement_order_waits_for_objection_period() {
    let engine = engine();
    let mut case = served_case(&engine, date(2025, 4, 2));

    let err = engine
        .advance(
            &mut case,
            advance_to(CaseStatus::EnforcementOrderApplied, date(2025, 4, 16)),
            &context(date(2025, 4, 16)),
        )
        .expect_err("objection period running");
    assert_eq!(
        err,
        WorkflowError::DeadlinePending {
            kind: DeadlineKind::ObjectionPeriod,
            ends_on: date(2025, 4, 16),
        }
    );

    // The debtor may still object while the period runs.
    let mut objected = case.clone();
    engine
        .advance(
            &mut objected,
            advance_to(CaseStatus::Objection, date(2025, 4, 10)),
            &context(date(2025, 4, 10)),
        )
        .expect("objection accepted");
    assert_eq!(objected.phase(), CaseStatus::Objection.phase());

    let transition = engine
        .advance(
            &mut case,
            advance_to(CaseStatus::EnforcementOrderApplied, date(2025, 4, 17)),
            &context(date(2025, 4, 17)),
        )
        .expect("objection period lapsed");
    assert!(transition.phase_changed);
}

#[test]
fn dunning_order_lapses_after_validity_even_with_override() {
    let engine = engine();
    let mut case = served_case(&engine, date(2025, 4, 2));
    let today = date(2025, 10, 3);

    let mut request = advance_to(CaseStatus::EnforcementOrderApplied, today);
    request.override_waiting_period = true;
    let err = engine
        .advance(&mut case, request, &context(today))
        .expect_err("validity expired");
    assert_eq!(
        err,
        WorkflowError::DeadlineExpired {
            kind: DeadlineKind::DunningOrderValidity,
            ended_on: date(2025, 10, 2),
        }
    );

    engine
        .advance(
            &mut case,
            advance_to(CaseStatus::DunningOrderApplied, today),
            &context(today),
        )
        .expect("re-filing is allowed");
    assert_eq!(case.status, CaseStatus::DunningOrderApplied);
    assert_eq!(
        case.court_reference.as_deref(),
        Some("25-1234567-0-4"),
        "previous reference stays on record"
    );
}

#[test]
fn available_transitions_explain_blockers() {
    let engine = engine();
    let case = served_case(&engine, date(2025, 4, 2));

    let options = engine.available_transitions(&case, date(2025, 4, 10));
    let enforcement = options
        .iter()
        .find(|option| option.status == CaseStatus::EnforcementOrderApplied)
        .expect("enforcement option listed");
    assert!(enforcement
        .blocked_by
        .as_deref()
        .unwrap_or_default()
        .contains("2025-04-16"));

    let paid = options
        .iter()
        .find(|option| option.status == CaseStatus::PaidInFull)
        .expect("closing option listed");
    assert!(paid.blocked_by.is_some(), "balance still outstanding");

    let objection = options
        .iter()
        .find(|option| option.status == CaseStatus::Objection)
        .expect("objection listed");
    assert!(objection.blocked_by.is_none());

    let later = engine.available_transitions(&case, date(2025, 4, 20));
    assert!(later
        .iter()
        .filter(|option| option.status == CaseStatus::EnforcementOrderApplied)
        .all(|option| option.blocked_by.is_none()));
}

#[test]
fn step_costs_accumulate_on_the_claim() {
    let engine = engine();
    let mut case = new_case();

    let mut request = advance_to(CaseStatus::DunningOrderApplied, date(2025, 3, 10));
    request.additional_costs_cents = 3_600;
    engine
        .advance(&mut case, request, &context(date(2025, 3, 10)))
        .expect("court fee booked");

    assert_eq!(case.claim.costs_cents, 3_600);
    assert_eq!(case.outstanding_cents(), 48_950 + 1_210 + 3_600);
}

#[test]
fn every_status_has_a_template_in_order() {
    let engine = engine();
    let blueprint = engine.blueprint();
    for status in CaseStatus::ordered() {
        assert_eq!(blueprint.template(status).status, status);
        if status.is_closed() {
            assert!(blueprint.allowed_next(status).is_empty());
        } else {
            assert!(blueprint.allowed_next(status).contains(&CaseStatus::Withdrawn));
        }
    }
}

#[test]
fn paid_in_full_counts_costs_booked_by_the_closing_step() {
    let engine = engine();
    let mut case = new_case();
    let today = date(2025, 3, 6);
    case.record_payment(50_160, today).expect("claim settled");

    let mut request = AdvanceWorkflowRequest::to(CaseStatus::PaidInFull);
    request.additional_costs_cents = 5_000;
    let err = engine
        .advance(&mut case, request, &context(today))
        .expect_err("closing costs leave a balance");

    assert_eq!(
        err,
        WorkflowError::OutstandingBalance {
            outstanding_cents: 5_000
        }
    );
    assert_eq!(case.status, CaseStatus::New);
    assert_eq!(case.claim.costs_cents, 0, "rejected step books nothing");

    let options = engine.available_transitions(&case, today);
    let paid = options
        .iter()
        .find(|option| option.status == CaseStatus::PaidInFull)
        .expect("paid in full offered");
    assert!(paid.blocked_by.is_none());
}

#[test]
fn oversized_periods_do_not_overflow() {
    let engine = StandardWorkflowEngine::new(&crate::config::WorkflowConfig {
        reminder_payment_days: u32::MAX,
        ..crate::config::WorkflowConfig::default()
    });
    let mut case = new_case();

    let transition = engine
        .advance(
            &mut case,
            advance_to(CaseStatus::FirstReminder, opened_on()),
            &context(opened_on()),
        )
        .expect("first reminder");
    assert_eq!(transition.deadlines[0].ends_on, chrono::NaiveDate::MAX);

    let err = engine
        .advance(
            &mut case,
            advance_to(CaseStatus::FinalReminder, date(2026, 3, 3)),
            &context(date(2026, 3, 3)),
        )
        .expect_err("window never lapses");
    assert!(matches!(err, WorkflowError::DeadlinePending { .. }));
}
