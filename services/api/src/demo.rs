use crate::infra::{parse_date, InMemoryCaseRepository, LoggingCaseNotifier};
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use inkasso::access::{Caller, Role};
use inkasso::config::{AppConfig, WorkflowConfig};
use inkasso::error::AppError;
use inkasso::workflows::collection::domain::{
    CaseStatus, Debtor, DebtorKind, DeadlineEffect, DeadlineSpan, KreditorId,
};
use inkasso::workflows::collection::{
    AdvanceWorkflowRequest, CaseDashboard, CaseServiceError, CaseWorkflowService,
    CollectionCase, OpenCaseRequest, PaymentRequest, StandardWorkflowEngine, WorkflowEngine,
};
use std::sync::Arc;

const DEMO_PAYMENT_CENTS: u64 = 20_000;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date the sample case is opened (YYYY-MM-DD). Defaults to 120 days ago.
    #[arg(long, value_parser = parse_date)]
    pub(crate) opened_on: Option<NaiveDate>,
    /// Principal claim in cents.
    #[arg(long, default_value_t = 48_950)]
    pub(crate) principal_cents: u64,
    /// Stop after the dunning order was served and show the pending deadlines.
    #[arg(long)]
    pub(crate) stop_at_dunning_order: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DescribeArgs {
    /// Only show statuses that carry statutory deadlines.
    #[arg(long)]
    pub(crate) deadlines_only: bool,
}

pub(crate) fn run_workflow_describe(args: DescribeArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let engine = StandardWorkflowEngine::new(&config.workflow);

    println!("Collection workflow");
    for template in engine.blueprint().templates() {
        if args.deadlines_only && template.deadlines.is_empty() {
            continue;
        }
        let status = template.status;
        println!(
            "\n{} ({}) | phase {}",
            status.label(),
            status.legal_term(),
            status.phase().label()
        );
        if let Some(reference) = template.legal_reference {
            println!("  legal basis: {reference}");
        }
        if template.requires_court_reference {
            println!("  requires court reference");
        }
        if template.allowed_next.is_empty() {
            println!("  terminal");
        } else {
            let next: Vec<_> = template
                .allowed_next
                .iter()
                .map(|next| next.label())
                .collect();
            println!("  next: {}", next.join(", "));
        }
        for rule in &template.deadlines {
            println!(
                "  deadline: {} ({}, {})",
                rule.kind.label(),
                describe_span(rule.span),
                describe_effect(rule.effect)
            );
        }
        println!("  {}", template.guidance);
    }

    Ok(())
}

fn describe_span(span: DeadlineSpan) -> String {
    match span {
        DeadlineSpan::Days(days) => format!("{days} days"),
        DeadlineSpan::Months(months) => format!("{months} months"),
    }
}

fn describe_effect(effect: DeadlineEffect) -> &'static str {
    match effect {
        DeadlineEffect::WaitBeforeEscalation => "must lapse before escalation",
        DeadlineEffect::ExpiresEscalation => "escalation must happen before it ends",
        DeadlineEffect::Informational => "informational",
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let opened_on = args
        .opened_on
        .unwrap_or_else(|| Local::now().date_naive() - Duration::days(120));

    println!("Inkasso collection demo");
    let (case, dashboard) = simulate_case(&config.workflow, opened_on, &args)?;

    println!("\nCase {} ({})", case.id, case.reference);
    for entry in &case.history {
        println!(
            "- {} {} -> {}{}",
            entry.effective_on,
            entry.from.legal_term(),
            entry.to.legal_term(),
            if entry.overridden { " (override)" } else { "" }
        );
    }
    for payment in &case.payments {
        println!(
            "- {} payment received {}",
            payment.received_on,
            format_cents(payment.amount_cents)
        );
    }
    if let Some(reference) = &case.court_reference {
        println!("Court reference: {reference}");
    }

    render_dashboard(&dashboard);
    Ok(())
}

fn simulate_case(
    workflow: &WorkflowConfig,
    opened_on: NaiveDate,
    args: &DemoArgs,
) -> Result<(CollectionCase, CaseDashboard), AppError> {
    let notifier = Arc::new(LoggingCaseNotifier::default());
    let service = CaseWorkflowService::new(
        Arc::new(InMemoryCaseRepository::default()),
        notifier.clone(),
        workflow,
    );
    let kreditor = KreditorId("kr-stadtwerke-demo".to_string());
    let caller = Caller::new("demo-sachbearbeitung", Role::CaseWorker, Some(kreditor))
        .map_err(CaseServiceError::from)?;

    let case = service.open_case(
        &caller,
        OpenCaseRequest {
            kreditor_id: None,
            reference: "RG-2025-0417".to_string(),
            debtor: Debtor {
                name: "Max Mustermann".to_string(),
                kind: DebtorKind::Consumer,
                street: "Lindenallee 12".to_string(),
                postal_code: "50667".to_string(),
                city: "Köln".to_string(),
                email: Some("max.mustermann@example.org".to_string()),
            },
            principal_cents: args.principal_cents,
            interest_cents: 1_210,
            costs_cents: 0,
        },
        opened_on,
    )?;
    let case_id = case.id.clone();

    let payment_window = i64::from(workflow.reminder_payment_days) + 1;
    let objection_period = i64::from(workflow.objection_period_days) + 1;
    let mut day = opened_on;
    let mut steps = vec![
        (AdvanceWorkflowRequest::to(CaseStatus::FirstReminder), 0),
        (
            AdvanceWorkflowRequest {
                additional_costs_cents: 500,
                ..AdvanceWorkflowRequest::to(CaseStatus::FinalReminder)
            },
            payment_window,
        ),
        (
            AdvanceWorkflowRequest::to(CaseStatus::DunningOrderApplied),
            payment_window,
        ),
        (
            AdvanceWorkflowRequest {
                additional_costs_cents: 3_600,
                ..AdvanceWorkflowRequest::to(CaseStatus::DunningOrderIssued)
                    .with_court_reference("25-1234567-0-6")
            },
            7,
        ),
        (AdvanceWorkflowRequest::to(CaseStatus::DunningOrderServed), 3),
    ];
    if !args.stop_at_dunning_order {
        steps.extend([
            (
                AdvanceWorkflowRequest::to(CaseStatus::EnforcementOrderApplied),
                objection_period,
            ),
            (
                AdvanceWorkflowRequest::to(CaseStatus::EnforcementOrderIssued),
                6,
            ),
            (
                AdvanceWorkflowRequest::to(CaseStatus::EnforcementOrderServed),
                4,
            ),
            (
                AdvanceWorkflowRequest::to(CaseStatus::EnforcementInitiated),
                2,
            ),
        ]);
    }

    for (request, offset) in steps {
        day += Duration::days(offset);
        let request = request.effective_on(day);
        let transition = service.advance(&caller, &case_id, request, day)?;
        println!(
            "{} moved to {}{}",
            transition.effective_on,
            transition.to_label,
            if transition.phase_changed {
                format!(" (now {})", transition.to.phase().label())
            } else {
                String::new()
            }
        );
        for deadline in &transition.deadlines {
            println!("    {} runs until {}", deadline.label, deadline.ends_on);
        }
    }

    if !args.stop_at_dunning_order {
        day += Duration::days(10);
        let outstanding_cents = service.get_case(&caller, &case_id)?.outstanding_cents();
        service.record_payment(
            &caller,
            &case_id,
            PaymentRequest {
                amount_cents: outstanding_cents.min(DEMO_PAYMENT_CENTS),
                received_on: Some(day),
            },
            day,
        )?;
    }

    let case = service.get_case(&caller, &case_id)?;
    let dashboard = service.dashboard(&caller, day)?;
    println!("{} notifications sent to the Kreditor", notifier.events().len());
    Ok((case, dashboard))
}

fn render_dashboard(dashboard: &CaseDashboard) {
    println!("\nDashboard as of {}", dashboard.today);
    println!(
        "- {} open | {} closed | outstanding {} | recovered {}",
        dashboard.open_cases,
        dashboard.closed_cases,
        format_cents(dashboard.outstanding_cents),
        format_cents(dashboard.recovered_cents)
    );
    for entry in dashboard.phase_counts.iter().filter(|entry| entry.count > 0) {
        println!(
            "  - {}: {} case(s), {} outstanding",
            entry.phase_label,
            entry.count,
            format_cents(entry.outstanding_cents)
        );
    }
    if dashboard.deadline_alerts.is_empty() {
        println!("No deadline alerts.");
    }
    for alert in &dashboard.deadline_alerts {
        println!(
            "  ! [{}] {} {}: {} ends {}",
            alert.severity_label, alert.case_id, alert.reference, alert.deadline_label, alert.ends_on
        );
    }
}

fn format_cents(cents: u64) -> String {
    format!("{}.{:02} EUR", cents / 100, cents % 100)
}
