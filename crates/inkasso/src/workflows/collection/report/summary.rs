use super::super::blueprint::WorkflowBlueprint;
use super::super::case::CollectionCase;
use super::super::domain::{CasePhase, CaseStatus, DeadlineEffect};
use super::views::{
    CaseDashboard, DeadlineAlertKind, DeadlineAlertView, PhaseCountEntry, StatusCountEntry,
};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct PhaseTotals {
    pub count: usize,
    pub outstanding_cents: u64,
}

/// Aggregated portfolio state, evaluated for a single day.
#[derive(Debug)]
pub struct CaseReport {
    pub today: NaiveDate,
    pub status_counts: HashMap<CaseStatus, usize>,
    pub phase_totals: HashMap<CasePhase, PhaseTotals>,
    pub recovered_cents: u64,
    pub alerts: Vec<DeadlineAlertView>,
}

impl CaseReport {
    pub fn build(cases: &[CollectionCase], blueprint: &WorkflowBlueprint, today: NaiveDate) -> Self {
        let mut report = CaseReport {
            today,
            status_counts: HashMap::new(),
            phase_totals: HashMap::new(),
            recovered_cents: 0,
            alerts: Vec::new(),
        };
        let warning_window = Duration::days(i64::from(blueprint.expiry_warning_days()));

        for case in cases {
            *report.status_counts.entry(case.status).or_default() += 1;
            report.recovered_cents += case.claim.paid_cents;

            let phase = report.phase_totals.entry(case.phase()).or_default();
            phase.count += 1;
            if case.status.is_closed() {
                continue;
            }
            phase.outstanding_cents += case.outstanding_cents();

            for deadline in case.active_deadlines(blueprint) {
                let alert = match deadline.effect {
                    DeadlineEffect::WaitBeforeEscalation if deadline.ends_on < today => {
                        DeadlineAlertKind::ActionDue
                    }
                    DeadlineEffect::ExpiresEscalation if deadline.ends_on < today => {
                        DeadlineAlertKind::Expired
                    }
                    DeadlineEffect::ExpiresEscalation
                        if deadline.ends_on - today <= warning_window =>
                    {
                        DeadlineAlertKind::ExpiringSoon
                    }
                    _ => continue,
                };

                let severity = alert.severity();
                report.alerts.push(DeadlineAlertView {
                    case_id: case.id.clone(),
                    kreditor_id: case.kreditor_id.clone(),
                    reference: case.reference.clone(),
                    status: case.status,
                    status_label: case.status.label(),
                    deadline: deadline.kind,
                    deadline_label: deadline.label,
                    ends_on: deadline.ends_on,
                    alert,
                    severity,
                    severity_label: severity.label(),
                });
            }
        }

        report
            .alerts
            .sort_by(|a, b| a.ends_on.cmp(&b.ends_on).then_with(|| a.case_id.cmp(&b.case_id)));

        report
    }

    pub fn dashboard(&self) -> CaseDashboard {
        let status_counts = CaseStatus::ordered()
            .into_iter()
            .filter_map(|status| {
                self.status_counts
                    .get(&status)
                    .map(|&count| StatusCountEntry {
                        status,
                        status_label: status.label(),
                        count,
                    })
            })
            .collect();

        let phase_counts = CasePhase::ordered()
            .into_iter()
            .filter_map(|phase| {
                self.phase_totals.get(&phase).map(|totals| PhaseCountEntry {
                    phase,
                    phase_label: phase.label(),
                    count: totals.count,
                    outstanding_cents: totals.outstanding_cents,
                })
            })
            .collect();

        let closed_cases = self
            .phase_totals
            .get(&CasePhase::Closed)
            .map(|totals| totals.count)
            .unwrap_or(0);
        let open_cases = self.status_counts.values().sum::<usize>() - closed_cases;
        let outstanding_cents = self
            .phase_totals
            .values()
            .map(|totals| totals.outstanding_cents)
            .sum();

        CaseDashboard {
            today: self.today,
            open_cases,
            closed_cases,
            outstanding_cents,
            recovered_cents: self.recovered_cents,
            status_counts,
            phase_counts,
            deadline_alerts: self.alerts.clone(),
        }
    }
}

impl CaseDashboard {
    pub fn build(cases: &[CollectionCase], blueprint: &WorkflowBlueprint, today: NaiveDate) -> Self {
        CaseReport::build(cases, blueprint, today).dashboard()
    }
}
