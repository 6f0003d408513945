use super::super::domain::{CaseId, CasePhase, CaseStatus, DeadlineKind, KreditorId};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

impl AlertSeverity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Warning => "Warning",
            Self::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineAlertKind {
    /// Waiting period lapsed; the case can be escalated.
    ActionDue,
    ExpiringSoon,
    Expired,
}

impl DeadlineAlertKind {
    pub const fn severity(self) -> AlertSeverity {
        match self {
            Self::ActionDue => AlertSeverity::Warning,
            Self::ExpiringSoon | Self::Expired => AlertSeverity::Critical,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCountEntry {
    pub status: CaseStatus,
    pub status_label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseCountEntry {
    pub phase: CasePhase,
    pub phase_label: &'static str,
    pub count: usize,
    pub outstanding_cents: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeadlineAlertView {
    pub case_id: CaseId,
    pub kreditor_id: KreditorId,
    pub reference: String,
    pub status: CaseStatus,
    pub status_label: &'static str,
    pub deadline: DeadlineKind,
    pub deadline_label: &'static str,
    pub ends_on: NaiveDate,
    pub alert: DeadlineAlertKind,
    pub severity: AlertSeverity,
    pub severity_label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseDashboard {
    pub today: NaiveDate,
    pub open_cases: usize,
    pub closed_cases: usize,
    pub outstanding_cents: u64,
    pub recovered_cents: u64,
    pub status_counts: Vec<StatusCountEntry>,
    pub phase_counts: Vec<PhaseCountEntry>,
    pub deadline_alerts: Vec<DeadlineAlertView>,
}
