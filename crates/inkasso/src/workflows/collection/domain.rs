use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a case in the statutory collection process.
///
/// Variants are declared in process order so `Ord` reflects how far a case has
/// progressed. The final four variants are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    New,
    FirstReminder,
    SecondReminder,
    FinalReminder,
    DunningOrderApplied,
    DunningOrderIssued,
    DunningOrderServed,
    Objection,
    EnforcementOrderApplied,
    EnforcementOrderIssued,
    EnforcementOrderServed,
    Appeal,
    ContentiousProceedings,
    EnforcementInitiated,
    InstallmentPlan,
    PaidInFull,
    Settled,
    Uncollectible,
    Withdrawn,
}

impl CaseStatus {
    pub const fn ordered() -> [Self; 19] {
        [
            Self::New,
            Self::FirstReminder,
            Self::SecondReminder,
            Self::FinalReminder,
            Self::DunningOrderApplied,
            Self::DunningOrderIssued,
            Self::DunningOrderServed,
            Self::Objection,
            Self::EnforcementOrderApplied,
            Self::EnforcementOrderIssued,
            Self::EnforcementOrderServed,
            Self::Appeal,
            Self::ContentiousProceedings,
            Self::EnforcementInitiated,
            Self::InstallmentPlan,
            Self::PaidInFull,
            Self::Settled,
            Self::Uncollectible,
            Self::Withdrawn,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::FirstReminder => "First Reminder",
            Self::SecondReminder => "Second Reminder",
            Self::FinalReminder => "Final Reminder",
            Self::DunningOrderApplied => "Dunning Order Applied",
            Self::DunningOrderIssued => "Dunning Order Issued",
            Self::DunningOrderServed => "Dunning Order Served",
            Self::Objection => "Objection Filed",
            Self::EnforcementOrderApplied => "Enforcement Order Applied",
            Self::EnforcementOrderIssued => "Enforcement Order Issued",
            Self::EnforcementOrderServed => "Enforcement Order Served",
            Self::Appeal => "Appeal Filed",
            Self::ContentiousProceedings => "Contentious Proceedings",
            Self::EnforcementInitiated => "Enforcement Initiated",
            Self::InstallmentPlan => "Installment Plan",
            Self::PaidInFull => "Paid in Full",
            Self::Settled => "Settled",
            Self::Uncollectible => "Uncollectible",
            Self::Withdrawn => "Withdrawn",
        }
    }

    pub const fn legal_term(self) -> &'static str {
        match self {
            Self::New => "Neuanlage",
            Self::FirstReminder => "Erste Mahnung",
            Self::SecondReminder => "Zweite Mahnung",
            Self::FinalReminder => "Letzte Mahnung",
            Self::DunningOrderApplied => "Mahnbescheid beantragt",
            Self::DunningOrderIssued => "Mahnbescheid erlassen",
            Self::DunningOrderServed => "Mahnbescheid zugestellt",
            Self::Objection => "Widerspruch",
            Self::EnforcementOrderApplied => "Vollstreckungsbescheid beantragt",
            Self::EnforcementOrderIssued => "Vollstreckungsbescheid erlassen",
            Self::EnforcementOrderServed => "Vollstreckungsbescheid zugestellt",
            Self::Appeal => "Einspruch",
            Self::ContentiousProceedings => "Streitiges Verfahren",
            Self::EnforcementInitiated => "Zwangsvollstreckung eingeleitet",
            Self::InstallmentPlan => "Ratenzahlungsvereinbarung",
            Self::PaidInFull => "Vollständig bezahlt",
            Self::Settled => "Vergleich",
            Self::Uncollectible => "Uneinbringlich",
            Self::Withdrawn => "Zurückgenommen",
        }
    }

    pub const fn phase(self) -> CasePhase {
        match self {
            Self::New | Self::FirstReminder | Self::SecondReminder | Self::FinalReminder => {
                CasePhase::PreCourt
            }
            Self::DunningOrderApplied
            | Self::DunningOrderIssued
            | Self::DunningOrderServed
            | Self::Objection => CasePhase::CourtDunning,
            Self::EnforcementOrderApplied
            | Self::EnforcementOrderIssued
            | Self::EnforcementOrderServed
            | Self::Appeal => CasePhase::EnforcementOrder,
            Self::ContentiousProceedings => CasePhase::Litigation,
            Self::EnforcementInitiated | Self::InstallmentPlan => CasePhase::Enforcement,
            Self::PaidInFull | Self::Settled | Self::Uncollectible | Self::Withdrawn => {
                CasePhase::Closed
            }
        }
    }

    pub const fn is_closed(self) -> bool {
        matches!(self.phase(), CasePhase::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasePhase {
    PreCourt,
    CourtDunning,
    EnforcementOrder,
    Litigation,
    Enforcement,
    Closed,
}

impl CasePhase {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::PreCourt,
            Self::CourtDunning,
            Self::EnforcementOrder,
            Self::Litigation,
            Self::Enforcement,
            Self::Closed,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::PreCourt => "Pre-court Reminders",
            Self::CourtDunning => "Court Dunning Procedure",
            Self::EnforcementOrder => "Enforcement Order",
            Self::Litigation => "Litigation",
            Self::Enforcement => "Enforcement",
            Self::Closed => "Closed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineKind {
    PaymentWindow,
    ObjectionPeriod,
    DunningOrderValidity,
    AppealPeriod,
}

impl DeadlineKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::PaymentWindow => "Payment window",
            Self::ObjectionPeriod => "Objection period (Widerspruchsfrist)",
            Self::DunningOrderValidity => "Dunning order validity (§701 ZPO)",
            Self::AppealPeriod => "Appeal period (Einspruchsfrist)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "unit", content = "value")]
pub enum DeadlineSpan {
    Days(u32),
    Months(u32),
}

impl DeadlineSpan {
    /// Last day of the period that starts on `start`.
    pub fn ends_on(self, start: NaiveDate) -> NaiveDate {
        match self {
            DeadlineSpan::Days(days) => start
                .checked_add_signed(Duration::days(i64::from(days)))
                .unwrap_or(NaiveDate::MAX),
            DeadlineSpan::Months(months) => start
                .checked_add_months(Months::new(months))
                .unwrap_or(NaiveDate::MAX),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineEffect {
    /// Gated transitions stay blocked until the period has lapsed.
    WaitBeforeEscalation,
    /// Gated transitions are no longer possible once the period has lapsed.
    ExpiresEscalation,
    Informational,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadlineRule {
    pub kind: DeadlineKind,
    pub span: DeadlineSpan,
    pub effect: DeadlineEffect,
    pub gates: Vec<CaseStatus>,
}

impl DeadlineRule {
    pub fn gates(&self, target: CaseStatus) -> bool {
        self.gates.contains(&target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaseId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KreditorId(pub String);

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for KreditorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtorKind {
    Consumer,
    Business,
}

/// Debtor snapshot captured when the case is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debtor {
    pub name: String,
    pub kind: DebtorKind,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Claim amounts in euro cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub principal_cents: u64,
    #[serde(default)]
    pub interest_cents: u64,
    #[serde(default)]
    pub costs_cents: u64,
    #[serde(default)]
    pub paid_cents: u64,
}

impl Claim {
    pub fn total_cents(&self) -> u64 {
        self.principal_cents
            .saturating_add(self.interest_cents)
            .saturating_add(self.costs_cents)
    }

    pub fn outstanding_cents(&self) -> u64 {
        self.total_cents().saturating_sub(self.paid_cents)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("case is closed ({})", .0.label())]
    CaseClosed(CaseStatus),
    #[error("case is already in status {}", .0.label())]
    AlreadyInStatus(CaseStatus),
    #[error("transition from {} to {} is not permitted", .from.label(), .to.label())]
    InvalidTransition { from: CaseStatus, to: CaseStatus },
    #[error("effective date {effective_on} lies in the future")]
    EffectiveDateInFuture { effective_on: NaiveDate },
    #[error("effective date {effective_on} precedes the current status (since {status_since})")]
    EffectiveDateBeforeStatus {
        effective_on: NaiveDate,
        status_since: NaiveDate,
    },
    #[error("{} runs until {ends_on}", .kind.label())]
    DeadlinePending { kind: DeadlineKind, ends_on: NaiveDate },
    #[error("{} ended on {ended_on}", .kind.label())]
    DeadlineExpired { kind: DeadlineKind, ended_on: NaiveDate },
    #[error("a court reference is required to enter {}", .0.label())]
    MissingCourtReference(CaseStatus),
    #[error("{outstanding_cents} cents are still outstanding")]
    OutstandingBalance { outstanding_cents: u64 },
    #[error("invalid payment: {0}")]
    InvalidPayment(String),
    #[error("payment of {amount_cents} cents exceeds the outstanding {outstanding_cents} cents")]
    Overpayment {
        amount_cents: u64,
        outstanding_cents: u64,
    },
}
