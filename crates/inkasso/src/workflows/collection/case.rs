use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::blueprint::WorkflowBlueprint;
use super::domain::{
    CaseId, CasePhase, CaseStatus, Claim, Debtor, DeadlineEffect, DeadlineKind, KreditorId,
    WorkflowError,
};

/// Payload for opening a new collection case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenCaseRequest {
    /// Required for administrators, ignored for tenant-bound callers.
    #[serde(default)]
    pub kreditor_id: Option<KreditorId>,
    /// The Kreditor's own reference, usually the invoice number.
    pub reference: String,
    pub debtor: Debtor,
    pub principal_cents: u64,
    #[serde(default)]
    pub interest_cents: u64,
    #[serde(default)]
    pub costs_cents: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseHistoryEntry {
    pub from: CaseStatus,
    pub to: CaseStatus,
    pub effective_on: NaiveDate,
    pub recorded_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub overridden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub amount_cents: u64,
    pub received_on: NaiveDate,
}

/// A deadline running for the case's current status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveDeadline {
    pub kind: DeadlineKind,
    pub label: &'static str,
    pub ends_on: NaiveDate,
    pub effect: DeadlineEffect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionCase {
    pub id: CaseId,
    pub kreditor_id: KreditorId,
    pub reference: String,
    pub debtor: Debtor,
    pub claim: Claim,
    pub status: CaseStatus,
    pub status_since: NaiveDate,
    pub opened_on: NaiveDate,
    pub court_reference: Option<String>,
    pub history: Vec<CaseHistoryEntry>,
    pub payments: Vec<Payment>,
    pub version: u64,
}

impl CollectionCase {
    pub fn open(
        id: CaseId,
        kreditor_id: KreditorId,
        request: OpenCaseRequest,
        opened_on: NaiveDate,
    ) -> Self {
        Self {
            id,
            kreditor_id,
            reference: request.reference,
            debtor: request.debtor,
            claim: Claim {
                principal_cents: request.principal_cents,
                interest_cents: request.interest_cents,
                costs_cents: request.costs_cents,
                paid_cents: 0,
            },
            status: CaseStatus::New,
            status_since: opened_on,
            opened_on,
            court_reference: None,
            history: Vec::new(),
            payments: Vec::new(),
            version: 0,
        }
    }

    pub fn phase(&self) -> CasePhase {
        self.status.phase()
    }

    pub fn outstanding_cents(&self) -> u64 {
        self.claim.outstanding_cents()
    }

    pub fn record_payment(
        &mut self,
        amount_cents: u64,
        received_on: NaiveDate,
    ) -> Result<(), WorkflowError> {
        if self.status.is_closed() {
            return Err(WorkflowError::CaseClosed(self.status));
        }
        if amount_cents == 0 {
            return Err(WorkflowError::InvalidPayment(
                "amount must be positive".to_string(),
            ));
        }
        if received_on < self.opened_on {
            return Err(WorkflowError::InvalidPayment(format!(
                "received on {received_on}, before the case was opened on {}",
                self.opened_on
            )));
        }

        let outstanding_cents = self.outstanding_cents();
        if amount_cents > outstanding_cents {
            return Err(WorkflowError::Overpayment {
                amount_cents,
                outstanding_cents,
            });
        }

        self.claim.paid_cents += amount_cents;
        self.payments.push(Payment {
            amount_cents,
            received_on,
        });
        Ok(())
    }

    pub fn active_deadlines(&self, blueprint: &WorkflowBlueprint) -> Vec<ActiveDeadline> {
        blueprint
            .deadlines_for(self.status)
            .iter()
            .map(|rule| ActiveDeadline {
                kind: rule.kind,
                label: rule.kind.label(),
                ends_on: rule.span.ends_on(self.status_since),
                effect: rule.effect,
            })
            .collect()
    }

    pub fn to_view(&self) -> CaseView {
        CaseView {
            id: self.id.clone(),
            kreditor_id: self.kreditor_id.clone(),
            reference: self.reference.clone(),
            debtor: self.debtor.clone(),
            status: self.status,
            status_label: self.status.label(),
            legal_term: self.status.legal_term(),
            phase: self.phase(),
            phase_label: self.phase().label(),
            status_since: self.status_since,
            opened_on: self.opened_on,
            court_reference: self.court_reference.clone(),
            claim: self.claim,
            outstanding_cents: self.outstanding_cents(),
            history: self.history.clone(),
            payments: self.payments.clone(),
        }
    }
}

/// Serialized representation of a case for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct CaseView {
    pub id: CaseId,
    pub kreditor_id: KreditorId,
    pub reference: String,
    pub debtor: Debtor,
    pub status: CaseStatus,
    pub status_label: &'static str,
    pub legal_term: &'static str,
    pub phase: CasePhase,
    pub phase_label: &'static str,
    pub status_since: NaiveDate,
    pub opened_on: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub court_reference: Option<String>,
    pub claim: Claim,
    pub outstanding_cents: u64,
    pub history: Vec<CaseHistoryEntry>,
    pub payments: Vec<Payment>,
}
