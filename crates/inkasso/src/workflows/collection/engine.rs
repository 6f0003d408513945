use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::blueprint::WorkflowBlueprint;
use super::case::{ActiveDeadline, CaseHistoryEntry, CollectionCase};
use super::domain::{CaseId, CaseStatus, DeadlineEffect, WorkflowError};
use crate::config::WorkflowConfig;

/// Request to move a case to its next status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceWorkflowRequest {
    pub target_status: CaseStatus,
    /// Date the step took effect, e.g. the date of service. Defaults to today.
    #[serde(default)]
    pub effective_on: Option<NaiveDate>,
    #[serde(default)]
    pub court_reference: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    /// Costs incurred by the step (reminder fees, court fees).
    #[serde(default)]
    pub additional_costs_cents: u64,
    #[serde(default)]
    pub override_waiting_period: bool,
}

impl AdvanceWorkflowRequest {
    pub fn to(target_status: CaseStatus) -> Self {
        Self {
            target_status,
            effective_on: None,
            court_reference: None,
            note: None,
            additional_costs_cents: 0,
            override_waiting_period: false,
        }
    }

    pub fn effective_on(mut self, date: NaiveDate) -> Self {
        self.effective_on = Some(date);
        self
    }

    pub fn with_court_reference(mut self, reference: impl Into<String>) -> Self {
        self.court_reference = Some(reference.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct TransitionContext {
    pub actor: String,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowTransition {
    pub case_id: CaseId,
    pub from: CaseStatus,
    pub to: CaseStatus,
    pub to_label: &'static str,
    pub effective_on: NaiveDate,
    pub phase_changed: bool,
    pub overridden: bool,
    pub deadlines: Vec<ActiveDeadline>,
}

/// A reachable target and, if it cannot be taken today, why not.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOption {
    pub status: CaseStatus,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<String>,
}

pub trait WorkflowEngine: Send + Sync {
    fn blueprint(&self) -> &WorkflowBlueprint;

    fn available_transitions(
        &self,
        case: &CollectionCase,
        today: NaiveDate,
    ) -> Vec<TransitionOption>;

    fn advance(
        &self,
        case: &mut CollectionCase,
        request: AdvanceWorkflowRequest,
        context: &TransitionContext,
    ) -> Result<WorkflowTransition, WorkflowError>;
}

#[derive(Debug, Clone)]
pub struct StandardWorkflowEngine {
    blueprint: WorkflowBlueprint,
}

impl StandardWorkflowEngine {
    pub fn new(config: &WorkflowConfig) -> Self {
        Self::from_blueprint(WorkflowBlueprint::standard(config))
    }

    pub fn from_blueprint(blueprint: WorkflowBlueprint) -> Self {
        Self { blueprint }
    }

    fn check_deadlines(
        &self,
        case: &CollectionCase,
        target: CaseStatus,
        effective_on: NaiveDate,
        override_waiting_period: bool,
    ) -> Result<bool, WorkflowError> {
        let mut overridden = false;

        for rule in self.blueprint.deadlines_for(case.status) {
            if !rule.gates(target) {
                continue;
            }
            let ends_on = rule.span.ends_on(case.status_since);
            match rule.effect {
                DeadlineEffect::WaitBeforeEscalation if effective_on <= ends_on => {
                    if !override_waiting_period {
                        return Err(WorkflowError::DeadlinePending {
                            kind: rule.kind,
                            ends_on,
                        });
                    }
                    overridden = true;
                }
                DeadlineEffect::ExpiresEscalation if effective_on > ends_on => {
                    return Err(WorkflowError::DeadlineExpired {
                        kind: rule.kind,
                        ended_on: ends_on,
                    });
                }
                _ => {}
            }
        }

        Ok(overridden)
    }

    fn check_transition(
        &self,
        case: &CollectionCase,
        target: CaseStatus,
    ) -> Result<(), WorkflowError> {
        if case.status.is_closed() {
            return Err(WorkflowError::CaseClosed(case.status));
        }
        if case.status == target {
            return Err(WorkflowError::AlreadyInStatus(target));
        }
        if !self.blueprint.allowed_next(case.status).contains(&target) {
            return Err(WorkflowError::InvalidTransition {
                from: case.status,
                to: target,
            });
        }
        Ok(())
    }

    fn check_target_requirements(
        &self,
        case: &CollectionCase,
        target: CaseStatus,
        court_reference: Option<&str>,
        additional_costs_cents: u64,
    ) -> Result<(), WorkflowError> {
        let has_reference = court_reference.is_some() || case.court_reference.is_some();
        if self.blueprint.template(target).requires_court_reference && !has_reference {
            return Err(WorkflowError::MissingCourtReference(target));
        }

        // Step costs are booked before the case closes.
        let outstanding_cents = case
            .outstanding_cents()
            .saturating_add(additional_costs_cents);
        if target == CaseStatus::PaidInFull && outstanding_cents > 0 {
            return Err(WorkflowError::OutstandingBalance { outstanding_cents });
        }

        Ok(())
    }
}

impl WorkflowEngine for StandardWorkflowEngine {
    fn blueprint(&self) -> &WorkflowBlueprint {
        &self.blueprint
    }

    fn available_transitions(
        &self,
        case: &CollectionCase,
        today: NaiveDate,
    ) -> Vec<TransitionOption> {
        self.blueprint
            .allowed_next(case.status)
            .iter()
            .map(|&status| {
                let blocked_by = self
                    .check_deadlines(case, status, today, false)
                    .and_then(|_| self.check_target_requirements(case, status, None, 0))
                    .err()
                    .map(|err| err.to_string());
                TransitionOption {
                    status,
                    label: status.label(),
                    blocked_by,
                }
            })
            .collect()
    }

    fn advance(
        &self,
        case: &mut CollectionCase,
        request: AdvanceWorkflowRequest,
        context: &TransitionContext,
    ) -> Result<WorkflowTransition, WorkflowError> {
        let target = request.target_status;
        self.check_transition(case, target)?;

        let effective_on = request.effective_on.unwrap_or(context.today);
        if effective_on > context.today {
            return Err(WorkflowError::EffectiveDateInFuture { effective_on });
        }
        if effective_on < case.status_since {
            return Err(WorkflowError::EffectiveDateBeforeStatus {
                effective_on,
                status_since: case.status_since,
            });
        }

        let overridden =
            self.check_deadlines(case, target, effective_on, request.override_waiting_period)?;

        let court_reference = request
            .court_reference
            .map(|reference| reference.trim().to_string())
            .filter(|reference| !reference.is_empty());
        self.check_target_requirements(
            case,
            target,
            court_reference.as_deref(),
            request.additional_costs_cents,
        )?;

        let from = case.status;
        if let Some(reference) = court_reference {
            case.court_reference = Some(reference);
        }
        case.claim.costs_cents = case
            .claim
            .costs_cents
            .saturating_add(request.additional_costs_cents);
        case.history.push(CaseHistoryEntry {
            from,
            to: target,
            effective_on,
            recorded_by: context.actor.clone(),
            note: request.note,
            overridden,
        });
        case.status = target;
        case.status_since = effective_on;

        Ok(WorkflowTransition {
            case_id: case.id.clone(),
            from,
            to: target,
            to_label: target.label(),
            effective_on,
            phase_changed: from.phase() != target.phase(),
            overridden,
            deadlines: case.active_deadlines(&self.blueprint),
        })
    }
}
