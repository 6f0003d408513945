use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::case::{ActiveDeadline, CollectionCase, OpenCaseRequest};
use super::domain::{CaseId, CaseStatus, WorkflowError};
use super::engine::{
    AdvanceWorkflowRequest, StandardWorkflowEngine, TransitionContext, TransitionOption,
    WorkflowEngine, WorkflowTransition,
};
use super::report::CaseDashboard;
use super::repository::{
    CaseFilter, CaseNotification, CaseNotifier, CaseRepository, NotificationError,
    RepositoryError,
};
use crate::access::{AccessError, Caller};
use crate::config::WorkflowConfig;

static CASE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_case_id() -> CaseId {
    let id = CASE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    CaseId(format!("case-{id:06}"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount_cents: u64,
    /// Defaults to today.
    #[serde(default)]
    pub received_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowOptionsView {
    pub case_id: CaseId,
    pub status: CaseStatus,
    pub status_label: &'static str,
    pub status_since: NaiveDate,
    pub guidance: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_reference: Option<&'static str>,
    pub deadlines: Vec<ActiveDeadline>,
    pub transitions: Vec<TransitionOption>,
}

/// Service composing the workflow engine, repository, and notifications under
/// tenant-scoped access control.
pub struct CaseWorkflowService<R, N> {
    engine: Arc<dyn WorkflowEngine>,
    repository: Arc<R>,
    notifier: Arc<N>,
}

impl<R, N> CaseWorkflowService<R, N>
where
    R: CaseRepository + 'static,
    N: CaseNotifier + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>, config: &WorkflowConfig) -> Self {
        Self::with_engine(
            Arc::new(StandardWorkflowEngine::new(config)),
            repository,
            notifier,
        )
    }

    pub fn with_engine(
        engine: Arc<dyn WorkflowEngine>,
        repository: Arc<R>,
        notifier: Arc<N>,
    ) -> Self {
        Self {
            engine,
            repository,
            notifier,
        }
    }

    pub fn engine(&self) -> &dyn WorkflowEngine {
        self.engine.as_ref()
    }

    pub fn open_case(
        &self,
        caller: &Caller,
        request: OpenCaseRequest,
        today: NaiveDate,
    ) -> Result<CollectionCase, CaseServiceError> {
        let kreditor_id = match caller.kreditor_id() {
            Some(own) => own.clone(),
            None => request
                .kreditor_id
                .clone()
                .ok_or_else(|| validation("kreditor_id is required for administrators"))?,
        };
        caller.require_manage(&kreditor_id)?;
        validate_open_request(&request)?;

        let case = CollectionCase::open(next_case_id(), kreditor_id, request, today);
        let stored = self.repository.insert(case)?;

        info!(
            case_id = %stored.id,
            kreditor_id = %stored.kreditor_id,
            principal_cents = stored.claim.principal_cents,
            user = caller.user(),
            "collection case opened"
        );
        Ok(stored)
    }

    pub fn get_case(
        &self,
        caller: &Caller,
        case_id: &CaseId,
    ) -> Result<CollectionCase, CaseServiceError> {
        self.load_visible(caller, case_id)
    }

    pub fn list_cases(
        &self,
        caller: &Caller,
        mut filter: CaseFilter,
    ) -> Result<Vec<CollectionCase>, CaseServiceError> {
        if let Some(own) = caller.kreditor_id() {
            filter.kreditor_id = Some(own.clone());
        }
        let mut cases = self.repository.list(&filter)?;
        cases.retain(|case| caller.can_view(&case.kreditor_id));
        cases.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(cases)
    }

    pub fn advance(
        &self,
        caller: &Caller,
        case_id: &CaseId,
        request: AdvanceWorkflowRequest,
        today: NaiveDate,
    ) -> Result<WorkflowTransition, CaseServiceError> {
        let mut case = self.load_visible(caller, case_id)?;
        caller.require_manage(&case.kreditor_id)?;
        if request.override_waiting_period && !caller.can_override_deadlines() {
            return Err(AccessError::Forbidden {
                user: caller.user().to_string(),
                action: "override statutory waiting periods",
            }
            .into());
        }

        let context = TransitionContext {
            actor: caller.user().to_string(),
            today,
        };
        let transition = match self.engine.advance(&mut case, request, &context) {
            Ok(transition) => transition,
            Err(err) => {
                warn!(
                    case_id = %case_id,
                    status = case.status.label(),
                    %err,
                    "transition rejected"
                );
                return Err(err.into());
            }
        };

        case.version += 1;
        self.repository.update(case.clone())?;

        info!(
            case_id = %case.id,
            from = transition.from.label(),
            to = transition.to.label(),
            overridden = transition.overridden,
            user = caller.user(),
            "case advanced"
        );

        let template = if transition.to.is_closed() {
            Some("case_closed")
        } else if transition.phase_changed {
            Some("case_phase_changed")
        } else {
            None
        };
        if let Some(template) = template {
            // Already stored; notification failures are only logged.
            if let Err(err) = self.notify(&case, template, &transition) {
                warn!(
                    case_id = %case.id,
                    template,
                    %err,
                    "kreditor notification failed"
                );
            }
        }

        Ok(transition)
    }

    pub fn record_payment(
        &self,
        caller: &Caller,
        case_id: &CaseId,
        request: PaymentRequest,
        today: NaiveDate,
    ) -> Result<CollectionCase, CaseServiceError> {
        let mut case = self.load_visible(caller, case_id)?;
        caller.require_manage(&case.kreditor_id)?;

        let received_on = request.received_on.unwrap_or(today);
        if received_on > today {
            return Err(WorkflowError::InvalidPayment(format!(
                "received on {received_on}, which lies in the future"
            ))
            .into());
        }
        case.record_payment(request.amount_cents, received_on)?;
        case.version += 1;
        self.repository.update(case.clone())?;

        info!(
            case_id = %case.id,
            amount_cents = request.amount_cents,
            outstanding_cents = case.outstanding_cents(),
            "payment recorded"
        );
        Ok(case)
    }

    pub fn workflow_options(
        &self,
        caller: &Caller,
        case_id: &CaseId,
        today: NaiveDate,
    ) -> Result<WorkflowOptionsView, CaseServiceError> {
        let case = self.load_visible(caller, case_id)?;
        let blueprint = self.engine.blueprint();
        let template = blueprint.template(case.status);

        Ok(WorkflowOptionsView {
            case_id: case.id.clone(),
            status: case.status,
            status_label: case.status.label(),
            status_since: case.status_since,
            guidance: template.guidance,
            legal_reference: template.legal_reference,
            deadlines: case.active_deadlines(blueprint),
            transitions: self.engine.available_transitions(&case, today),
        })
    }

    pub fn dashboard(
        &self,
        caller: &Caller,
        today: NaiveDate,
    ) -> Result<CaseDashboard, CaseServiceError> {
        let filter = CaseFilter {
            include_closed: true,
            ..CaseFilter::default()
        };
        let cases = self.list_cases(caller, filter)?;
        Ok(CaseDashboard::build(&cases, self.engine.blueprint(), today))
    }

    fn load_visible(
        &self,
        caller: &Caller,
        case_id: &CaseId,
    ) -> Result<CollectionCase, CaseServiceError> {
        match self.repository.fetch(case_id)? {
            Some(case) if caller.can_view(&case.kreditor_id) => Ok(case),
            _ => Err(CaseServiceError::NotFound(case_id.clone())),
        }
    }

    fn notify(
        &self,
        case: &CollectionCase,
        template: &str,
        transition: &WorkflowTransition,
    ) -> Result<(), NotificationError> {
        let mut details = BTreeMap::new();
        details.insert("reference".to_string(), case.reference.clone());
        details.insert("from".to_string(), transition.from.legal_term().to_string());
        details.insert("to".to_string(), transition.to.legal_term().to_string());
        details.insert("phase".to_string(), transition.to.phase().label().to_string());
        details.insert(
            "outstanding_cents".to_string(),
            case.outstanding_cents().to_string(),
        );

        self.notifier.notify(CaseNotification {
            template: template.to_string(),
            case_id: case.id.clone(),
            kreditor_id: case.kreditor_id.clone(),
            details,
        })
    }
}

fn validation(message: &str) -> CaseServiceError {
    CaseServiceError::Validation(message.to_string())
}

fn validate_open_request(request: &OpenCaseRequest) -> Result<(), CaseServiceError> {
    if request.reference.trim().is_empty() {
        return Err(validation("reference must not be blank"));
    }
    if request.debtor.name.trim().is_empty() {
        return Err(validation("debtor name must not be blank"));
    }
    if request.principal_cents == 0 {
        return Err(validation("principal must be positive"));
    }
    Ok(())
}

/// Error raised by the case service.
#[derive(Debug, thiserror::Error)]
pub enum CaseServiceError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("case {0} not found")]
    NotFound(CaseId),
    #[error("invalid request: {0}")]
    Validation(String),
}

impl CaseServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CaseServiceError::Access(AccessError::Forbidden { .. }) => StatusCode::FORBIDDEN,
            CaseServiceError::Access(_) => StatusCode::UNAUTHORIZED,
            CaseServiceError::NotFound(_) | CaseServiceError::Repository(RepositoryError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            CaseServiceError::Workflow(
                WorkflowError::CaseClosed(_)
                | WorkflowError::AlreadyInStatus(_)
                | WorkflowError::InvalidTransition { .. },
            )
            | CaseServiceError::Repository(
                RepositoryError::Conflict | RepositoryError::StaleVersion,
            ) => StatusCode::CONFLICT,
            CaseServiceError::Workflow(_) | CaseServiceError::Validation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            CaseServiceError::Repository(RepositoryError::Unavailable(_))
            | CaseServiceError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
