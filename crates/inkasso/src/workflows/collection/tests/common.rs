use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::access::{Caller, Role};
use crate::config::WorkflowConfig;
use crate::workflows::collection::case::{CollectionCase, OpenCaseRequest};
use crate::workflows::collection::domain::{CaseId, CaseStatus, Debtor, DebtorKind, KreditorId};
use crate::workflows::collection::engine::{AdvanceWorkflowRequest, StandardWorkflowEngine};
use crate::workflows::collection::repository::{
    CaseFilter, CaseNotification, CaseNotifier, CaseRepository, NotificationError,
    RepositoryError,
};
use crate::workflows::collection::{case_router, CaseWorkflowService};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn opened_on() -> NaiveDate {
    date(2025, 3, 3)
}

pub(super) fn kreditor() -> KreditorId {
    KreditorId("kr-stadtwerke-nord".to_string())
}

pub(super) fn foreign_kreditor() -> KreditorId {
    KreditorId("kr-moebel-haus".to_string())
}

pub(super) fn case_worker() -> Caller {
    Caller::new("j.becker", Role::CaseWorker, Some(kreditor())).expect("valid caller")
}

pub(super) fn viewer() -> Caller {
    Caller::new("portal", Role::KreditorViewer, Some(kreditor())).expect("valid caller")
}

pub(super) fn foreign_worker() -> Caller {
    Caller::new("m.wolf", Role::CaseWorker, Some(foreign_kreditor())).expect("valid caller")
}

pub(super) fn admin() -> Caller {
    Caller::administrator("ops")
}

pub(super) fn debtor() -> Debtor {
    Debtor {
        name: "Klaus Meier".to_string(),
        kind: DebtorKind::Consumer,
        street: "Lindenstraße 12".to_string(),
        postal_code: "20095".to_string(),
        city: "Hamburg".to_string(),
        email: Some("k.meier@example.org".to_string()),
    }
}

pub(super) fn open_request() -> OpenCaseRequest {
    OpenCaseRequest {
        kreditor_id: None,
        reference: "RE-2025-0142".to_string(),
        debtor: debtor(),
        principal_cents: 48_950,
        interest_cents: 1_210,
        costs_cents: 0,
    }
}

pub(super) fn new_case() -> CollectionCase {
    CollectionCase::open(
        CaseId("case-test".to_string()),
        kreditor(),
        open_request(),
        opened_on(),
    )
}

pub(super) fn engine() -> StandardWorkflowEngine {
    StandardWorkflowEngine::new(&WorkflowConfig::default())
}

pub(super) fn advance_to(status: CaseStatus, on: NaiveDate) -> AdvanceWorkflowRequest {
    AdvanceWorkflowRequest::to(status).effective_on(on)
}

pub(super) fn build_service() -> (
    CaseWorkflowService<MemoryRepository, MemoryNotifier>,
    Arc<MemoryRepository>,
    Arc<MemoryNotifier>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = CaseWorkflowService::new(
        repository.clone(),
        notifier.clone(),
        &WorkflowConfig::default(),
    );
    (service, repository, notifier)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) cases: Arc<Mutex<HashMap<CaseId, CollectionCase>>>,
}

impl CaseRepository for MemoryRepository {
    fn insert(&self, case: CollectionCase) -> Result<CollectionCase, RepositoryError> {
        let mut guard = self.cases.lock().expect("repository mutex poisoned");
        if guard.contains_key(&case.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(case.id.clone(), case.clone());
        Ok(case)
    }

    fn update(&self, case: CollectionCase) -> Result<(), RepositoryError> {
        let mut guard = self.cases.lock().expect("repository mutex poisoned");
        let stored = guard.get(&case.id).ok_or(RepositoryError::NotFound)?;
        if stored.version + 1 != case.version {
            return Err(RepositoryError::StaleVersion);
        }
        guard.insert(case.id.clone(), case);
        Ok(())
    }

    fn fetch(&self, id: &CaseId) -> Result<Option<CollectionCase>, RepositoryError> {
        let guard = self.cases.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self, filter: &CaseFilter) -> Result<Vec<CollectionCase>, RepositoryError> {
        let guard = self.cases.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|case| filter.matches(case))
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    events: Arc<Mutex<Vec<CaseNotification>>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<CaseNotification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl CaseNotifier for MemoryNotifier {
    fn notify(&self, notification: CaseNotification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl CaseNotifier for FailingNotifier {
    fn notify(&self, _notification: CaseNotification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay refused".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl CaseRepository for UnavailableRepository {
    fn insert(&self, _case: CollectionCase) -> Result<CollectionCase, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _case: CollectionCase) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &CaseId) -> Result<Option<CollectionCase>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _filter: &CaseFilter) -> Result<Vec<CollectionCase>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(
    service: CaseWorkflowService<MemoryRepository, MemoryNotifier>,
) -> axum::Router {
    case_router(Arc::new(service))
}
