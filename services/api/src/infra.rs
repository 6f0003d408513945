use chrono::NaiveDate;
use inkasso::workflows::collection::domain::CaseId;
use inkasso::workflows::collection::{
    CaseFilter, CaseNotification, CaseNotifier, CaseRepository, CollectionCase,
    NotificationError, RepositoryError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryCaseRepository {
    cases: Arc<Mutex<HashMap<CaseId, CollectionCase>>>,
}

impl InMemoryCaseRepository {
    fn guard(&self) -> Result<MutexGuard<'_, HashMap<CaseId, CollectionCase>>, RepositoryError> {
        self.cases
            .lock()
            .map_err(|_| RepositoryError::Unavailable("case store mutex poisoned".to_string()))
    }
}

impl CaseRepository for InMemoryCaseRepository {
    fn insert(&self, case: CollectionCase) -> Result<CollectionCase, RepositoryError> {
        let mut guard = self.guard()?;
        if guard.contains_key(&case.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(case.id.clone(), case.clone());
        Ok(case)
    }

    fn update(&self, case: CollectionCase) -> Result<(), RepositoryError> {
        let mut guard = self.guard()?;
        let stored = guard.get(&case.id).ok_or(RepositoryError::NotFound)?;
        if stored.version + 1 != case.version {
            return Err(RepositoryError::StaleVersion);
        }
        guard.insert(case.id.clone(), case);
        Ok(())
    }

    fn fetch(&self, id: &CaseId) -> Result<Option<CollectionCase>, RepositoryError> {
        Ok(self.guard()?.get(id).cloned())
    }

    fn list(&self, filter: &CaseFilter) -> Result<Vec<CollectionCase>, RepositoryError> {
        Ok(self
            .guard()?
            .values()
            .filter(|case| filter.matches(case))
            .cloned()
            .collect())
    }
}

/// Writes notifications to the log and keeps them for inspection.
#[derive(Default, Clone)]
pub(crate) struct LoggingCaseNotifier {
    events: Arc<Mutex<Vec<CaseNotification>>>,
}

impl CaseNotifier for LoggingCaseNotifier {
    fn notify(&self, notification: CaseNotification) -> Result<(), NotificationError> {
        info!(
            template = %notification.template,
            case_id = %notification.case_id,
            kreditor_id = %notification.kreditor_id,
            "kreditor notification queued"
        );
        let mut guard = self
            .events
            .lock()
            .map_err(|_| NotificationError::Transport("notification mutex poisoned".to_string()))?;
        guard.push(notification);
        Ok(())
    }
}

impl LoggingCaseNotifier {
    pub(crate) fn events(&self) -> Vec<CaseNotification> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
