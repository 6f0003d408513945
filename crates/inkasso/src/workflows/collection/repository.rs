use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::case::CollectionCase;
use super::domain::{CaseId, CasePhase, CaseStatus, KreditorId};

/// Storage abstraction so the service can be exercised in isolation.
///
/// `update` is optimistic: the incoming case carries the next version and the
/// stored one must be exactly one behind it.
pub trait CaseRepository: Send + Sync {
    fn insert(&self, case: CollectionCase) -> Result<CollectionCase, RepositoryError>;
    fn update(&self, case: CollectionCase) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &CaseId) -> Result<Option<CollectionCase>, RepositoryError>;
    fn list(&self, filter: &CaseFilter) -> Result<Vec<CollectionCase>, RepositoryError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseFilter {
    #[serde(default)]
    pub kreditor_id: Option<KreditorId>,
    #[serde(default)]
    pub status: Option<CaseStatus>,
    #[serde(default)]
    pub phase: Option<CasePhase>,
    #[serde(default)]
    pub include_closed: bool,
}

impl CaseFilter {
    pub fn for_kreditor(kreditor_id: KreditorId) -> Self {
        Self {
            kreditor_id: Some(kreditor_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, case: &CollectionCase) -> bool {
        if let Some(kreditor_id) = &self.kreditor_id {
            if &case.kreditor_id != kreditor_id {
                return false;
            }
        }
        if let Some(status) = self.status {
            // Asking for a closed status explicitly implies closed cases are wanted.
            return case.status == status;
        }
        if let Some(phase) = self.phase {
            if case.phase() != phase {
                return false;
            }
            if phase == CasePhase::Closed {
                return true;
            }
        }
        self.include_closed || !case.status.is_closed()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record was modified concurrently")]
    StaleVersion,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification hook (e-mail to the Kreditor, portal inbox, ...).
pub trait CaseNotifier: Send + Sync {
    fn notify(&self, notification: CaseNotification) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseNotification {
    pub template: String,
    pub case_id: CaseId,
    pub kreditor_id: KreditorId,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
