//! Collection case workflow: the statutory dunning process from the first
//! reminder through the court dunning order, enforcement, and closure.

mod blueprint;
pub mod case;
pub mod domain;
pub mod engine;
pub mod report;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use blueprint::{StatusTemplate, WorkflowBlueprint};
pub use case::{ActiveDeadline, CaseHistoryEntry, CaseView, CollectionCase, OpenCaseRequest};
pub use engine::{
    AdvanceWorkflowRequest, StandardWorkflowEngine, TransitionContext, TransitionOption,
    WorkflowEngine, WorkflowTransition,
};
pub use report::{CaseDashboard, CaseReport};
pub use repository::{
    CaseFilter, CaseNotification, CaseNotifier, CaseRepository, NotificationError,
    RepositoryError,
};
pub use router::case_router;
pub use service::{CaseServiceError, CaseWorkflowService, PaymentRequest, WorkflowOptionsView};
