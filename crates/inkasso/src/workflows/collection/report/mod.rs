mod summary;
pub mod views;

pub use summary::CaseReport;
pub use views::{
    AlertSeverity, CaseDashboard, DeadlineAlertKind, DeadlineAlertView, PhaseCountEntry,
    StatusCountEntry,
};
