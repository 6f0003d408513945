use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::collection::CaseServiceError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Case(CaseServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "inkasso settings rejected: {err}"),
            AppError::Telemetry(err) => write!(f, "logging could not start: {err}"),
            AppError::Io(err) => write!(f, "listener failed: {err}"),
            AppError::Server(err) => write!(f, "http transport failed: {err}"),
            // Case errors already read as user-facing messages.
            AppError::Case(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Case(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Case(err) => err.status_code(),
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<CaseServiceError> for AppError {
    fn from(value: CaseServiceError) -> Self {
        Self::Case(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::collection::domain::{CaseId, CaseStatus, WorkflowError};

    #[test]
    fn case_errors_keep_their_status_and_message() {
        let err = AppError::from(CaseServiceError::NotFound(CaseId("case-000042".to_string())));
        assert_eq!(err.to_string(), "case case-000042 not found");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

        let err = AppError::from(CaseServiceError::from(WorkflowError::CaseClosed(
            CaseStatus::Withdrawn,
        )));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn infrastructure_errors_are_internal() {
        let err = AppError::from(ConfigError::InvalidPort);
        assert!(err.to_string().starts_with("inkasso settings rejected"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
