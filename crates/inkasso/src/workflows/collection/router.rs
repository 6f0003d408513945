use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::case::OpenCaseRequest;
use super::domain::{CaseId, CasePhase, CaseStatus, KreditorId};
use super::engine::AdvanceWorkflowRequest;
use super::repository::{CaseFilter, CaseNotifier, CaseRepository};
use super::service::{CaseServiceError, CaseWorkflowService, PaymentRequest};
use crate::access::{AccessError, Caller, Role};

pub const USER_HEADER: &str = "x-inkasso-user";
pub const ROLE_HEADER: &str = "x-inkasso-role";
pub const KREDITOR_HEADER: &str = "x-inkasso-kreditor";

/// Router builder exposing the case endpoints.
pub fn case_router<R, N>(service: Arc<CaseWorkflowService<R, N>>) -> Router
where
    R: CaseRepository + 'static,
    N: CaseNotifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/cases",
            post(open_handler::<R, N>).get(list_handler::<R, N>),
        )
        .route("/api/v1/cases/:case_id", get(case_handler::<R, N>))
        .route(
            "/api/v1/cases/:case_id/workflow",
            get(options_handler::<R, N>),
        )
        .route(
            "/api/v1/cases/:case_id/workflow/advance",
            post(advance_handler::<R, N>),
        )
        .route(
            "/api/v1/cases/:case_id/payments",
            post(payment_handler::<R, N>),
        )
        .route("/api/v1/dashboard", get(dashboard_handler::<R, N>))
        .route("/api/v1/workflow/statuses", get(statuses_handler::<R, N>))
        .with_state(service)
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_from_headers(&parts.headers).map_err(|err| {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        })
    }
}

pub(crate) fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, AccessError> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let user = header(USER_HEADER).ok_or(AccessError::MissingIdentity)?;
    let raw_role = header(ROLE_HEADER).ok_or(AccessError::MissingIdentity)?;
    let role = Role::parse(raw_role).ok_or_else(|| AccessError::UnknownRole(raw_role.to_string()))?;
    let kreditor_id = header(KREDITOR_HEADER).map(|id| KreditorId(id.to_string()));

    Caller::new(user, role, kreditor_id)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListCasesQuery {
    #[serde(default)]
    status: Option<CaseStatus>,
    #[serde(default)]
    phase: Option<CasePhase>,
    #[serde(default)]
    include_closed: Option<bool>,
    #[serde(default)]
    kreditor_id: Option<String>,
}

impl From<ListCasesQuery> for CaseFilter {
    fn from(query: ListCasesQuery) -> Self {
        CaseFilter {
            kreditor_id: query.kreditor_id.map(KreditorId),
            status: query.status,
            phase: query.phase,
            include_closed: query.include_closed.unwrap_or(false),
        }
    }
}

#[derive(Debug, Serialize)]
struct StatusDescription {
    status: CaseStatus,
    label: &'static str,
    legal_term: &'static str,
    phase: CasePhase,
    phase_label: &'static str,
    allowed_next: Vec<CaseStatus>,
    requires_court_reference: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    legal_reference: Option<&'static str>,
    guidance: &'static str,
}

pub(crate) fn error_response(err: CaseServiceError) -> Response {
    let status = err.status_code();
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}

pub(crate) async fn open_handler<R, N>(
    State(service): State<Arc<CaseWorkflowService<R, N>>>,
    caller: Caller,
    Json(request): Json<OpenCaseRequest>,
) -> Response
where
    R: CaseRepository + 'static,
    N: CaseNotifier + 'static,
{
    let today = Local::now().date_naive();
    match service.open_case(&caller, request, today) {
        Ok(case) => (StatusCode::CREATED, Json(case.to_view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<R, N>(
    State(service): State<Arc<CaseWorkflowService<R, N>>>,
    caller: Caller,
    Query(query): Query<ListCasesQuery>,
) -> Response
where
    R: CaseRepository + 'static,
    N: CaseNotifier + 'static,
{
    match service.list_cases(&caller, query.into()) {
        Ok(cases) => {
            let views: Vec<_> = cases.iter().map(|case| case.to_view()).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn case_handler<R, N>(
    State(service): State<Arc<CaseWorkflowService<R, N>>>,
    caller: Caller,
    Path(case_id): Path<String>,
) -> Response
where
    R: CaseRepository + 'static,
    N: CaseNotifier + 'static,
{
    match service.get_case(&caller, &CaseId(case_id)) {
        Ok(case) => (StatusCode::OK, Json(case.to_view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn options_handler<R, N>(
    State(service): State<Arc<CaseWorkflowService<R, N>>>,
    caller: Caller,
    Path(case_id): Path<String>,
) -> Response
where
    R: CaseRepository + 'static,
    N: CaseNotifier + 'static,
{
    let today = Local::now().date_naive();
    match service.workflow_options(&caller, &CaseId(case_id), today) {
        Ok(options) => (StatusCode::OK, Json(options)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn advance_handler<R, N>(
    State(service): State<Arc<CaseWorkflowService<R, N>>>,
    caller: Caller,
    Path(case_id): Path<String>,
    Json(request): Json<AdvanceWorkflowRequest>,
) -> Response
where
    R: CaseRepository + 'static,
    N: CaseNotifier + 'static,
{
    let today = Local::now().date_naive();
    match service.advance(&caller, &CaseId(case_id), request, today) {
        Ok(transition) => (StatusCode::OK, Json(transition)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn payment_handler<R, N>(
    State(service): State<Arc<CaseWorkflowService<R, N>>>,
    caller: Caller,
    Path(case_id): Path<String>,
    Json(request): Json<PaymentRequest>,
) -> Response
where
    R: CaseRepository + 'static,
    N: CaseNotifier + 'static,
{
    let today = Local::now().date_naive();
    match service.record_payment(&caller, &CaseId(case_id), request, today) {
        Ok(case) => (StatusCode::OK, Json(case.to_view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn dashboard_handler<R, N>(
    State(service): State<Arc<CaseWorkflowService<R, N>>>,
    caller: Caller,
) -> Response
where
    R: CaseRepository + 'static,
    N: CaseNotifier + 'static,
{
    let today = Local::now().date_naive();
    match service.dashboard(&caller, today) {
        Ok(dashboard) => (StatusCode::OK, Json(dashboard)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn statuses_handler<R, N>(
    State(service): State<Arc<CaseWorkflowService<R, N>>>,
    _caller: Caller,
) -> Response
where
    R: CaseRepository + 'static,
    N: CaseNotifier + 'static,
{
    let statuses: Vec<StatusDescription> = service
        .engine()
        .blueprint()
        .templates()
        .iter()
        .map(|template| StatusDescription {
            status: template.status,
            label: template.status.label(),
            legal_term: template.status.legal_term(),
            phase: template.status.phase(),
            phase_label: template.status.phase().label(),
            allowed_next: template.allowed_next.clone(),
            requires_court_reference: template.requires_court_reference,
            legal_reference: template.legal_reference,
            guidance: template.guidance,
        })
        .collect();

    (StatusCode::OK, Json(statuses)).into_response()
}
