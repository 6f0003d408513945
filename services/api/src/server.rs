use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryCaseRepository, LoggingCaseNotifier};
use crate::routes::with_case_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use inkasso::config::AppConfig;
use inkasso::error::AppError;
use inkasso::telemetry;
use inkasso::workflows::collection::CaseWorkflowService;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryCaseRepository::default());
    let notifier = Arc::new(LoggingCaseNotifier::default());
    let case_service = Arc::new(CaseWorkflowService::new(
        repository,
        notifier,
        &config.workflow,
    ));

    let app = with_case_routes(case_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        objection_period_days = config.workflow.objection_period_days,
        "inkasso case service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
