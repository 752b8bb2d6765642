use crate::cli::ServeArgs;
use crate::infra::{build_service, AppState};
use crate::routes::with_pricing_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use rent_ai::config::AppConfig;
use rent_ai::error::AppError;
use rent_ai::model::ModelState;
use rent_ai::pricing::TrainingPolicy;
use rent_ai::telemetry;
use std::sync::atomic::Ordering;
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

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = build_service(&config)?;
    let pipeline = service.pipeline();
    if service.policy() == TrainingPolicy::Background
        && pipeline.registry().state() == ModelState::Uninitialized
    {
        pipeline.spawn_warm_up();
    }
    let model_state = pipeline.registry().state();

    let app = with_pricing_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        policy = ?config.pricing.policy,
        model = model_state.label(),
        "rent pricing service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
