use crate::cli::ServeArgs;
use crate::infra::{live_verification_service, load_index, AppState};
use crate::routes::with_verification_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use fleet_trust::config::AppConfig;
use fleet_trust::error::AppError;
use fleet_trust::telemetry;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let index = load_index(&config)?;
    let verification_service = Arc::new(live_verification_service(&config, index)?);

    let app = with_verification_routes(verification_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "fleet trust service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
