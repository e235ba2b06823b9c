use crate::cli::ServeArgs;
use crate::infra::{load_store, AppState};
use crate::routes::with_directory_routes;
use alumni_directory::config::AppConfig;
use alumni_directory::directory::{DirectoryService, StaticCredentials};
use alumni_directory::error::AppError;
use alumni_directory::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Duration;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

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

    let store = Arc::new(load_store(&config.directory, args.data.as_deref())?);
    if config.directory.users.is_empty() {
        warn!("APP_USERS is empty; nobody will be able to sign in");
    }
    let auth = Arc::new(
        StaticCredentials::new(config.directory.users.clone())
            .with_session_ttl(Duration::minutes(config.directory.session_ttl_minutes.into())),
    );
    let directory_service = Arc::new(DirectoryService::new(store, auth));

    let app = with_directory_routes(directory_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, users = config.directory.users.len(), "alumni directory ready");

    axum::serve(listener, app).await?;
    Ok(())
}
