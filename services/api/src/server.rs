use crate::cli::ServeArgs;
use crate::infra::{AppState, Marketplace};
use crate::routes::marketplace_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use evpeti::config::AppConfig;
use evpeti::error::AppError;
use evpeti::listings::ListingImporter;
use evpeti::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let marketplace = Marketplace::in_memory(config.bookings.transition_policy());
    if let Some(path) = args.listings_csv.take() {
        let report = ListingImporter::from_path(&path, marketplace.listings.as_ref())?;
        for rejected in &report.rejected {
            warn!(line = rejected.line, reason = %rejected.reason, "listing row skipped");
        }
        info!(
            path = %path.display(),
            imported = report.imported.len(),
            rejected = report.rejected.len(),
            "listings preloaded"
        );
    }

    let app = marketplace_routes(&marketplace)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        allow_accepted_cancellation = config.bookings.allow_accepted_cancellation,
        "pet-sitting marketplace ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
