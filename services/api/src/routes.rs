use crate::infra::{AppState, Marketplace};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use evpeti::bookings::booking_router;
use evpeti::listings::listing_router;
use evpeti::notifications::notification_router;
use evpeti::reviews::review_router;
use evpeti::users::user_router;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Domain routers plus the service probes. Probes read [`AppState`] from an extension layer.
pub(crate) fn marketplace_routes(marketplace: &Marketplace) -> Router {
    Router::new()
        .merge(user_router(Arc::clone(&marketplace.users)))
        .merge(listing_router(Arc::clone(&marketplace.listings)))
        .merge(booking_router(Arc::clone(&marketplace.bookings)))
        .merge(notification_router(Arc::clone(&marketplace.notifications)))
        .merge(review_router(Arc::clone(&marketplace.reviews)))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
