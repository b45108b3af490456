use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::bookings::router::{create_handler, update_status_handler, StatusChange};
use crate::bookings::{booking_router, BookingLifecycle, BookingStatus};
use crate::error::JsonBody;
use crate::listings::Listing;
use crate::storage::{MemoryRepository, Repository};

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn empty_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn create_route_returns_pending_booking() {
    let router = booking_router(Arc::new(harness().lifecycle));

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/bookings",
            serde_json::to_value(request(1, 10)).expect("serialize request"),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], "Pending");
    assert_eq!(body["sitter_id"], 2);
}

#[tokio::test]
async fn create_route_rejects_invalid_request() {
    let mut backwards = request(1, 10);
    backwards.start_date = date(2, 1);

    let response = booking_router(Arc::new(harness().lifecycle))
        .oneshot(json_request(
            "POST",
            "/api/bookings",
            serde_json::to_value(backwards).expect("serialize request"),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .expect("message")
        .contains("must be before"));
}

#[tokio::test]
async fn create_route_rejects_malformed_body_as_bad_request() {
    let mut payload = serde_json::to_value(request(1, 10)).expect("serialize request");
    payload["start_date"] = json!("2025-13-01");
    let mut petless = serde_json::to_value(request(1, 10)).expect("serialize request");
    petless
        .as_object_mut()
        .expect("object")
        .remove("pet");

    for body in [payload, petless] {
        let response = booking_router(Arc::new(harness().lifecycle))
            .oneshot(json_request("POST", "/api/bookings", body))
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json_body(response).await;
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn create_route_refuses_overflowing_derived_price() {
    let harness = harness();
    let mut penthouse = listing(30, 4, None);
    penthouse.price = rust_decimal::Decimal::MAX;
    harness.listings.insert(penthouse).expect("seed listing");
    let mut stay = request(1, 30);
    stay.total_price = None;
    stay.end_date = date(1, 11);

    let response = booking_router(Arc::new(harness.lifecycle))
        .oneshot(json_request(
            "POST",
            "/api/bookings",
            serde_json::to_value(stay).expect("serialize request"),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .expect("message")
        .contains("overflows"));
    assert!(harness.bookings.is_empty());
}

#[tokio::test]
async fn status_route_applies_transition() {
    let harness = harness();
    let booking = harness
        .lifecycle
        .create_booking(request(1, 10))
        .expect("booking")
        .booking;
    let router = booking_router(Arc::new(harness.lifecycle));

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/bookings/{}/status", booking.id),
            json!({ "status": "Accepted" }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], "Accepted");
    assert!(!body["accepted_at"].is_null());

    let response = router
        .oneshot(json_request(
            "PUT",
            &format!("/api/bookings/{}/status", booking.id),
            json!({ "status": "Pending" }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_route_reports_missing_booking_and_unknown_status_as_bad_request() {
    let harness = harness();
    let booking = harness
        .lifecycle
        .create_booking(request(1, 10))
        .expect("booking")
        .booking;
    let router = booking_router(Arc::new(harness.lifecycle));

    let missing = router
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/bookings/404/status",
            json!({ "status": "Accepted" }),
        ))
        .await
        .expect("router responds");
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let lowercase = router
        .oneshot(json_request(
            "PUT",
            &format!("/api/bookings/{}/status", booking.id),
            json!({ "status": "accepted" }),
        ))
        .await
        .expect("router responds");
    assert_eq!(lowercase.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(lowercase).await;
    assert!(body["error"]
        .as_str()
        .expect("message")
        .contains("unknown booking status"));
}

#[tokio::test]
async fn get_route_returns_not_found_for_missing_booking() {
    let response = booking_router(Arc::new(harness().lifecycle))
        .oneshot(empty_request("/api/bookings/404"))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_routes_return_newest_first() {
    let harness = harness();
    let older = harness
        .lifecycle
        .create_booking(request(1, 10))
        .expect("booking")
        .booking;
    let newer = harness
        .lifecycle
        .create_booking(request(1, 20))
        .expect("booking")
        .booking;
    let router = booking_router(Arc::new(harness.lifecycle));

    let response = router
        .clone()
        .oneshot(empty_request("/api/bookings/user/1"))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let ids: Vec<u64> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|booking| booking["id"].as_u64().expect("id"))
        .collect();
    assert_eq!(ids, vec![newer.id.0, older.id.0]);

    let response = router
        .oneshot(empty_request("/api/bookings/owner/3"))
        .await
        .expect("router responds");
    let body = read_json_body(response).await;
    assert_eq!(body.as_array().expect("array").len(), 1);
}

#[tokio::test]
async fn status_handler_returns_conflict_when_race_is_lost() {
    let inner = MemoryRepository::new();
    let lifecycle = Arc::new(BookingLifecycle::new(
        Arc::new(RacingRepository {
            inner: inner.clone(),
            competing: BookingStatus::Rejected,
        }),
        Arc::new(MemoryRepository::seeded([listing(10, 2, None)])),
        Arc::new(FailingSink),
    ));
    let booking = lifecycle
        .create_booking(request(1, 10))
        .expect("booking")
        .booking;

    let response = update_status_handler::<RacingRepository, MemoryRepository<Listing>, FailingSink>(
        State(lifecycle),
        Path(booking.id.0),
        JsonBody(StatusChange {
            status: "Accepted".to_string(),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn create_handler_hides_storage_failures() {
    let lifecycle = Arc::new(BookingLifecycle::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryRepository::seeded([listing(10, 2, None)])),
        Arc::new(FailingSink),
    ));

    let response = create_handler::<UnavailableRepository, MemoryRepository<Listing>, FailingSink>(
        State(lifecycle),
        JsonBody(request(1, 10)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json_body(response).await;
    assert_eq!(body["error"], "internal server error");
}
