use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};

use super::domain::{Booking, BookingId, BookingRequest};
use super::lifecycle::{BookingError, BookingLifecycle};
use crate::error::{json_error, JsonBody};
use crate::listings::{Listing, ListingId};
use crate::notifications::NotificationSink;
use crate::storage::Repository;
use crate::users::UserId;

/// Body of `PUT /api/bookings/:booking_id/status`. The status stays a string so unknown values
/// are reported as validation failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: String,
}

pub fn booking_router<B, L, S>(lifecycle: Arc<BookingLifecycle<B, L, S>>) -> Router
where
    B: Repository<Booking> + 'static,
    L: Repository<Listing> + 'static,
    S: NotificationSink + 'static,
{
    Router::new()
        .route("/api/bookings", post(create_handler::<B, L, S>))
        .route("/api/bookings/:booking_id", get(get_handler::<B, L, S>))
        .route(
            "/api/bookings/:booking_id/status",
            put(update_status_handler::<B, L, S>),
        )
        .route("/api/bookings/user/:user_id", get(user_handler::<B, L, S>))
        .route(
            "/api/bookings/listing/:listing_id",
            get(listing_handler::<B, L, S>),
        )
        .route(
            "/api/bookings/owner/:owner_id",
            get(owner_handler::<B, L, S>),
        )
        .with_state(lifecycle)
}

pub(crate) async fn create_handler<B, L, S>(
    State(lifecycle): State<Arc<BookingLifecycle<B, L, S>>>,
    JsonBody(request): JsonBody<BookingRequest>,
) -> Response
where
    B: Repository<Booking> + 'static,
    L: Repository<Listing> + 'static,
    S: NotificationSink + 'static,
{
    match lifecycle.create_booking(request) {
        Ok(outcome) => (StatusCode::CREATED, axum::Json(outcome.booking)).into_response(),
        Err(err) => booking_error_response(err, StatusCode::NOT_FOUND),
    }
}

pub(crate) async fn get_handler<B, L, S>(
    State(lifecycle): State<Arc<BookingLifecycle<B, L, S>>>,
    Path(booking_id): Path<u64>,
) -> Response
where
    B: Repository<Booking> + 'static,
    L: Repository<Listing> + 'static,
    S: NotificationSink + 'static,
{
    match lifecycle.get_booking(BookingId(booking_id)) {
        Ok(booking) => (StatusCode::OK, axum::Json(booking)).into_response(),
        Err(err) => booking_error_response(err, StatusCode::NOT_FOUND),
    }
}

pub(crate) async fn update_status_handler<B, L, S>(
    State(lifecycle): State<Arc<BookingLifecycle<B, L, S>>>,
    Path(booking_id): Path<u64>,
    JsonBody(change): JsonBody<StatusChange>,
) -> Response
where
    B: Repository<Booking> + 'static,
    L: Repository<Listing> + 'static,
    S: NotificationSink + 'static,
{
    match lifecycle.update_status_label(BookingId(booking_id), &change.status) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome.booking)).into_response(),
        // Status updates report a missing booking as a bad request.
        Err(err) => booking_error_response(err, StatusCode::BAD_REQUEST),
    }
}

pub(crate) async fn user_handler<B, L, S>(
    State(lifecycle): State<Arc<BookingLifecycle<B, L, S>>>,
    Path(user_id): Path<u64>,
) -> Response
where
    B: Repository<Booking> + 'static,
    L: Repository<Listing> + 'static,
    S: NotificationSink + 'static,
{
    list_response(lifecycle.bookings_for_user(UserId(user_id)))
}

pub(crate) async fn listing_handler<B, L, S>(
    State(lifecycle): State<Arc<BookingLifecycle<B, L, S>>>,
    Path(listing_id): Path<u64>,
) -> Response
where
    B: Repository<Booking> + 'static,
    L: Repository<Listing> + 'static,
    S: NotificationSink + 'static,
{
    list_response(lifecycle.bookings_for_listing(ListingId(listing_id)))
}

pub(crate) async fn owner_handler<B, L, S>(
    State(lifecycle): State<Arc<BookingLifecycle<B, L, S>>>,
    Path(owner_id): Path<u64>,
) -> Response
where
    B: Repository<Booking> + 'static,
    L: Repository<Listing> + 'static,
    S: NotificationSink + 'static,
{
    list_response(lifecycle.bookings_for_listing_owner(UserId(owner_id)))
}

fn list_response(result: Result<Vec<Booking>, BookingError>) -> Response {
    match result {
        Ok(bookings) => (StatusCode::OK, axum::Json(bookings)).into_response(),
        Err(err) => booking_error_response(err, StatusCode::NOT_FOUND),
    }
}

fn booking_error_response(err: BookingError, missing: StatusCode) -> Response {
    let status = match err {
        BookingError::Invalid(_)
        | BookingError::IllegalTransition { .. }
        | BookingError::UnknownStatus(_) => StatusCode::BAD_REQUEST,
        BookingError::NotFound(_) => missing,
        BookingError::ConcurrentUpdate(_) => StatusCode::CONFLICT,
        BookingError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, &err)
}
