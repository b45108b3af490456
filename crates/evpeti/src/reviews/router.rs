use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};

use super::aggregator::{RatingAggregator, ReviewError};
use super::domain::{NewReview, Review};
use crate::bookings::{Booking, BookingId};
use crate::error::{json_error, JsonBody};
use crate::storage::Repository;
use crate::users::{User, UserId};

pub fn review_router<R, B, U>(aggregator: Arc<RatingAggregator<R, B, U>>) -> Router
where
    R: Repository<Review> + 'static,
    B: Repository<Booking> + 'static,
    U: Repository<User> + 'static,
{
    Router::new()
        .route("/api/reviews", post(create_handler::<R, B, U>))
        .route("/api/reviews/user/:user_id", get(user_handler::<R, B, U>))
        .route(
            "/api/reviews/booking/:booking_id",
            get(booking_handler::<R, B, U>),
        )
        .with_state(aggregator)
}

pub(crate) async fn create_handler<R, B, U>(
    State(aggregator): State<Arc<RatingAggregator<R, B, U>>>,
    JsonBody(submission): JsonBody<NewReview>,
) -> Response
where
    R: Repository<Review> + 'static,
    B: Repository<Booking> + 'static,
    U: Repository<User> + 'static,
{
    match aggregator.file_review(submission) {
        Ok(filed) => (StatusCode::CREATED, axum::Json(filed)).into_response(),
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn user_handler<R, B, U>(
    State(aggregator): State<Arc<RatingAggregator<R, B, U>>>,
    Path(user_id): Path<u64>,
) -> Response
where
    R: Repository<Review> + 'static,
    B: Repository<Booking> + 'static,
    U: Repository<User> + 'static,
{
    match aggregator.reviews_for_user(UserId(user_id)) {
        Ok(reviews) => (StatusCode::OK, axum::Json(reviews)).into_response(),
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn booking_handler<R, B, U>(
    State(aggregator): State<Arc<RatingAggregator<R, B, U>>>,
    Path(booking_id): Path<u64>,
) -> Response
where
    R: Repository<Review> + 'static,
    B: Repository<Booking> + 'static,
    U: Repository<User> + 'static,
{
    match aggregator.reviews_for_booking(BookingId(booking_id)) {
        Ok(reviews) => (StatusCode::OK, axum::Json(reviews)).into_response(),
        Err(err) => review_error_response(err),
    }
}

fn review_error_response(err: ReviewError) -> Response {
    let status = match err {
        ReviewError::Invalid(_) => StatusCode::BAD_REQUEST,
        ReviewError::BookingNotFound(_) | ReviewError::UserNotFound(_) => StatusCode::NOT_FOUND,
        ReviewError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, &err)
}
