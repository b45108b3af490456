use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Router,
};
use serde_json::json;

use super::dispatcher::{NotificationDispatcher, NotificationError};
use super::domain::{Notification, NotificationId};
use crate::error::json_error;
use crate::storage::Repository;
use crate::users::UserId;

pub fn notification_router<N>(dispatcher: Arc<NotificationDispatcher<N>>) -> Router
where
    N: Repository<Notification> + 'static,
{
    Router::new()
        .route("/api/notifications/user/:user_id", get(list_handler::<N>))
        .route(
            "/api/notifications/user/:user_id/unread-count",
            get(unread_count_handler::<N>),
        )
        .route(
            "/api/notifications/user/:user_id/mark-all-read",
            put(mark_all_read_handler::<N>),
        )
        .route(
            "/api/notifications/:notification_id/mark-read",
            put(mark_read_handler::<N>),
        )
        .with_state(dispatcher)
}

pub(crate) async fn list_handler<N>(
    State(dispatcher): State<Arc<NotificationDispatcher<N>>>,
    Path(user_id): Path<u64>,
) -> Response
where
    N: Repository<Notification> + 'static,
{
    match dispatcher.list_for_user(UserId(user_id)) {
        Ok(notifications) => (StatusCode::OK, axum::Json(notifications)).into_response(),
        Err(err) => notification_error_response(err),
    }
}

pub(crate) async fn unread_count_handler<N>(
    State(dispatcher): State<Arc<NotificationDispatcher<N>>>,
    Path(user_id): Path<u64>,
) -> Response
where
    N: Repository<Notification> + 'static,
{
    match dispatcher.unread_count(UserId(user_id)) {
        Ok(count) => (StatusCode::OK, axum::Json(json!({ "count": count }))).into_response(),
        Err(err) => notification_error_response(err),
    }
}

pub(crate) async fn mark_read_handler<N>(
    State(dispatcher): State<Arc<NotificationDispatcher<N>>>,
    Path(notification_id): Path<u64>,
) -> Response
where
    N: Repository<Notification> + 'static,
{
    match dispatcher.mark_read(NotificationId(notification_id)) {
        Ok(notification) => (StatusCode::OK, axum::Json(notification)).into_response(),
        Err(err) => notification_error_response(err),
    }
}

pub(crate) async fn mark_all_read_handler<N>(
    State(dispatcher): State<Arc<NotificationDispatcher<N>>>,
    Path(user_id): Path<u64>,
) -> Response
where
    N: Repository<Notification> + 'static,
{
    match dispatcher.mark_all_read(UserId(user_id)) {
        Ok(updated) => (StatusCode::OK, axum::Json(json!({ "updated": updated }))).into_response(),
        Err(err) => notification_error_response(err),
    }
}

fn notification_error_response(err: NotificationError) -> Response {
    let status = match err {
        NotificationError::NotFound(_) => StatusCode::NOT_FOUND,
        NotificationError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, &err)
}
