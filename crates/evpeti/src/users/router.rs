use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};

use super::directory::{UserDirectory, UserError};
use super::domain::{NewUser, User, UserId};
use crate::error::{json_error, JsonBody};
use crate::storage::Repository;

/// Profile endpoints. Registration here only creates the marketplace profile.
pub fn user_router<U>(directory: Arc<UserDirectory<U>>) -> Router
where
    U: Repository<User> + 'static,
{
    Router::new()
        .route("/api/users", post(register_handler::<U>))
        .route("/api/users/:user_id", get(get_handler::<U>))
        .with_state(directory)
}

pub(crate) async fn register_handler<U>(
    State(directory): State<Arc<UserDirectory<U>>>,
    JsonBody(request): JsonBody<NewUser>,
) -> Response
where
    U: Repository<User> + 'static,
{
    match directory.register(request) {
        Ok(user) => (StatusCode::CREATED, axum::Json(user)).into_response(),
        Err(err) => user_error_response(err),
    }
}

pub(crate) async fn get_handler<U>(
    State(directory): State<Arc<UserDirectory<U>>>,
    Path(user_id): Path<u64>,
) -> Response
where
    U: Repository<User> + 'static,
{
    match directory.get(UserId(user_id)) {
        Ok(user) => (StatusCode::OK, axum::Json(user)).into_response(),
        Err(err) => user_error_response(err),
    }
}

fn user_error_response(err: UserError) -> Response {
    let status = match err {
        UserError::MissingName | UserError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
        UserError::DuplicateEmail(_) => StatusCode::CONFLICT,
        UserError::NotFound(_) => StatusCode::NOT_FOUND,
        UserError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, &err)
}
