use crate::bookings::BookingError;
use crate::config::ConfigError;
use crate::listings::{ListingError, ListingImportError};
use crate::notifications::NotificationError;
use crate::reviews::ReviewError;
use crate::telemetry::TelemetryError;
use crate::users::UserError;
use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Import(ListingImportError),
    User(UserError),
    Listing(ListingError),
    Booking(BookingError),
    Notification(NotificationError),
    Review(ReviewError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Import(err) => write!(f, "listing import error: {}", err),
            AppError::User(err) => write!(f, "user error: {}", err),
            AppError::Listing(err) => write!(f, "listing error: {}", err),
            AppError::Booking(err) => write!(f, "booking error: {}", err),
            AppError::Notification(err) => write!(f, "notification error: {}", err),
            AppError::Review(err) => write!(f, "review error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::User(err) => Some(err),
            AppError::Listing(err) => Some(err),
            AppError::Booking(err) => Some(err),
            AppError::Notification(err) => Some(err),
            AppError::Review(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Import(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::User(_)
            | AppError::Listing(_)
            | AppError::Booking(_)
            | AppError::Notification(_)
            | AppError::Review(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        json_error(status, &self)
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ListingImportError> for AppError {
    fn from(value: ListingImportError) -> Self {
        Self::Import(value)
    }
}

impl From<UserError> for AppError {
    fn from(value: UserError) -> Self {
        Self::User(value)
    }
}

impl From<ListingError> for AppError {
    fn from(value: ListingError) -> Self {
        Self::Listing(value)
    }
}

impl From<BookingError> for AppError {
    fn from(value: BookingError) -> Self {
        Self::Booking(value)
    }
}

impl From<NotificationError> for AppError {
    fn from(value: NotificationError) -> Self {
        Self::Notification(value)
    }
}

impl From<ReviewError> for AppError {
    fn from(value: ReviewError) -> Self {
        Self::Review(value)
    }
}

/// `{"error": ...}` body shared by every router.
///
/// Server-side failures are logged with their detail and reported to the client opaquely.
pub(crate) fn json_error(status: StatusCode, err: &dyn fmt::Display) -> Response {
    let message = if status.is_server_error() {
        tracing::error!(%status, error = %err, "request failed");
        "internal server error".to_string()
    } else {
        err.to_string()
    };

    (status, Json(json!({ "error": message }))).into_response()
}

/// JSON request body whose rejections use the shared `{"error": ...}` shape with status 400,
/// including bodies that parse but do not fit the target type.
#[derive(Debug, Clone)]
pub(crate) struct JsonBody<T>(pub(crate) T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_response(rejection)),
        }
    }
}

fn rejection_response(rejection: JsonRejection) -> Response {
    json_error(StatusCode::BAD_REQUEST, &rejection.body_text())
}
