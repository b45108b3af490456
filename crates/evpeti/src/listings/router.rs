use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use super::catalog::{ListingCatalog, ListingError};
use super::domain::{Listing, ListingDraft, ListingId, ListingUpdate};
use crate::error::{json_error, JsonBody};
use crate::storage::Repository;
use crate::users::UserId;

/// Catalog endpoints: create, read, update, delete, and the active/by-owner queries.
pub fn listing_router<L>(catalog: Arc<ListingCatalog<L>>) -> Router
where
    L: Repository<Listing> + 'static,
{
    Router::new()
        .route(
            "/api/listings",
            get(active_handler::<L>).post(create_handler::<L>),
        )
        .route(
            "/api/listings/:listing_id",
            get(get_handler::<L>)
                .put(update_handler::<L>)
                .delete(delete_handler::<L>),
        )
        .route("/api/listings/user/:user_id", get(owner_handler::<L>))
        .with_state(catalog)
}

pub(crate) async fn create_handler<L>(
    State(catalog): State<Arc<ListingCatalog<L>>>,
    JsonBody(draft): JsonBody<ListingDraft>,
) -> Response
where
    L: Repository<Listing> + 'static,
{
    match catalog.create(draft) {
        Ok(listing) => (StatusCode::CREATED, axum::Json(listing)).into_response(),
        Err(err) => listing_error_response(err),
    }
}

pub(crate) async fn get_handler<L>(
    State(catalog): State<Arc<ListingCatalog<L>>>,
    Path(listing_id): Path<u64>,
) -> Response
where
    L: Repository<Listing> + 'static,
{
    match catalog.get(ListingId(listing_id)) {
        Ok(listing) => (StatusCode::OK, axum::Json(listing)).into_response(),
        Err(err) => listing_error_response(err),
    }
}

pub(crate) async fn update_handler<L>(
    State(catalog): State<Arc<ListingCatalog<L>>>,
    Path(listing_id): Path<u64>,
    JsonBody(update): JsonBody<ListingUpdate>,
) -> Response
where
    L: Repository<Listing> + 'static,
{
    match catalog.update(ListingId(listing_id), update) {
        Ok(listing) => (StatusCode::OK, axum::Json(listing)).into_response(),
        Err(err) => listing_error_response(err),
    }
}

pub(crate) async fn delete_handler<L>(
    State(catalog): State<Arc<ListingCatalog<L>>>,
    Path(listing_id): Path<u64>,
) -> Response
where
    L: Repository<Listing> + 'static,
{
    match catalog.delete(ListingId(listing_id)) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => listing_error_response(err),
    }
}

pub(crate) async fn active_handler<L>(State(catalog): State<Arc<ListingCatalog<L>>>) -> Response
where
    L: Repository<Listing> + 'static,
{
    match catalog.active_listings() {
        Ok(listings) => (StatusCode::OK, axum::Json(listings)).into_response(),
        Err(err) => listing_error_response(err),
    }
}

pub(crate) async fn owner_handler<L>(
    State(catalog): State<Arc<ListingCatalog<L>>>,
    Path(user_id): Path<u64>,
) -> Response
where
    L: Repository<Listing> + 'static,
{
    match catalog.listings_for_owner(UserId(user_id)) {
        Ok(listings) => (StatusCode::OK, axum::Json(listings)).into_response(),
        Err(err) => listing_error_response(err),
    }
}

fn listing_error_response(err: ListingError) -> Response {
    let status = match err {
        ListingError::Invalid(_) => StatusCode::BAD_REQUEST,
        ListingError::NotFound(_) => StatusCode::NOT_FOUND,
        ListingError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, &err)
}
