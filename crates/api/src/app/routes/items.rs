use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use medinv_core::ItemId;
use medinv_infra::ListOptions;
use medinv_inventory::SortDirection;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListItemsQuery>,
) -> axum::response::Response {
    let options = ListOptions {
        sort: query.sort.map(|field| (field, query.direction.unwrap_or(SortDirection::Asc))),
        page: query.page.unwrap_or(1),
        per_page: query.per_page,
    };

    match services.inventory.search_page(&query.criteria(), options) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.inventory.get_item(&id) {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn item_transfers(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.inventory.transfer_history(&id) {
        Ok(history) => (StatusCode::OK, Json(history)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// Raw photo bytes with their content type.
pub async fn get_photo(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match services.inventory.photo(&id) {
        Ok(photo) => (StatusCode::OK, [(header::CONTENT_TYPE, photo.mime_type)], photo.bytes).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
