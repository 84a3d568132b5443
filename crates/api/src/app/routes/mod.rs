use axum::{routing::get, Router};

pub mod actions;
pub mod items;
pub mod system;
pub mod views;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/", get(views::view).post(actions::dispatch))
        .route("/whoami", get(system::whoami))
        .route("/integrity", get(system::integrity))
        .route("/items", get(items::list_items))
        .route("/items/:id", get(items::get_item))
        .route("/items/:id/transfers", get(items::item_transfers))
        .route("/photos/:id", get(items::get_photo))
}
