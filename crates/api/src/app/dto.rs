use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use axum::http::StatusCode;

use medinv_inventory::{ItemForm, SearchCriteria, SortDirection, SortField};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

/// Every POST body carries an `action` next to the action's own fields.
#[derive(Debug, Deserialize)]
pub struct ActionEnvelope {
    pub action: String,
}

#[derive(Debug, Deserialize)]
pub struct EditItemRequest {
    pub id: String,
    #[serde(flatten)]
    pub form: ItemForm,
}

#[derive(Debug, Deserialize)]
pub struct DeleteItemRequest {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadPhotoRequest {
    pub item_id: String,
    /// Base64 payload or data URL.
    pub data: String,
    pub mime_type: String,
}

#[derive(Debug, Deserialize)]
pub struct DeletePhotoRequest {
    pub item_id: String,
    pub photo_id: String,
}

/// `GET /?action=...&id=...`
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    pub action: Option<String>,
    pub id: Option<String>,
}

/// `GET /items` filters, sorting and paging.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListItemsQuery {
    pub text: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
    pub calibration: Option<String>,
    pub sort: Option<SortField>,
    pub direction: Option<SortDirection>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl ListItemsQuery {
    pub fn criteria(&self) -> SearchCriteria {
        SearchCriteria {
            text: self.text.clone(),
            status: self.status.clone(),
            location: self.location.clone(),
            calibration: self.calibration.clone(),
        }
    }
}

// -------------------------
// Parsing helpers
// -------------------------

/// Decode an action payload, turning serde errors into a 400 envelope.
pub fn parse_body<T: DeserializeOwned>(value: Value) -> Result<T, axum::response::Response> {
    serde_json::from_value(value)
        .map_err(|e| errors::failure(StatusCode::BAD_REQUEST, format!("invalid request: {e}")))
}
