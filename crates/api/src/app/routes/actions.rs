//! `POST /`: form actions dispatched on the `action` field.

use std::sync::Arc;

use axum::{body::Bytes, extract::Extension, http::StatusCode};
use serde_json::{json, Value};
use tracing::warn;

use medinv_core::{DomainResult, ItemId};
use medinv_infra::PhotoUpload;
use medinv_inventory::{ItemForm, TransferForm};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub async fn dispatch(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    body: Bytes,
) -> axum::response::Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "unparsable action body");
            return errors::failure(StatusCode::BAD_REQUEST, format!("invalid request body: {e}"));
        }
    };
    let envelope: dto::ActionEnvelope = match dto::parse_body(value.clone()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match envelope.action.as_str() {
        "add_item" => add_item(&services, &ctx, value),
        "edit_item" => edit_item(&services, &ctx, value),
        "delete_item" => delete_item(&services, &ctx, value),
        "record_transfer" => record_transfer(&services, &ctx, value),
        "upload_photo" => upload_photo(&services, &ctx, value),
        "delete_photo" => delete_photo(&services, &ctx, value),
        other => {
            warn!(action = other, actor = %ctx.actor(), "unknown action");
            errors::failure(StatusCode::BAD_REQUEST, "invalid action")
        }
    }
}

fn respond(result: DomainResult<axum::response::Response>) -> axum::response::Response {
    result.unwrap_or_else(errors::domain_error_to_response)
}

fn add_item(services: &AppServices, ctx: &ActorContext, value: Value) -> axum::response::Response {
    let form: ItemForm = match dto::parse_body(value) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(services.inventory.add_item(&form, ctx.actor()).map(|id| {
        errors::success("item added", json!({ "item_id": id }))
    }))
}

fn edit_item(services: &AppServices, ctx: &ActorContext, value: Value) -> axum::response::Response {
    let req: dto::EditItemRequest = match dto::parse_body(value) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond((|| -> DomainResult<_> {
        let id: ItemId = req.id.parse()?;
        services.inventory.edit_item(&id, &req.form, ctx.actor())?;
        Ok(errors::success("item updated", json!({ "item_id": id })))
    })())
}

fn delete_item(services: &AppServices, ctx: &ActorContext, value: Value) -> axum::response::Response {
    let req: dto::DeleteItemRequest = match dto::parse_body(value) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond((|| -> DomainResult<_> {
        let id: ItemId = req.id.parse()?;
        services.inventory.delete_item(&id, ctx.actor())?;
        Ok(errors::success("item deleted", json!({ "item_id": id })))
    })())
}

fn record_transfer(services: &AppServices, ctx: &ActorContext, value: Value) -> axum::response::Response {
    let form: TransferForm = match dto::parse_body(value) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(services.inventory.submit_transfer(&form, ctx.actor()).map(|id| {
        errors::success("transfer recorded", json!({ "transfer_id": id }))
    }))
}

fn upload_photo(services: &AppServices, ctx: &ActorContext, value: Value) -> axum::response::Response {
    let req: dto::UploadPhotoRequest = match dto::parse_body(value) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond((|| -> DomainResult<_> {
        let id: ItemId = req.item_id.parse()?;
        let upload = PhotoUpload {
            data: req.data,
            mime_type: req.mime_type,
        };
        let photo_id = services.inventory.upload_photo(&id, &upload, ctx.actor())?;
        Ok(errors::success("photo uploaded", json!({ "item_id": id, "photo_id": photo_id })))
    })())
}

fn delete_photo(services: &AppServices, ctx: &ActorContext, value: Value) -> axum::response::Response {
    let req: dto::DeletePhotoRequest = match dto::parse_body(value) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond((|| -> DomainResult<_> {
        let id: ItemId = req.item_id.parse()?;
        services.inventory.remove_photo(&id, &req.photo_id, ctx.actor())?;
        Ok(errors::success("photo deleted", json!({ "item_id": id, "photo_id": req.photo_id })))
    })())
}
