//! `GET /?action=`: page view-models as JSON.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use medinv_core::{DomainResult, ItemId};
use medinv_inventory::item::{CalibrationStatus, ItemStatus};
use medinv_inventory::nomenclature;
use medinv_inventory::query::REQUIRES_CALIBRATION;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

/// Which page to render. Unknown names fall back to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Add,
    Edit,
    Transfers,
    Nomenclature,
}

impl View {
    pub fn parse(action: Option<&str>) -> Self {
        match action.map(str::trim) {
            Some("add") => View::Add,
            Some("edit") => View::Edit,
            Some("transfers") => View::Transfers,
            Some("nomenclature") => View::Nomenclature,
            _ => View::Dashboard,
        }
    }

    fn name(self) -> &'static str {
        match self {
            View::Dashboard => "dashboard",
            View::Add => "add",
            View::Edit => "edit",
            View::Transfers => "transfers",
            View::Nomenclature => "nomenclature",
        }
    }
}

pub async fn view(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Query(query): Query<dto::ViewQuery>,
) -> axum::response::Response {
    let view = View::parse(query.action.as_deref());

    let body = match view {
        View::Dashboard => dashboard(&services),
        View::Add => add_form(&services),
        View::Edit => match query.id.as_deref() {
            Some(id) => edit_form(&services, id),
            None => return errors::failure(StatusCode::BAD_REQUEST, "an item id is required to edit"),
        },
        View::Transfers => transfers(&services),
        View::Nomenclature => Ok(json!({ "rules": nomenclature::rules() })),
    };

    match body {
        Ok(mut body) => {
            if let Some(obj) = body.as_object_mut() {
                obj.insert("view".into(), json!(view.name()));
                obj.insert("organization".into(), json!(services.config().organization_name));
                obj.insert(
                    "user".into(),
                    json!({ "email": ctx.actor().email(), "name": ctx.actor().display_name() }),
                );
            }
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

fn status_options() -> Vec<&'static str> {
    ItemStatus::ALL.iter().map(|s| s.label()).collect()
}

fn calibration_filter_options() -> Vec<&'static str> {
    std::iter::once(REQUIRES_CALIBRATION)
        .chain(CalibrationStatus::ALL.iter().map(|s| s.label()))
        .collect()
}

fn dashboard(services: &AppServices) -> DomainResult<Value> {
    let inventory = &services.inventory;
    Ok(json!({
        "summary": inventory.summary()?,
        "recent_items": inventory.recent_items()?,
        "locations": inventory.locations()?,
        "statuses": status_options(),
        "calibration_filters": calibration_filter_options(),
    }))
}

fn add_form(services: &AppServices) -> DomainResult<Value> {
    Ok(json!({
        "locations": services.inventory.locations()?,
        "statuses": status_options(),
        "equipment_types": nomenclature::EQUIPMENT_TYPES,
        "max_photos": services.config().max_photos_per_item,
    }))
}

fn edit_form(services: &AppServices, id: &str) -> DomainResult<Value> {
    let id: ItemId = id.parse()?;
    let item = services.inventory.get_item(&id)?;
    let history = services.inventory.transfer_history(&id)?;
    Ok(json!({
        "item": item,
        "transfer_history": history,
        "locations": services.inventory.locations()?,
        "statuses": status_options(),
        "max_photos": services.config().max_photos_per_item,
    }))
}

fn transfers(services: &AppServices) -> DomainResult<Value> {
    let inventory = &services.inventory;
    Ok(json!({
        "items": inventory.item_options()?,
        "locations": inventory.locations()?,
        "recent_transfers": inventory.recent_transfers(services.config().page_size)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_views_fall_back_to_dashboard() {
        assert_eq!(View::parse(None), View::Dashboard);
        assert_eq!(View::parse(Some("reports")), View::Dashboard);
        assert_eq!(View::parse(Some("edit")), View::Edit);
        assert_eq!(View::parse(Some(" nomenclature ")), View::Nomenclature);
    }

    #[test]
    fn calibration_filters_start_with_requires_calibration() {
        let options = calibration_filter_options();
        assert_eq!(options[0], REQUIRES_CALIBRATION);
        assert_eq!(options.len(), 5);
    }
}
