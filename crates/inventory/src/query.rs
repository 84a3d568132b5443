//! Read-side helpers over full in-memory result sets: search, sort,
//! pagination and dashboard aggregation.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use medinv_core::{Entity, ItemId};

use crate::item::{CalibrationStatus, InventoryItem};
use crate::transfer::Transfer;

/// Calibration filter value selecting every item that requires calibration.
pub const REQUIRES_CALIBRATION: &str = "RequiresCalibration";

/// Search filters. `None`, blank, or `"all"` disables a filter.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchCriteria {
    pub text: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
    pub calibration: Option<String>,
}

/// Trimmed filter value, or `None` when blank or `All`.
fn active(filter: &Option<String>) -> Option<&str> {
    filter
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

/// Apply the criteria in fixed order (text, status, location, calibration).
///
/// Filters are independent (AND); relative order of the input is preserved.
pub fn search(items: Vec<InventoryItem>, criteria: &SearchCriteria) -> Vec<InventoryItem> {
    let mut results = items;

    if let Some(text) = active(&criteria.text) {
        let needle = text.to_lowercase();
        results.retain(|item| {
            item.name.to_lowercase().contains(&needle)
                || item.inventory_code.to_lowercase().contains(&needle)
                || item.serial_number.to_lowercase().contains(&needle)
        });
    }

    if let Some(status) = active(&criteria.status) {
        results.retain(|item| item.status.label() == status);
    }

    if let Some(location) = active(&criteria.location) {
        results.retain(|item| item.current_location == location);
    }

    if let Some(calibration) = active(&criteria.calibration) {
        if calibration == REQUIRES_CALIBRATION {
            results.retain(|item| item.requires_calibration);
        } else {
            results.retain(|item| item.calibration_status().label() == calibration);
        }
    }

    results
}

/// Sortable item fields.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    InventoryCode,
    SerialNumber,
    Status,
    CurrentLocation,
    CalibrationStatus,
    LastCalibrationDate,
    NextCalibrationDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

enum SortKey<'a> {
    Text(&'a str),
    Date(Option<DateTime<Utc>>),
}

fn sort_key(item: &InventoryItem, field: SortField) -> SortKey<'_> {
    match field {
        SortField::Name => SortKey::Text(&item.name),
        SortField::InventoryCode => SortKey::Text(&item.inventory_code),
        SortField::SerialNumber => SortKey::Text(&item.serial_number),
        SortField::Status => SortKey::Text(item.status.label()),
        SortField::CurrentLocation => SortKey::Text(&item.current_location),
        SortField::CalibrationStatus => SortKey::Text(item.calibration_status().label()),
        SortField::LastCalibrationDate => SortKey::Date(item.last_calibration_date),
        SortField::NextCalibrationDate => SortKey::Date(item.next_calibration_date),
        SortField::CreatedAt => SortKey::Date(Some(item.created_at())),
        SortField::UpdatedAt => SortKey::Date(Some(item.updated_at())),
    }
}

fn compare_keys(a: &SortKey<'_>, b: &SortKey<'_>) -> Ordering {
    match (a, b) {
        (SortKey::Text(a), SortKey::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (SortKey::Date(a), SortKey::Date(b)) => a.cmp(b),
        // Both keys always come from the same field.
        _ => Ordering::Equal,
    }
}

/// Stable sort on one field. Text compares case-insensitively; missing dates
/// sort before present ones in ascending order.
pub fn sort_by(items: &mut [InventoryItem], field: SortField, direction: SortDirection) {
    items.sort_by(|a, b| {
        let ord = compare_keys(&sort_key(a, field), &sort_key(b, field));
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

/// One page of a larger result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

/// Slice out a 1-based page. Page 0 is treated as page 1.
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let page = page.max(1);
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page);

    let start = (page - 1).saturating_mul(per_page);
    let items = items.into_iter().skip(start).take(per_page).collect();

    Page {
        items,
        current_page: page,
        total_pages,
        total_items,
        has_previous: page > 1,
        has_next: page < total_pages,
    }
}

/// Compact item listing used by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentItem {
    pub id: ItemId,
    pub name: String,
    pub inventory_code: String,
    pub status: String,
    pub current_location: String,
    pub calibration_status: String,
    pub updated_at: DateTime<Utc>,
}

/// Most recently updated items first.
pub fn recent_items(mut items: Vec<InventoryItem>, limit: usize) -> Vec<RecentItem> {
    items.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
    items
        .into_iter()
        .take(limit)
        .map(|item| RecentItem {
            id: item.id().clone(),
            status: item.status.label().to_string(),
            calibration_status: item.calibration_status().label().to_string(),
            updated_at: item.updated_at(),
            name: item.name,
            inventory_code: item.inventory_code,
            current_location: item.current_location,
        })
        .collect()
}

/// A transfer joined with the name/code of its item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferView {
    pub id: String,
    pub item_id: String,
    pub item_name: String,
    pub item_code: String,
    pub origin_location: String,
    pub destination_location: String,
    pub transfer_date: DateTime<Utc>,
    pub performed_by: String,
    pub notes: String,
}

/// Newest `limit` transfers, resolved against `items`.
///
/// Transfers whose item no longer exists are kept and shown as `Unknown`.
pub fn recent_transfers(items: &[InventoryItem], mut transfers: Vec<Transfer>, limit: usize) -> Vec<TransferView> {
    let by_id: HashMap<&ItemId, &InventoryItem> = items.iter().map(|i| (i.id(), i)).collect();

    transfers.sort_by(|a, b| b.transfer_date.cmp(&a.transfer_date));
    transfers
        .into_iter()
        .take(limit)
        .map(|t| {
            let item = by_id.get(&t.item_id);
            TransferView {
                id: t.id().to_string(),
                item_id: t.item_id.to_string(),
                item_name: item.map_or_else(|| "Unknown".to_string(), |i| i.name.clone()),
                item_code: item.map_or_else(|| "N/A".to_string(), |i| i.inventory_code.clone()),
                origin_location: t.origin_location().to_string(),
                destination_location: t.destination_location,
                transfer_date: t.transfer_date,
                performed_by: t.performed_by,
                notes: t.notes,
            }
        })
        .collect()
}

/// Transfer history of one item, newest first.
pub fn transfer_history(transfers: Vec<Transfer>, item_id: &ItemId) -> Vec<Transfer> {
    let mut history: Vec<Transfer> = transfers.into_iter().filter(|t| &t.item_id == item_id).collect();
    history.sort_by(|a, b| b.transfer_date.cmp(&a.transfer_date));
    history
}

/// Dashboard aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_items: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_location: BTreeMap<String, usize>,
    pub calibration_overdue: usize,
    pub calibration_due_soon: usize,
    pub recent_transfers: Vec<TransferView>,
}

/// Single pass over `items` plus the newest `recent_n` transfers.
///
/// Calibration counts use the status derived at `now`, so rows saved long ago
/// are still reported correctly.
pub fn summarize(
    items: &[InventoryItem],
    transfers: Vec<Transfer>,
    now: DateTime<Utc>,
    soon_days: i64,
    recent_n: usize,
) -> Summary {
    let horizon = now + Duration::days(soon_days);
    let mut by_status = BTreeMap::new();
    let mut by_location = BTreeMap::new();
    let mut calibration_overdue = 0;
    let mut calibration_due_soon = 0;

    for item in items {
        *by_status.entry(item.status.label().to_string()).or_insert(0) += 1;
        *by_location.entry(item.current_location.clone()).or_insert(0) += 1;

        if !item.requires_calibration {
            continue;
        }
        if item.calibration_status_at(now) == CalibrationStatus::Overdue {
            calibration_overdue += 1;
        } else if item.next_calibration_date.is_some_and(|next| next <= horizon) {
            calibration_due_soon += 1;
        }
    }

    Summary {
        total_items: items.len(),
        by_status,
        by_location,
        calibration_overdue,
        calibration_due_soon,
        recent_transfers: recent_transfers(items, transfers, recent_n),
    }
}

/// Predefined locations plus every location in use, deduplicated and sorted.
pub fn location_options(items: &[InventoryItem], predefined: &[String]) -> Vec<String> {
    predefined
        .iter()
        .cloned()
        .chain(items.iter().map(|i| i.current_location.clone()))
        .filter(|l| !l.trim().is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Id/name/code/location tuples for item pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOption {
    pub id: ItemId,
    pub name: String,
    pub code: String,
    pub location: String,
}

pub fn item_options(items: &[InventoryItem]) -> Vec<ItemOption> {
    items
        .iter()
        .map(|i| ItemOption {
            id: i.id().clone(),
            name: i.name.clone(),
            code: i.inventory_code.clone(),
            location: i.current_location.clone(),
        })
        .collect()
}
