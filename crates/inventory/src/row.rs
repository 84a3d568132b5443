//! Row layouts for the inventory and transfers tables.
//!
//! Column order is a compatibility contract with data already stored in the
//! sheets: never reorder, only append.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use medinv_core::{DomainError, DomainResult, ItemId, TransferId};

use crate::item::{CalibrationStatus, InventoryItem, ItemStatus};
use crate::transfer::Transfer;

/// A single typed cell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Bool(bool),
    Date(DateTime<Utc>),
}

pub type Row = Vec<Cell>;

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() { Cell::Empty } else { Cell::Text(s) }
    }

    pub fn date(d: Option<DateTime<Utc>>) -> Self {
        d.map(Cell::Date).unwrap_or(Cell::Empty)
    }

    /// Text rendering of any cell (empty cells become "").
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Bool(b) => b.to_string(),
            Cell::Date(d) => d.to_rfc3339(),
        }
    }

    pub fn as_bool(&self) -> DomainResult<bool> {
        match self {
            Cell::Empty => Ok(false),
            Cell::Bool(b) => Ok(*b),
            Cell::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" | "" => Ok(false),
                other => Err(DomainError::storage(format!("not a boolean cell: {other}"))),
            },
            Cell::Date(_) => Err(DomainError::storage("expected a boolean cell, found a date")),
        }
    }

    pub fn as_date(&self) -> DomainResult<Option<DateTime<Utc>>> {
        match self {
            Cell::Empty => Ok(None),
            Cell::Date(d) => Ok(Some(*d)),
            Cell::Text(s) if s.trim().is_empty() => Ok(None),
            Cell::Text(s) => parse_date(s)
                .map(Some)
                .ok_or_else(|| DomainError::storage(format!("not a date cell: {s}"))),
            Cell::Bool(_) => Err(DomainError::storage("expected a date cell, found a boolean")),
        }
    }
}

/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Entities that serialize to one row of a fixed layout.
pub trait RowCodec: Sized {
    /// Header row, in column order.
    const COLUMNS: &'static [&'static str];

    fn to_row(&self) -> Row;

    fn from_row(row: &[Cell]) -> DomainResult<Self>;
}

fn check_width(row: &[Cell], expected: usize, table: &str) -> DomainResult<()> {
    if row.len() < expected {
        return Err(DomainError::storage(format!(
            "{table} row has {} columns, expected {expected}",
            row.len()
        )));
    }
    Ok(())
}

fn required_date(cell: &Cell, column: &str) -> DomainResult<DateTime<Utc>> {
    cell.as_date()?
        .ok_or_else(|| DomainError::storage(format!("missing {column}")))
}

impl InventoryItem {
    /// Position of the inventory code in [`RowCodec::COLUMNS`].
    pub const CODE_COLUMN: usize = 2;
}

impl RowCodec for InventoryItem {
    const COLUMNS: &'static [&'static str] = &[
        "ID",
        "Name",
        "Inventory Code",
        "Serial",
        "Status",
        "Current Location",
        "Requires Calibration",
        "Calibration Status",
        "Last Calibration Date",
        "Next Calibration Date",
        "Notes",
        "Photo IDs",
        "Created At",
        "Updated At",
        "Created By",
    ];

    fn to_row(&self) -> Row {
        vec![
            Cell::text(self.id_typed().as_str()),
            Cell::text(&self.name),
            Cell::text(&self.inventory_code),
            Cell::text(&self.serial_number),
            Cell::text(self.status.label()),
            Cell::text(&self.current_location),
            Cell::Bool(self.requires_calibration),
            Cell::text(self.calibration_status().label()),
            Cell::date(self.last_calibration_date),
            Cell::date(self.next_calibration_date),
            Cell::text(&self.notes),
            Cell::text(self.photo_ids.join(",")),
            Cell::Date(self.created_at()),
            Cell::Date(self.updated_at()),
            Cell::text(self.created_by()),
        ]
    }

    fn from_row(row: &[Cell]) -> DomainResult<Self> {
        check_width(row, Self::COLUMNS.len(), "inventory")?;

        let status_label = row[4].as_text();
        let status = if status_label.trim().is_empty() {
            ItemStatus::default()
        } else {
            ItemStatus::from_label(&status_label)
                .ok_or_else(|| DomainError::storage(format!("unknown item status: {status_label}")))?
        };

        let calibration_label = row[7].as_text();
        let calibration_status = if calibration_label.trim().is_empty() {
            CalibrationStatus::default()
        } else {
            CalibrationStatus::from_label(&calibration_label).ok_or_else(|| {
                DomainError::storage(format!("unknown calibration status: {calibration_label}"))
            })?
        };

        let photos = row[11].as_text();
        let photo_ids = photos
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(InventoryItem::from_parts(
            ItemId::from(row[0].as_text()),
            row[1].as_text(),
            row[2].as_text(),
            row[3].as_text(),
            status,
            row[5].as_text(),
            row[6].as_bool()?,
            calibration_status,
            row[8].as_date()?,
            row[9].as_date()?,
            row[10].as_text(),
            photo_ids,
            required_date(&row[12], "created at")?,
            required_date(&row[13], "updated at")?,
            row[14].as_text(),
        ))
    }
}

impl RowCodec for Transfer {
    const COLUMNS: &'static [&'static str] = &[
        "ID",
        "Item ID",
        "Origin Location",
        "Destination Location",
        "Transfer Date",
        "Performed By",
        "Notes",
    ];

    fn to_row(&self) -> Row {
        vec![
            Cell::text(self.id_typed().as_str()),
            Cell::text(self.item_id.as_str()),
            Cell::text(self.origin_location()),
            Cell::text(&self.destination_location),
            Cell::Date(self.transfer_date),
            Cell::text(&self.performed_by),
            Cell::text(&self.notes),
        ]
    }

    fn from_row(row: &[Cell]) -> DomainResult<Self> {
        check_width(row, Self::COLUMNS.len(), "transfers")?;
        Ok(Transfer::from_parts(
            TransferId::from(row[0].as_text()),
            ItemId::from(row[1].as_text()),
            row[2].as_text(),
            row[3].as_text(),
            required_date(&row[4], "transfer date")?,
            row[5].as_text(),
            row[6].as_text(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use medinv_core::Actor;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn inventory_layout_has_fifteen_columns() {
        let item = InventoryItem::new("Scale", "EO-AGE-002-0824", "Office 1", &Actor::system(), test_time());
        assert_eq!(InventoryItem::COLUMNS.len(), 15);
        assert_eq!(InventoryItem::COLUMNS[InventoryItem::CODE_COLUMN], "Inventory Code");
        assert_eq!(item.to_row().len(), 15);
        assert_eq!(Transfer::COLUMNS.len(), 7);
    }

    #[test]
    fn stored_item_decodes_to_the_same_item() {
        let mut item = InventoryItem::new("Scale", "EO-AGE-002-0824", "Office 1", &Actor::system(), test_time());
        item.requires_calibration = true;
        item.last_calibration_date = Some(test_time());
        item.photo_ids = vec!["p1".into(), "p2".into()];
        item.prepare_for_save(test_time());

        let decoded = InventoryItem::from_row(&item.to_row()).unwrap();
        assert_eq!(decoded, item);
    }

    #[test]
    fn text_encoded_cells_are_tolerated() {
        let mut row = InventoryItem::new("Scale", "EO-AGE-002-0824", "Office 1", &Actor::system(), test_time()).to_row();
        row[6] = Cell::Text("TRUE".into());
        row[8] = Cell::Text("2024-07-01".into());
        row[11] = Cell::Empty;

        let item = InventoryItem::from_row(&row).unwrap();
        assert!(item.requires_calibration);
        assert_eq!(item.last_calibration_date, Some(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()));
        assert!(item.photo_ids.is_empty());
    }

    #[test]
    fn short_rows_are_rejected() {
        let err = Transfer::from_row(&[Cell::text("TRA_1")]).unwrap_err();
        assert_eq!(err.kind(), "storage_error");
    }

    #[test]
    fn unknown_status_is_a_storage_error() {
        let mut row = InventoryItem::new("Scale", "EO-AGE-002-0824", "Office 1", &Actor::system(), test_time()).to_row();
        row[4] = Cell::text("Lost");
        assert!(InventoryItem::from_row(&row).is_err());
    }

    #[test]
    fn parse_date_accepts_both_shapes() {
        assert!(parse_date("2024-08-01T10:00:00Z").is_some());
        assert!(parse_date("2024-08-01").is_some());
        assert!(parse_date("01/08/2024").is_none());
    }
}
