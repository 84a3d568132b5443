//! Mapping of submitted form data onto domain entities.
//!
//! Forms arrive as loosely-typed JSON (checkbox values as `"true"`, dates as
//! `YYYY-MM-DD`). Everything is sanitized and parsed here so the entities only
//! ever see clean values.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use medinv_core::validation::{self, DEFAULT_TEXT_MAX_LEN};
use medinv_core::{Actor, DomainError, DomainResult, ItemId};

use crate::item::{InventoryItem, ItemStatus};
use crate::row::parse_date;
use crate::transfer::Transfer;

/// Boolean that also accepts the strings `"true"` / `"false"`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FlexBool {
    Bool(bool),
    Text(String),
}

impl FlexBool {
    pub fn value(&self) -> bool {
        match self {
            FlexBool::Bool(b) => *b,
            FlexBool::Text(s) => s.trim().eq_ignore_ascii_case("true"),
        }
    }
}

/// Item fields as submitted by the add/edit forms.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ItemForm {
    pub name: String,
    pub inventory_code: String,
    pub serial_number: Option<String>,
    pub status: Option<String>,
    pub current_location: String,
    pub requires_calibration: Option<FlexBool>,
    pub last_calibration_date: Option<String>,
    pub next_calibration_date: Option<String>,
    pub notes: Option<String>,
}

/// Parsed, sanitized form values.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ItemFields {
    name: String,
    inventory_code: String,
    serial_number: String,
    status: ItemStatus,
    current_location: String,
    requires_calibration: bool,
    last_calibration_date: Option<DateTime<Utc>>,
    next_calibration_date: Option<DateTime<Utc>>,
    notes: String,
}

fn parse_optional_date(raw: Option<&str>, field: &str, errors: &mut Vec<String>) -> Option<DateTime<Utc>> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match parse_date(raw) {
        Some(d) => Some(d),
        None => {
            errors.push(format!("{field} is not a valid date"));
            None
        }
    }
}

impl ItemForm {
    fn parse(&self) -> DomainResult<ItemFields> {
        let mut errors = Vec::new();

        // A blank code is reported by entity validation; only check the shape here.
        let inventory_code = if self.inventory_code.trim().is_empty() {
            String::new()
        } else {
            match validation::validate_inventory_code(&self.inventory_code) {
                Ok(code) => code,
                Err(e) => {
                    errors.push(e.to_string());
                    String::new()
                }
            }
        };

        let serial_number = match validation::validate_serial(self.serial_number.as_deref()) {
            Ok(serial) => serial.unwrap_or_default(),
            Err(e) => {
                errors.push(e.to_string());
                String::new()
            }
        };

        let status = match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => ItemStatus::default(),
            Some(label) => ItemStatus::from_label(label).unwrap_or_else(|| {
                errors.push(format!("unknown status: {label}"));
                ItemStatus::default()
            }),
        };

        let last_calibration_date =
            parse_optional_date(self.last_calibration_date.as_deref(), "last calibration date", &mut errors);
        let next_calibration_date =
            parse_optional_date(self.next_calibration_date.as_deref(), "next calibration date", &mut errors);

        DomainError::check(errors)?;

        Ok(ItemFields {
            name: validation::clean_text(&self.name, DEFAULT_TEXT_MAX_LEN),
            inventory_code,
            serial_number,
            status,
            current_location: validation::clean_text(&self.current_location, DEFAULT_TEXT_MAX_LEN),
            requires_calibration: self.requires_calibration.as_ref().is_some_and(FlexBool::value),
            last_calibration_date,
            next_calibration_date,
            notes: validation::clean_text(self.notes.as_deref().unwrap_or_default(), DEFAULT_TEXT_MAX_LEN),
        })
    }

    /// Build a new (not yet validated) item from the form.
    pub fn into_new_item(&self, actor: &Actor, now: DateTime<Utc>) -> DomainResult<InventoryItem> {
        let fields = self.parse()?;
        let mut item = InventoryItem::new(
            fields.name.clone(),
            fields.inventory_code.clone(),
            fields.current_location.clone(),
            actor,
            now,
        );
        fields.write_into(&mut item);
        Ok(item)
    }

    /// Overwrite the editable fields of an existing item.
    ///
    /// Photos and creation metadata are left untouched.
    pub fn apply_to(&self, item: &mut InventoryItem) -> DomainResult<()> {
        let fields = self.parse()?;
        fields.write_into(item);
        Ok(())
    }
}

impl ItemFields {
    fn write_into(self, item: &mut InventoryItem) {
        item.name = self.name;
        item.inventory_code = self.inventory_code;
        item.serial_number = self.serial_number;
        item.status = self.status;
        item.current_location = self.current_location;
        item.requires_calibration = self.requires_calibration;
        item.last_calibration_date = self.last_calibration_date;
        item.next_calibration_date = self.next_calibration_date;
        item.notes = self.notes;
    }
}

/// Fields submitted by the transfer form.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransferForm {
    pub item_id: String,
    pub destination_location: String,
    pub notes: Option<String>,
}

impl TransferForm {
    pub fn into_transfer(&self, actor: &Actor, now: DateTime<Utc>) -> Transfer {
        Transfer::new(
            ItemId::from(self.item_id.trim()),
            validation::clean_text(&self.destination_location, DEFAULT_TEXT_MAX_LEN),
            validation::clean_text(self.notes.as_deref().unwrap_or_default(), DEFAULT_TEXT_MAX_LEN),
            actor,
            now,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use medinv_core::Entity;

    fn actor() -> Actor {
        Actor::new("tech@clinic.org")
    }

    fn form() -> ItemForm {
        ItemForm {
            name: " <i>Endoscope</i> ".into(),
            inventory_code: "em-age-001-0824".into(),
            serial_number: Some("SN-9981".into()),
            status: Some("In use".into()),
            current_location: "Office 1".into(),
            requires_calibration: Some(FlexBool::Text("true".into())),
            last_calibration_date: Some("2024-07-01".into()),
            next_calibration_date: Some("2025-07-01".into()),
            notes: None,
        }
    }

    #[test]
    fn form_maps_to_sanitized_item() {
        let item = form().into_new_item(&actor(), Utc::now()).unwrap();
        assert_eq!(item.name, "Endoscope");
        assert_eq!(item.inventory_code, "EM-AGE-001-0824");
        assert_eq!(item.serial_number, "SN-9981");
        assert_eq!(item.status, ItemStatus::InUse);
        assert!(item.requires_calibration);
        assert_eq!(
            item.next_calibration_date,
            Some(Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(item.created_by(), "tech@clinic.org");
    }

    #[test]
    fn form_errors_are_aggregated() {
        let mut f = form();
        f.inventory_code = "EM-AGE-1-24".into();
        f.serial_number = Some("x".into());
        f.status = Some("Lost".into());
        f.next_calibration_date = Some("tomorrow".into());

        match f.into_new_item(&actor(), Utc::now()).unwrap_err() {
            DomainError::Validation(msgs) => assert_eq!(msgs.len(), 4),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn missing_optional_fields_use_defaults() {
        let f: ItemForm = serde_json::from_value(serde_json::json!({
            "name": "Chair",
            "inventory_code": "EO-AGE-010-0124",
            "current_location": "Reception",
        }))
        .unwrap();
        let item = f.into_new_item(&actor(), Utc::now()).unwrap();
        assert_eq!(item.status, ItemStatus::Available);
        assert!(!item.requires_calibration);
        assert_eq!(item.serial_number, "");
    }

    #[test]
    fn checkbox_accepts_bool_or_string() {
        let f: ItemForm = serde_json::from_value(serde_json::json!({ "requires_calibration": true })).unwrap();
        assert_eq!(f.requires_calibration.map(|b| b.value()), Some(true));
        let f: ItemForm = serde_json::from_value(serde_json::json!({ "requires_calibration": "false" })).unwrap();
        assert_eq!(f.requires_calibration.map(|b| b.value()), Some(false));
    }

    #[test]
    fn apply_keeps_identity_and_photos() {
        let mut item = form().into_new_item(&actor(), Utc::now()).unwrap();
        item.photo_ids.push("photo-1".into());
        let id = item.id().clone();

        let mut edit = form();
        edit.name = "Gastroscope".into();
        edit.apply_to(&mut item).unwrap();

        assert_eq!(item.id(), &id);
        assert_eq!(item.name, "Gastroscope");
        assert_eq!(item.photo_ids, vec!["photo-1".to_string()]);
    }

    #[test]
    fn punctuation_survives_repeated_edits() {
        let mut f = form();
        f.name = "Doctor's scale".into();
        f.current_location = "Storage & Lab".into();
        let mut item = f.into_new_item(&actor(), Utc::now()).unwrap();

        for _ in 0..2 {
            let mut edit = form();
            edit.name = item.name.clone();
            edit.current_location = item.current_location.clone();
            edit.apply_to(&mut item).unwrap();
        }

        assert_eq!(item.name, "Doctor's scale");
        assert_eq!(item.current_location, "Storage & Lab");
    }

    #[test]
    fn transfer_form_builds_transfer_without_origin() {
        let t = TransferForm {
            item_id: " OBJ_1 ".into(),
            destination_location: "Laboratory".into(),
            notes: Some("for cleaning".into()),
        }
        .into_transfer(&actor(), Utc::now());
        assert_eq!(t.item_id.as_str(), "OBJ_1");
        assert_eq!(t.origin_location(), "");
        assert_eq!(t.notes, "for cleaning");
    }
}
