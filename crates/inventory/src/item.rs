use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use medinv_core::{Actor, DomainError, DomainResult, Entity, ItemId};

/// Lifecycle status of an inventory item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ItemStatus {
    #[default]
    #[serde(rename = "Available")]
    Available,
    #[serde(rename = "In use")]
    InUse,
    #[serde(rename = "In repair")]
    InRepair,
    #[serde(rename = "Decommissioned")]
    Decommissioned,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 4] = [
        ItemStatus::Available,
        ItemStatus::InUse,
        ItemStatus::InRepair,
        ItemStatus::Decommissioned,
    ];

    /// Label stored in the status column.
    pub fn label(self) -> &'static str {
        match self {
            ItemStatus::Available => "Available",
            ItemStatus::InUse => "In use",
            ItemStatus::InRepair => "In repair",
            ItemStatus::Decommissioned => "Decommissioned",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label.trim())
    }
}

impl core::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Calibration state derived from the calibration schedule.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CalibrationStatus {
    #[default]
    #[serde(rename = "Not applicable")]
    NotApplicable,
    #[serde(rename = "Calibrated")]
    Calibrated,
    #[serde(rename = "Overdue")]
    Overdue,
    #[serde(rename = "Pending")]
    Pending,
}

impl CalibrationStatus {
    pub const ALL: [CalibrationStatus; 4] = [
        CalibrationStatus::NotApplicable,
        CalibrationStatus::Calibrated,
        CalibrationStatus::Overdue,
        CalibrationStatus::Pending,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CalibrationStatus::NotApplicable => "Not applicable",
            CalibrationStatus::Calibrated => "Calibrated",
            CalibrationStatus::Overdue => "Overdue",
            CalibrationStatus::Pending => "Pending",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label.trim())
    }

    /// Pure derivation from the schedule at `now`.
    pub fn derive(
        requires_calibration: bool,
        next_calibration_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        if !requires_calibration {
            return CalibrationStatus::NotApplicable;
        }
        match next_calibration_date {
            None => CalibrationStatus::Pending,
            Some(next) if next < now => CalibrationStatus::Overdue,
            Some(_) => CalibrationStatus::Calibrated,
        }
    }
}

impl core::fmt::Display for CalibrationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// An inventory item as stored in the inventory table.
///
/// `calibration_status`, `updated_at` and the creation stamp are owned by the
/// model: callers edit the schedule fields and [`InventoryItem::prepare_for_save`]
/// derives the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    id: ItemId,
    pub name: String,
    pub inventory_code: String,
    pub serial_number: String,
    pub status: ItemStatus,
    pub current_location: String,
    pub requires_calibration: bool,
    calibration_status: CalibrationStatus,
    pub last_calibration_date: Option<DateTime<Utc>>,
    pub next_calibration_date: Option<DateTime<Utc>>,
    pub notes: String,
    pub photo_ids: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    created_by: String,
}

impl InventoryItem {
    /// New item with a generated id and defaults for every optional field.
    pub fn new(
        name: impl Into<String>,
        inventory_code: impl Into<String>,
        current_location: impl Into<String>,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ItemId::generate(),
            name: name.into(),
            inventory_code: inventory_code.into(),
            serial_number: String::new(),
            status: ItemStatus::default(),
            current_location: current_location.into(),
            requires_calibration: false,
            calibration_status: CalibrationStatus::default(),
            last_calibration_date: None,
            next_calibration_date: None,
            notes: String::new(),
            photo_ids: Vec::new(),
            created_at: now,
            updated_at: now,
            created_by: actor.email().to_string(),
        }
    }

    /// Rebuild an item from stored fields (row decoding).
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id: ItemId,
        name: String,
        inventory_code: String,
        serial_number: String,
        status: ItemStatus,
        current_location: String,
        requires_calibration: bool,
        calibration_status: CalibrationStatus,
        last_calibration_date: Option<DateTime<Utc>>,
        next_calibration_date: Option<DateTime<Utc>>,
        notes: String,
        photo_ids: Vec<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        created_by: String,
    ) -> Self {
        Self {
            id,
            name,
            inventory_code,
            serial_number,
            status,
            current_location,
            requires_calibration,
            calibration_status,
            last_calibration_date,
            next_calibration_date,
            notes,
            photo_ids,
            created_at,
            updated_at,
            created_by,
        }
    }

    pub fn id_typed(&self) -> &ItemId {
        &self.id
    }

    /// Calibration status as of the last save.
    pub fn calibration_status(&self) -> CalibrationStatus {
        self.calibration_status
    }

    /// Calibration status as it would be derived at `now`.
    ///
    /// Stored rows only refresh their status on save, so reports that must be
    /// current use this instead of [`Self::calibration_status`].
    pub fn calibration_status_at(&self, now: DateTime<Utc>) -> CalibrationStatus {
        CalibrationStatus::derive(self.requires_calibration, self.next_calibration_date, now)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    /// Collect every validation failure for this item.
    pub fn validate(&self, max_photos: usize) -> DomainResult<()> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("item name is required".to_string());
        }
        if self.inventory_code.trim().is_empty() {
            errors.push("inventory code is required".to_string());
        }
        if self.current_location.trim().is_empty() {
            errors.push("current location is required".to_string());
        }
        if self.requires_calibration && self.last_calibration_date.is_none() {
            errors.push("last calibration date is required when calibration is required".to_string());
        }
        if self.photo_ids.len() > max_photos {
            errors.push(format!("at most {max_photos} photos per item"));
        }

        DomainError::check(errors)
    }

    /// Derive calibration status and stamp `updated_at`. Called on every save.
    pub fn prepare_for_save(&mut self, now: DateTime<Utc>) {
        self.calibration_status = self.calibration_status_at(now);
        self.updated_at = now;
    }
}

impl Entity for InventoryItem {
    type Id = ItemId;

    const KIND: &'static str = "item";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 1, 12, 0, 0).unwrap()
    }

    fn test_item() -> InventoryItem {
        InventoryItem::new(
            "Endoscope",
            "EM-AGE-001-0824",
            "Storage",
            &Actor::new("tech@clinic.org"),
            test_time(),
        )
    }

    #[test]
    fn new_item_has_defaults() {
        let item = test_item();
        assert!(item.id_typed().as_str().starts_with("OBJ_"));
        assert_eq!(item.status, ItemStatus::Available);
        assert_eq!(item.calibration_status(), CalibrationStatus::NotApplicable);
        assert!(item.photo_ids.is_empty());
        assert_eq!(item.created_by(), "tech@clinic.org");
        assert_eq!(item.created_at(), item.updated_at());
    }

    #[test]
    fn validate_collects_all_messages() {
        let mut item = test_item();
        item.name = "  ".into();
        item.current_location = String::new();
        item.requires_calibration = true;

        let err = item.validate(3).unwrap_err();
        match err {
            DomainError::Validation(msgs) => {
                assert_eq!(msgs.len(), 3);
                assert_eq!(msgs[0], "item name is required");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn validate_enforces_photo_limit() {
        let mut item = test_item();
        item.photo_ids = vec!["a".into(), "b".into(), "c".into(), "d".into()];
        assert!(item.validate(3).is_err());
        assert!(item.validate(4).is_ok());
    }

    #[test]
    fn calibration_status_follows_schedule() {
        let now = test_time();
        let mut item = test_item();

        item.prepare_for_save(now);
        assert_eq!(item.calibration_status(), CalibrationStatus::NotApplicable);

        item.requires_calibration = true;
        item.prepare_for_save(now);
        assert_eq!(item.calibration_status(), CalibrationStatus::Pending);

        item.next_calibration_date = Some(now - Duration::days(1));
        item.prepare_for_save(now);
        assert_eq!(item.calibration_status(), CalibrationStatus::Overdue);

        item.next_calibration_date = Some(now + Duration::days(1));
        item.prepare_for_save(now);
        assert_eq!(item.calibration_status(), CalibrationStatus::Calibrated);

        item.requires_calibration = false;
        item.prepare_for_save(now);
        assert_eq!(item.calibration_status(), CalibrationStatus::NotApplicable);
    }

    #[test]
    fn prepare_for_save_stamps_updated_at() {
        let mut item = test_item();
        let later = test_time() + Duration::hours(2);
        item.prepare_for_save(later);
        assert_eq!(item.updated_at(), later);
        assert_eq!(item.created_at(), test_time());
    }

    #[test]
    fn status_labels_round_trip() {
        for s in ItemStatus::ALL {
            assert_eq!(ItemStatus::from_label(s.label()), Some(s));
        }
        for s in CalibrationStatus::ALL {
            assert_eq!(CalibrationStatus::from_label(s.label()), Some(s));
        }
        assert_eq!(ItemStatus::from_label("Lost"), None);
    }
}
