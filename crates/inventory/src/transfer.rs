use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use medinv_core::{Actor, DomainError, DomainResult, Entity, ItemId, TransferId};

/// A recorded move of an item from one location to another.
///
/// The origin is never supplied by callers: it is captured from the item at
/// the moment the transfer is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    id: TransferId,
    pub item_id: ItemId,
    origin_location: String,
    pub destination_location: String,
    pub transfer_date: DateTime<Utc>,
    pub performed_by: String,
    pub notes: String,
}

impl Transfer {
    pub fn new(
        item_id: ItemId,
        destination_location: impl Into<String>,
        notes: impl Into<String>,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TransferId::generate(),
            item_id,
            origin_location: String::new(),
            destination_location: destination_location.into(),
            transfer_date: now,
            performed_by: actor.email().to_string(),
            notes: notes.into(),
        }
    }

    pub(crate) fn from_parts(
        id: TransferId,
        item_id: ItemId,
        origin_location: String,
        destination_location: String,
        transfer_date: DateTime<Utc>,
        performed_by: String,
        notes: String,
    ) -> Self {
        Self {
            id,
            item_id,
            origin_location,
            destination_location,
            transfer_date,
            performed_by,
            notes,
        }
    }

    pub fn id_typed(&self) -> &TransferId {
        &self.id
    }

    pub fn origin_location(&self) -> &str {
        &self.origin_location
    }

    /// Record where the item was when the transfer happened.
    pub fn capture_origin(&mut self, location: impl Into<String>) {
        self.origin_location = location.into();
    }

    /// Checks that do not depend on the referenced item.
    pub fn validate_request(&self) -> DomainResult<()> {
        let mut errors = Vec::new();
        if self.item_id.as_str().trim().is_empty() {
            errors.push("the item to transfer is required".to_string());
        }
        if self.destination_location.trim().is_empty() {
            errors.push("destination location is required".to_string());
        }
        DomainError::check(errors)
    }

    /// Full validation; run after the origin has been captured.
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = match self.validate_request() {
            Ok(()) => Vec::new(),
            Err(DomainError::Validation(msgs)) => msgs,
            Err(other) => return Err(other),
        };
        if self.origin_location == self.destination_location {
            errors.push("origin and destination locations cannot be the same".to_string());
        }
        DomainError::check(errors)
    }
}

impl Entity for Transfer {
    type Id = TransferId;

    const KIND: &'static str = "transfer";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_transfer(destination: &str) -> Transfer {
        Transfer::new(
            ItemId::from("OBJ_1"),
            destination,
            "",
            &Actor::new("tech@clinic.org"),
            Utc::now(),
        )
    }

    #[test]
    fn new_transfer_has_no_origin() {
        let t = test_transfer("Laboratory");
        assert!(t.id_typed().as_str().starts_with("TRA_"));
        assert_eq!(t.origin_location(), "");
        assert_eq!(t.performed_by, "tech@clinic.org");
    }

    #[test]
    fn same_origin_and_destination_is_rejected() {
        let mut t = test_transfer("Laboratory");
        t.capture_origin("Laboratory");
        let err = t.validate().unwrap_err();
        assert_eq!(err.to_string(), "origin and destination locations cannot be the same");

        t.capture_origin("Storage");
        assert!(t.validate().is_ok());
    }

    #[test]
    fn request_validation_requires_item_and_destination() {
        let mut t = test_transfer("  ");
        t.item_id = ItemId::from("");
        match t.validate_request().unwrap_err() {
            DomainError::Validation(msgs) => assert_eq!(msgs.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
