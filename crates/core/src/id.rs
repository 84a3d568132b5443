//! Strongly-typed identifiers used across the domain.
//!
//! Identifiers are opaque strings (`<PREFIX>_<uuid>`) because they are stored
//! verbatim in the first column of each row table and must stay readable by
//! anything that already holds rows written with that shape.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of an inventory item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

/// Identifier of a transfer record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(String);

macro_rules! impl_prefixed_id {
    ($t:ty, $prefix:literal, $name:literal) => {
        impl $t {
            /// Generate a fresh identifier.
            pub fn generate() -> Self {
                Self(format!("{}_{}", $prefix, Uuid::new_v4()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $t {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                if s.is_empty() {
                    return Err(DomainError::validation(format!("{} cannot be empty", $name)));
                }
                Ok(Self(s.to_string()))
            }
        }
    };
}

impl_prefixed_id!(ItemId, "OBJ", "item id");
impl_prefixed_id!(TransferId, "TRA", "transfer id");

/// The identity performing a write (an e-mail address).
///
/// Passed explicitly into every write path; nothing in the core looks the
/// current user up on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(String);

impl Actor {
    pub fn new(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    /// Identity used by scheduled jobs.
    pub fn system() -> Self {
        Self("SYSTEM".to_string())
    }

    pub fn email(&self) -> &str {
        &self.0
    }

    /// Local part of the address (before `@`), used as a display name.
    pub fn display_name(&self) -> &str {
        self.0.split('@').next().unwrap_or(&self.0)
    }
}

impl core::fmt::Display for Actor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_carry_their_prefix() {
        assert!(ItemId::generate().as_str().starts_with("OBJ_"));
        assert!(TransferId::generate().as_str().starts_with("TRA_"));
        assert_ne!(ItemId::generate(), ItemId::generate());
    }

    #[test]
    fn parsing_rejects_blank_ids() {
        assert!("   ".parse::<ItemId>().is_err());
        assert_eq!(" OBJ_1 ".parse::<ItemId>().unwrap().as_str(), "OBJ_1");
    }

    #[test]
    fn actor_display_name_is_local_part() {
        assert_eq!(Actor::new("nurse@clinic.org").display_name(), "nurse");
        assert_eq!(Actor::system().display_name(), "SYSTEM");
    }
}
