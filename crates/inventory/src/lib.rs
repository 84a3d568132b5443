//! Inventory domain module.
//!
//! This crate contains the inventory and transfer records, their row layouts,
//! form mapping and read-side queries, implemented purely as deterministic
//! domain logic (no IO, no HTTP, no storage).

pub mod form;
pub mod item;
pub mod nomenclature;
pub mod query;
pub mod row;
pub mod transfer;

pub use form::{FlexBool, ItemForm, TransferForm};
pub use item::{CalibrationStatus, InventoryItem, ItemStatus};
pub use query::{Page, SearchCriteria, SortDirection, SortField, Summary};
pub use row::{Cell, Row, RowCodec};
pub use transfer::Transfer;
