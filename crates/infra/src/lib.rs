//! Infrastructure layer: row stores, repositories, photo storage, config,
//! the application service and scheduled maintenance.

pub mod config;
pub mod maintenance;
pub mod photos;
pub mod repository;
pub mod service;
pub mod sheet;


pub use config::AppConfig;
pub use repository::{Repository, SheetRepository};
pub use service::{InventoryService, ListOptions, PhotoUpload};
pub use sheet::{InMemorySheet, JsonFileSheet, RowStore, SheetError};
