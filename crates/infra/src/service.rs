//! Inventory application service.
//!
//! Every write path runs under one mutex so that the read-check-write
//! sequences (duplicate codes, locate-by-id, two-table transfers) never
//! interleave. Reads go straight to the repositories.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use medinv_core::{Actor, DomainError, DomainResult, Entity, ItemId, TransferId};
use medinv_inventory::query::{self, ItemOption, RecentItem, TransferView};
use medinv_inventory::{
    InventoryItem, ItemForm, Page, RowCodec, SearchCriteria, SortDirection, SortField, Summary, Transfer,
    TransferForm,
};

use crate::config::AppConfig;
use crate::photos::{self, DirPhotoStore, InMemoryPhotoStore, PhotoStore, StoredPhoto};
use crate::repository::{Repository, SheetRepository};
use crate::sheet::{InMemorySheet, JsonFileSheet};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Base64 photo payload as submitted by clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    /// Plain base64, or a `data:<mime>;base64,` URL.
    pub data: String,
    pub mime_type: String,
}

/// Sorting and paging for item listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListOptions {
    pub sort: Option<(SortField, SortDirection)>,
    pub page: usize,
    pub per_page: Option<usize>,
}

pub struct InventoryService {
    items: Arc<dyn Repository<InventoryItem>>,
    transfers: Arc<dyn Repository<Transfer>>,
    photos: Arc<dyn PhotoStore>,
    config: AppConfig,
    clock: Clock,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for InventoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl InventoryService {
    pub fn new(
        items: Arc<dyn Repository<InventoryItem>>,
        transfers: Arc<dyn Repository<Transfer>>,
        photos: Arc<dyn PhotoStore>,
        config: AppConfig,
    ) -> Self {
        Self {
            items,
            transfers,
            photos,
            config,
            clock: Arc::new(Utc::now),
            write_lock: Mutex::new(()),
        }
    }

    /// Service over in-memory sheets and photo store.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(
            Arc::new(SheetRepository::<InventoryItem, _>::new(InMemorySheet::new(
                "inventory",
                InventoryItem::COLUMNS,
            ))),
            Arc::new(SheetRepository::<Transfer, _>::new(InMemorySheet::new(
                "transfers",
                Transfer::COLUMNS,
            ))),
            Arc::new(InMemoryPhotoStore::new()),
            config,
        )
    }

    /// Service over JSON sheets and a photo directory under `config.data_dir`.
    ///
    /// Falls back to [`Self::in_memory`] when no data directory is configured.
    pub fn from_config(config: AppConfig) -> DomainResult<Self> {
        let Some(dir) = config.data_dir.clone() else {
            return Ok(Self::in_memory(config));
        };

        let inventory = JsonFileSheet::open("inventory", dir.join("inventory.json"), InventoryItem::COLUMNS)?;
        let transfers = JsonFileSheet::open("transfers", dir.join("transfers.json"), Transfer::COLUMNS)?;
        let photos = DirPhotoStore::open(dir.join("photos"))?;
        info!(data_dir = %dir.display(), "file-backed storage opened");

        Ok(Self::new(
            Arc::new(SheetRepository::<InventoryItem, _>::new(inventory)),
            Arc::new(SheetRepository::<Transfer, _>::new(transfers)),
            Arc::new(photos),
            config,
        ))
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The guarded value is `()`, so a poisoned lock carries no broken state.
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ---------------------------------------------------------------------
    // Write paths
    // ---------------------------------------------------------------------

    /// Validate and store a new item; returns its id.
    pub fn create_item(&self, mut item: InventoryItem, actor: &Actor) -> DomainResult<ItemId> {
        let _guard = self.lock();
        self.save_new(&mut item)?;
        info!(item_id = %item.id(), code = %item.inventory_code, actor = %actor, "item created");
        Ok(item.id().clone())
    }

    /// Overwrite an existing item.
    pub fn update_item(&self, mut item: InventoryItem, actor: &Actor) -> DomainResult<()> {
        let _guard = self.lock();
        self.save_existing(&mut item)?;
        info!(item_id = %item.id(), actor = %actor, "item updated");
        Ok(())
    }

    pub fn add_item(&self, form: &ItemForm, actor: &Actor) -> DomainResult<ItemId> {
        let item = form.into_new_item(actor, self.now())?;
        self.create_item(item, actor)
    }

    pub fn edit_item(&self, id: &ItemId, form: &ItemForm, actor: &Actor) -> DomainResult<()> {
        let _guard = self.lock();
        let mut item = self.require_item(id)?;
        form.apply_to(&mut item)?;
        self.save_existing(&mut item)?;
        info!(item_id = %id, actor = %actor, "item updated");
        Ok(())
    }

    /// Delete an item row. Stored photos are removed afterwards on a best
    /// effort basis; transfers referencing the item are kept as history.
    pub fn delete_item(&self, id: &ItemId, actor: &Actor) -> DomainResult<()> {
        let _guard = self.lock();
        let item = self.require_item(id)?;
        self.items.delete(id)?;
        info!(item_id = %id, code = %item.inventory_code, actor = %actor, "item deleted");

        for photo_id in &item.photo_ids {
            if let Err(e) = self.photos.remove(photo_id) {
                warn!(item_id = %id, photo_id = %photo_id, error = %e, "failed to remove photo of deleted item");
            }
        }
        Ok(())
    }

    /// Record a move of an item and relocate it.
    ///
    /// The origin is captured from the item. If relocating the item fails, the
    /// transfer row is removed again and the relocation error is returned.
    pub fn record_transfer(&self, mut transfer: Transfer, actor: &Actor) -> DomainResult<TransferId> {
        transfer.validate_request()?;

        let _guard = self.lock();
        let mut item = self.require_item(&transfer.item_id)?;
        transfer.capture_origin(item.current_location.clone());
        transfer.validate()?;

        self.transfers.insert(&transfer)?;

        item.current_location = transfer.destination_location.clone();
        if let Err(e) = self.save_existing(&mut item) {
            warn!(
                transfer_id = %transfer.id(),
                item_id = %transfer.item_id,
                error = %e,
                "item relocation failed; removing transfer row"
            );
            if let Err(rollback) = self.transfers.delete(transfer.id()) {
                error!(
                    transfer_id = %transfer.id(),
                    error = %e,
                    rollback_error = %rollback,
                    "transfer rollback failed; transfer row is orphaned"
                );
            }
            return Err(e);
        }

        info!(
            transfer_id = %transfer.id(),
            item_id = %transfer.item_id,
            from = %transfer.origin_location(),
            to = %transfer.destination_location,
            actor = %actor,
            "transfer recorded"
        );
        Ok(transfer.id().clone())
    }

    pub fn submit_transfer(&self, form: &TransferForm, actor: &Actor) -> DomainResult<TransferId> {
        let transfer = form.into_transfer(actor, self.now());
        self.record_transfer(transfer, actor)
    }

    /// Store a photo and attach it to the item; returns the photo id.
    pub fn upload_photo(&self, item_id: &ItemId, upload: &PhotoUpload, actor: &Actor) -> DomainResult<String> {
        let _guard = self.lock();
        let mut item = self.require_item(item_id)?;

        let max = self.config.max_photos_per_item;
        if item.photo_ids.len() >= max {
            return Err(DomainError::validation(format!("at most {max} photos per item")));
        }

        let mime = upload.mime_type.trim().to_ascii_lowercase();
        let Some(ext) = photos::extension_for(&mime) else {
            return Err(DomainError::validation(format!(
                "unsupported photo type {mime}; allowed: {}",
                photos::ALLOWED_MIME_TYPES.join(", ")
            )));
        };

        let bytes = decode_base64(&upload.data)?;
        if bytes.is_empty() {
            return Err(DomainError::validation("photo data is empty"));
        }
        if bytes.len() > self.config.max_file_size {
            return Err(DomainError::validation(format!(
                "photo exceeds the maximum size of {} bytes",
                self.config.max_file_size
            )));
        }

        let mut millis = self.now().timestamp_millis();
        let mut file_name = format!("{}_{millis}.{ext}", item.inventory_code);
        while item.photo_ids.contains(&file_name) {
            millis += 1;
            file_name = format!("{}_{millis}.{ext}", item.inventory_code);
        }
        let photo_id = self.photos.put(&file_name, &mime, &bytes)?;

        item.photo_ids.push(photo_id.clone());
        if let Err(e) = self.save_existing(&mut item) {
            if let Err(cleanup) = self.photos.remove(&photo_id) {
                warn!(photo_id = %photo_id, error = %cleanup, "failed to remove photo after item update failure");
            }
            return Err(e);
        }

        info!(item_id = %item_id, photo_id = %photo_id, size = bytes.len(), actor = %actor, "photo uploaded");
        Ok(photo_id)
    }

    /// Detach a photo from an item and delete the stored file.
    pub fn remove_photo(&self, item_id: &ItemId, photo_id: &str, actor: &Actor) -> DomainResult<()> {
        let _guard = self.lock();
        let mut item = self.require_item(item_id)?;

        let before = item.photo_ids.len();
        item.photo_ids.retain(|p| p != photo_id);
        if item.photo_ids.len() == before {
            return Err(DomainError::not_found(format!("photo {photo_id}")));
        }
        self.save_existing(&mut item)?;

        if let Err(e) = self.photos.remove(photo_id) {
            warn!(item_id = %item_id, photo_id = %photo_id, error = %e, "failed to delete stored photo");
        }
        info!(item_id = %item_id, photo_id = %photo_id, actor = %actor, "photo removed");
        Ok(())
    }

    fn check_duplicate_code(&self, item: &InventoryItem) -> DomainResult<()> {
        let own_id = item.id().to_string();
        let taken = self
            .items
            .column_values(InventoryItem::CODE_COLUMN)?
            .iter()
            .any(|(id, code)| code.trim() == item.inventory_code && *id != own_id);
        if taken {
            return Err(DomainError::duplicate_code(item.inventory_code.clone()));
        }
        Ok(())
    }

    fn save_new(&self, item: &mut InventoryItem) -> DomainResult<()> {
        item.validate(self.config.max_photos_per_item)?;
        self.check_duplicate_code(item)?;
        item.prepare_for_save(self.now());
        self.items.insert(item)
    }

    fn save_existing(&self, item: &mut InventoryItem) -> DomainResult<()> {
        item.validate(self.config.max_photos_per_item)?;
        self.check_duplicate_code(item)?;
        item.prepare_for_save(self.now());
        self.items.update(item)
    }

    fn require_item(&self, id: &ItemId) -> DomainResult<InventoryItem> {
        self.items
            .get_by_id(id)?
            .ok_or_else(|| DomainError::not_found(format!("item {id}")))
    }

    // ---------------------------------------------------------------------
    // Read paths
    // ---------------------------------------------------------------------

    pub fn get_item(&self, id: &ItemId) -> DomainResult<InventoryItem> {
        self.require_item(id)
    }

    pub fn find_item(&self, id: &ItemId) -> DomainResult<Option<InventoryItem>> {
        self.items.get_by_id(id)
    }

    pub fn list_items(&self) -> DomainResult<Vec<InventoryItem>> {
        self.items.get_all()
    }

    pub fn list_transfers(&self) -> DomainResult<Vec<Transfer>> {
        self.transfers.get_all()
    }

    pub fn search(&self, criteria: &SearchCriteria) -> DomainResult<Vec<InventoryItem>> {
        Ok(query::search(self.items.get_all()?, criteria))
    }

    /// Search, then sort and cut one page. `per_page` defaults to the
    /// configured page size and is capped at the maximum search results.
    pub fn search_page(&self, criteria: &SearchCriteria, options: ListOptions) -> DomainResult<Page<InventoryItem>> {
        let mut results = self.search(criteria)?;
        if let Some((field, direction)) = options.sort {
            query::sort_by(&mut results, field, direction);
        }
        let per_page = options
            .per_page
            .unwrap_or(self.config.page_size)
            .min(self.config.max_search_results);
        Ok(query::paginate(results, options.page, per_page))
    }

    pub fn summary(&self) -> DomainResult<Summary> {
        let items = self.items.get_all()?;
        let transfers = self.transfers.get_all()?;
        Ok(query::summarize(
            &items,
            transfers,
            self.now(),
            self.config.calibration_alert_days,
            self.config.recent_transfers,
        ))
    }

    pub fn recent_items(&self) -> DomainResult<Vec<RecentItem>> {
        Ok(query::recent_items(self.items.get_all()?, self.config.recent_items))
    }

    pub fn recent_transfers(&self, limit: usize) -> DomainResult<Vec<TransferView>> {
        let items = self.items.get_all()?;
        Ok(query::recent_transfers(&items, self.transfers.get_all()?, limit))
    }

    pub fn transfer_history(&self, item_id: &ItemId) -> DomainResult<Vec<Transfer>> {
        self.require_item(item_id)?;
        Ok(query::transfer_history(self.transfers.get_all()?, item_id))
    }

    pub fn locations(&self) -> DomainResult<Vec<String>> {
        let items = self.items.get_all()?;
        Ok(query::location_options(&items, &self.config.predefined_locations))
    }

    pub fn item_options(&self) -> DomainResult<Vec<ItemOption>> {
        Ok(query::item_options(&self.items.get_all()?))
    }

    pub fn photo(&self, photo_id: &str) -> DomainResult<StoredPhoto> {
        Ok(self.photos.get(photo_id)?)
    }
}

fn decode_base64(data: &str) -> DomainResult<Vec<u8>> {
    let payload = match data.split_once("base64,") {
        Some((_, rest)) => rest,
        None => data,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| DomainError::validation(format!("photo data is not valid base64: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_accepts_data_urls_and_wrapped_lines() {
        assert_eq!(decode_base64("aGVs\nbG8=").unwrap(), b"hello");
        assert_eq!(decode_base64("data:image/png;base64,aGVsbG8=").unwrap(), b"hello");
        assert!(matches!(decode_base64("***"), Err(DomainError::Validation(_))));
    }
}
