//! Scheduled maintenance: calibration alerts and data integrity checks.

pub mod runner;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use medinv_core::validation::{days_between, is_due_within};
use medinv_core::{DomainError, DomainResult, Entity, ItemId};
use medinv_inventory::{CalibrationStatus, InventoryItem, Transfer};

use crate::service::InventoryService;

pub use runner::{CalibrationSweepRunner, CalibrationSweepRunnerHandle};

/// One item in a calibration report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalibrationAlert {
    pub item_id: ItemId,
    pub name: String,
    pub inventory_code: String,
    pub location: String,
    pub next_calibration_date: Option<DateTime<Utc>>,
    /// Days until the next calibration; only set for items not yet overdue.
    pub days_remaining: Option<i64>,
}

impl CalibrationAlert {
    fn from_item(item: &InventoryItem, days_remaining: Option<i64>) -> Self {
        Self {
            item_id: item.id().clone(),
            name: item.name.clone(),
            inventory_code: item.inventory_code.clone(),
            location: item.current_location.clone(),
            next_calibration_date: item.next_calibration_date,
            days_remaining,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalibrationReport {
    pub generated_at: DateTime<Utc>,
    pub overdue: Vec<CalibrationAlert>,
    pub due_soon: Vec<CalibrationAlert>,
}

impl CalibrationReport {
    pub fn is_empty(&self) -> bool {
        self.overdue.is_empty() && self.due_soon.is_empty()
    }
}

/// Items that require calibration and are overdue, or due within `days`.
pub fn calibration_sweep(items: &[InventoryItem], now: DateTime<Utc>, days: i64) -> CalibrationReport {
    let mut overdue = Vec::new();
    let mut due_soon = Vec::new();

    for item in items.iter().filter(|i| i.requires_calibration) {
        if item.calibration_status_at(now) == CalibrationStatus::Overdue {
            overdue.push(CalibrationAlert::from_item(item, None));
            continue;
        }
        if let Some(next) = item.next_calibration_date {
            if is_due_within(next, now, days) {
                due_soon.push(CalibrationAlert::from_item(item, Some(days_between(now, next))));
            }
        }
    }

    CalibrationReport {
        generated_at: now,
        overdue,
        due_soon,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Delivery channel for calibration reports.
pub trait Notifier: Send + Sync {
    fn notify_calibration(&self, recipient: &str, organization: &str, report: &CalibrationReport)
    -> Result<(), NotifyError>;
}

/// Writes reports to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_calibration(
        &self,
        recipient: &str,
        organization: &str,
        report: &CalibrationReport,
    ) -> Result<(), NotifyError> {
        warn!(
            recipient,
            organization,
            overdue = report.overdue.len(),
            due_soon = report.due_soon.len(),
            "calibration alert"
        );
        for alert in report.overdue.iter().chain(report.due_soon.iter()) {
            info!(
                item_id = %alert.item_id,
                code = %alert.inventory_code,
                location = %alert.location,
                days_remaining = ?alert.days_remaining,
                "calibration needed"
            );
        }
        Ok(())
    }
}

/// Captures reports for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryNotifier {
    inner: Mutex<Vec<(String, CalibrationReport)>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, CalibrationReport)> {
        self.inner.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Notifier for InMemoryNotifier {
    fn notify_calibration(
        &self,
        recipient: &str,
        _organization: &str,
        report: &CalibrationReport,
    ) -> Result<(), NotifyError> {
        let mut sent = self
            .inner
            .lock()
            .map_err(|_| NotifyError::Delivery("notifier lock poisoned".into()))?;
        sent.push((recipient.to_string(), report.clone()));
        Ok(())
    }
}

/// The calibration check wired to a service and a notifier.
pub struct CalibrationSweep {
    service: Arc<InventoryService>,
    notifier: Arc<dyn Notifier>,
}

impl CalibrationSweep {
    pub fn new(service: Arc<InventoryService>, notifier: Arc<dyn Notifier>) -> Self {
        Self { service, notifier }
    }

    /// Run one sweep. Returns the report when one was sent.
    pub fn run_once(&self) -> DomainResult<Option<CalibrationReport>> {
        let config = self.service.config();
        if !config.alerts_enabled {
            debug!("calibration alerts disabled; sweep skipped");
            return Ok(None);
        }

        let items = self.service.list_items()?;
        let report = calibration_sweep(&items, self.service.now(), config.calibration_alert_days);
        if report.is_empty() {
            info!("calibration sweep found nothing to report");
            return Ok(None);
        }

        self.notifier
            .notify_calibration(&config.admin_email, &config.organization_name, &report)
            .map_err(|e| DomainError::storage(e.to_string()))?;
        info!(
            overdue = report.overdue.len(),
            due_soon = report.due_soon.len(),
            "calibration report sent"
        );
        Ok(Some(report))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub problems: Vec<String>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Cross-table consistency check. Never modifies data.
pub fn integrity_check(items: &[InventoryItem], transfers: &[Transfer], max_photos: usize) -> IntegrityReport {
    let mut problems = Vec::new();

    let mut codes: HashMap<&str, usize> = HashMap::new();
    for item in items {
        *codes.entry(item.inventory_code.as_str()).or_insert(0) += 1;
        if item.photo_ids.len() > max_photos {
            problems.push(format!(
                "item {} has {} photos (max {max_photos})",
                item.id(),
                item.photo_ids.len()
            ));
        }
    }
    let mut duplicates: Vec<_> = codes.into_iter().filter(|(_, n)| *n > 1).collect();
    duplicates.sort();
    for (code, n) in duplicates {
        problems.push(format!("inventory code {code} is used by {n} items"));
    }

    let known: HashSet<&ItemId> = items.iter().map(|i| i.id()).collect();
    for transfer in transfers {
        if !known.contains(&transfer.item_id) {
            problems.push(format!(
                "transfer {} references missing item {}",
                transfer.id(),
                transfer.item_id
            ));
        }
    }

    IntegrityReport { problems }
}

impl InventoryService {
    pub fn integrity_check(&self) -> DomainResult<IntegrityReport> {
        let items = self.list_items()?;
        let transfers = self.list_transfers()?;
        let report = integrity_check(&items, &transfers, self.config().max_photos_per_item);
        if report.is_clean() {
            info!(items = items.len(), transfers = transfers.len(), "integrity check passed");
        } else {
            warn!(problems = report.problems.len(), "integrity check found problems");
        }
        Ok(report)
    }
}
