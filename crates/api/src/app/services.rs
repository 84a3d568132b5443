use std::sync::Arc;

use medinv_core::DomainResult;
use medinv_infra::AppConfig;
use medinv_infra::InventoryService;
use medinv_infra::maintenance::{
    CalibrationSweep, CalibrationSweepRunner, CalibrationSweepRunnerHandle, Notifier, TracingNotifier,
};

/// Everything the handlers need, shared behind one `Arc`.
pub struct AppServices {
    pub inventory: Arc<InventoryService>,
    notifier: Arc<dyn Notifier>,
}

impl AppServices {
    pub fn new(inventory: InventoryService) -> Self {
        Self {
            inventory: Arc::new(inventory),
            notifier: Arc::new(TracingNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &AppConfig {
        self.inventory.config()
    }

    pub fn calibration_sweep(&self) -> CalibrationSweep {
        CalibrationSweep::new(self.inventory.clone(), self.notifier.clone())
    }

    /// Start the periodic calibration sweep on its own thread.
    pub fn spawn_calibration_runner(&self) -> std::io::Result<CalibrationSweepRunnerHandle> {
        CalibrationSweepRunner::new(self.config().sweep_interval)
            .spawn("calibration-sweep", Arc::new(self.calibration_sweep()))
    }
}

/// Wire storage according to `config` (file-backed when a data directory is set).
pub fn build_services(config: AppConfig) -> DomainResult<AppServices> {
    Ok(AppServices::new(InventoryService::from_config(config)?))
}
