use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::CalibrationSweep;

/// Config for the periodic calibration sweep.
#[derive(Debug, Clone)]
pub struct CalibrationSweepRunner {
    pub interval: Duration,
    /// Run one sweep as soon as the thread starts.
    pub run_on_start: bool,
}

impl Default for CalibrationSweepRunner {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(24 * 60 * 60),
            run_on_start: false,
        }
    }
}

/// Handle for the running sweep thread (shutdown + trigger hook).
#[derive(Debug)]
pub struct CalibrationSweepRunnerHandle {
    shutdown: mpsc::Sender<()>,
    trigger: mpsc::SyncSender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl CalibrationSweepRunnerHandle {
    /// Request an immediate sweep. Triggers coalesce: if one is already
    /// pending this is a no-op.
    pub fn trigger(&self) {
        let _ = self.trigger.try_send(());
    }

    /// Stop the thread and wait for it to exit.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

impl CalibrationSweepRunner {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    /// Spawn the sweep thread.
    ///
    /// A failed sweep is logged and retried at the next tick.
    pub fn spawn(&self, name: &'static str, sweep: Arc<CalibrationSweep>) -> std::io::Result<CalibrationSweepRunnerHandle> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let (trigger_tx, trigger_rx) = mpsc::sync_channel::<()>(1);

        let cfg = self.clone();
        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || runner_loop(name, cfg, shutdown_rx, trigger_rx, sweep))?;

        Ok(CalibrationSweepRunnerHandle {
            shutdown: shutdown_tx,
            trigger: trigger_tx,
            join: Some(join),
        })
    }
}

fn runner_loop(
    name: &'static str,
    cfg: CalibrationSweepRunner,
    shutdown_rx: mpsc::Receiver<()>,
    trigger_rx: mpsc::Receiver<()>,
    sweep: Arc<CalibrationSweep>,
) {
    info!(runner = name, interval_secs = cfg.interval.as_secs(), "calibration sweep runner started");

    let interval = cfg.interval.max(Duration::from_millis(10));
    let mut next_tick = Instant::now() + interval;
    let mut pending = cfg.run_on_start;

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        let now = Instant::now();
        if now >= next_tick {
            pending = true;
            while next_tick <= now {
                next_tick += interval;
            }
        }

        while trigger_rx.try_recv().is_ok() {
            pending = true;
        }

        if !pending {
            let sleep_for = next_tick
                .saturating_duration_since(Instant::now())
                .min(Duration::from_millis(250));
            thread::sleep(sleep_for);
            continue;
        }

        pending = false;

        if let Err(e) = sweep.run_once() {
            warn!(runner = name, error = %e, "calibration sweep failed");
        }
    }

    info!(runner = name, "calibration sweep runner stopped");
}
