//! Periodic fleet sync.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::fleet::FleetSync;
use crate::types::{FleetResults, PassReport, PassTrigger, PollerStatus};

/// Timer that runs [`FleetSync::sync_all`] once on start and then every
/// interval. At most one pass runs at a time.
pub struct SyncPoller {
    runner: Arc<PassRunner>,
    interval: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

struct PassRunner {
    fleet: Arc<FleetSync>,
    in_flight: AtomicBool,
    last_pass: RwLock<Option<PassReport>>,
}

/// Clears the in-flight flag when a pass ends, even by panic.
struct PassGuard<'a>(&'a AtomicBool);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PassRunner {
    async fn run_pass(&self, trigger: PassTrigger) -> Option<FleetResults> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Membership sync pass already in progress; skipping {:?} pass", trigger);
            return None;
        }
        let _guard = PassGuard(&self.in_flight);

        let started_at = Utc::now();
        let results = self.fleet.sync_all().await;
        let completed_at = Utc::now();

        let errors: usize = results.values().map(|r| r.errors.len()).sum();
        info!(
            "Membership sync pass finished: {} admins, {} errors in {} ms",
            results.len(),
            errors,
            (completed_at - started_at).num_milliseconds()
        );

        *self.last_pass.write() = Some(PassReport {
            trigger,
            started_at,
            completed_at,
            results: results.clone(),
        });
        Some(results)
    }
}

impl SyncPoller {
    pub fn new(fleet: Arc<FleetSync>, interval: Duration) -> Self {
        Self {
            runner: Arc::new(PassRunner {
                fleet,
                in_flight: AtomicBool::new(false),
                last_pass: RwLock::new(None),
            }),
            interval: interval.max(Duration::from_millis(1)),
            handle: Mutex::new(None),
        }
    }

    /// Arm the timer. Returns `false` if it was already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut handle = self.handle.lock();
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            info!("Membership sync polling already running");
            return false;
        }

        info!(
            "Starting membership sync polling with interval {}ms",
            self.interval.as_millis()
        );
        let runner = self.runner.clone();
        let period = self.interval;
        *handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                // First tick completes immediately.
                ticker.tick().await;
                let runner = runner.clone();
                // Detached so stopping the timer leaves a running pass alone.
                tokio::spawn(async move {
                    runner.run_pass(PassTrigger::Scheduled).await;
                });
            }
        }));
        true
    }

    /// Cancel the timer. Returns `false` if it was not running.
    pub fn stop(&self) -> bool {
        match self.handle.lock().take() {
            Some(handle) => {
                handle.abort();
                info!("Stopped membership sync polling");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    pub fn is_pass_in_progress(&self) -> bool {
        self.runner.in_flight.load(Ordering::Acquire)
    }

    /// Run one pass now. Returns `None` if a pass is already in progress.
    pub async fn run_now(&self) -> Option<FleetResults> {
        self.runner.run_pass(PassTrigger::Manual).await
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_pass(&self) -> Option<PassReport> {
        self.runner.last_pass.read().clone()
    }

    pub fn status(&self) -> PollerStatus {
        PollerStatus {
            running: self.is_running(),
            pass_in_progress: self.is_pass_in_progress(),
            interval_ms: self.interval.as_millis() as u64,
            last_pass: self.last_pass(),
        }
    }
}

impl Drop for SyncPoller {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.get_mut().take() {
            handle.abort();
        }
    }
}
