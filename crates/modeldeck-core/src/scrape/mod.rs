//! Scrape orchestration: one refresh at a time, cooperative cancellation,
//! streaming writes so readers see partial results mid-refresh.

mod apps;
mod models;
mod rankings;
pub mod source;

pub use source::{OpenRouterSource, RemoteSource};

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::config::Config;
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshStatus {
    Idle,
    Running,
    Stopping,
}

impl std::fmt::Display for RefreshStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshStatus::Idle => write!(f, "idle"),
            RefreshStatus::Running => write!(f, "running"),
            RefreshStatus::Stopping => write!(f, "stopping"),
        }
    }
}

/// Explicit refresh state shared between the HTTP surface and the scrape
/// jobs: tri-state status, cooperative stop flag, and the cached size of the
/// model universe being processed.
pub struct RefreshController {
    status: Mutex<RefreshStatus>,
    stop: AtomicBool,
    total: AtomicUsize,
}

impl RefreshController {
    pub fn new() -> Self {
        Self {
            status: Mutex::new(RefreshStatus::Idle),
            stop: AtomicBool::new(false),
            total: AtomicUsize::new(0),
        }
    }

    pub fn status(&self) -> RefreshStatus {
        *self.status.lock().unwrap()
    }

    /// Size of the model universe of the current (or last) refresh.
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    pub(crate) fn set_total(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Ask the running refresh to wind down. In-flight units finish and are
    /// still written; no new units start once the flag is observed.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
        let mut status = self.status.lock().unwrap();
        if *status == RefreshStatus::Running {
            *status = RefreshStatus::Stopping;
            info!("Refresh stop requested");
        }
    }

    /// Atomic Idle -> Running transition; false when a refresh is active.
    fn try_begin(&self) -> bool {
        let mut status = self.status.lock().unwrap();
        if *status != RefreshStatus::Idle {
            return false;
        }
        *status = RefreshStatus::Running;
        self.stop.store(false, Ordering::Relaxed);
        self.total.store(0, Ordering::Relaxed);
        true
    }

    fn finish(&self) {
        *self.status.lock().unwrap() = RefreshStatus::Idle;
        self.stop.store(false, Ordering::Relaxed);
    }

    /// Start a full refresh in the background if none is running. Returns
    /// whether it was started; an active refresh makes this a no-op.
    ///
    /// The model, rankings, and apps jobs run as concurrent siblings that
    /// share only this controller and the store; partial completion of one
    /// never blocks or rolls back the others.
    pub fn refresh_all(
        self: &Arc<Self>,
        store: Store,
        source: Arc<dyn RemoteSource>,
        config: Config,
    ) -> bool {
        if !self.try_begin() {
            info!("Refresh already running; not starting another");
            return false;
        }
        info!("Refresh started");

        let ctrl = self.clone();
        tokio::spawn(async move {
            let model_job = tokio::spawn(models::run(
                ctrl.clone(),
                store.clone(),
                source.clone(),
                config.clone(),
            ));
            let ranking_job = tokio::spawn(rankings::run(
                ctrl.clone(),
                store.clone(),
                source.clone(),
            ));
            let apps_job = tokio::spawn(apps::run(ctrl.clone(), store.clone(), source.clone()));

            let _ = tokio::join!(model_job, ranking_job, apps_job);

            ctrl.finish();
            info!("Refresh finished; catalog holds {} models", store.model_count());
        });
        true
    }
}

impl Default for RefreshController {
    fn default() -> Self {
        Self::new()
    }
}
