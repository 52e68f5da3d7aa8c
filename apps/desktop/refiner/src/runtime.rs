use models::ServerState;
use supervisor_core::Supervisor;
use supervisor_core::backend::process::stop_backend_with_grace;

use std::sync::{Arc, Mutex, MutexGuard, Once, PoisonError};
use std::time::Duration;

use log::{debug, info};

/// Everything the running application owns, stored as Tauri managed state.
///
/// Created once startup has succeeded. `shutdown` is the only way the backend
/// is stopped, and it runs at most once.
pub struct AppRuntime {
    supervisor: Arc<Mutex<Supervisor>>,
    port: u16,
    liveness_interval: Option<Duration>,
    shutdown_once: Once,
}

impl AppRuntime {
    pub fn new(supervisor: Supervisor, port: u16) -> Self {
        let liveness_interval = supervisor.config().liveness.interval();
        Self {
            supervisor: Arc::new(Mutex::new(supervisor)),
            port,
            liveness_interval,
            shutdown_once: Once::new(),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Shared handle for the liveness watcher.
    pub fn supervisor(&self) -> Arc<Mutex<Supervisor>> {
        Arc::clone(&self.supervisor)
    }

    /// `None` when liveness watching is disabled.
    pub fn liveness_interval(&self) -> Option<Duration> {
        self.liveness_interval
    }

    pub fn backend_state(&self) -> ServerState {
        self.lock().state()
    }

    pub fn has_shut_down(&self) -> bool {
        self.shutdown_once.is_completed()
    }

    /// Stop the backend. Later calls are no-ops.
    ///
    /// Never fails: a poisoned lock is recovered, and stopping itself only logs.
    /// The lock is released before waiting for the backend to exit, so state
    /// queries and liveness ticks never wait on the grace period.
    pub fn shutdown(&self) {
        let mut ran = false;
        self.shutdown_once.call_once(|| {
            info!("Shutting down backend on port {}", self.port);
            let (mut handle, grace) = {
                let mut supervisor = self.lock();
                (supervisor.take_handle(), supervisor.config().shutdown.grace())
            };
            stop_backend_with_grace(&mut handle, grace);
            ran = true;
        });

        if !ran {
            debug!("Shutdown already performed");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Supervisor> {
        self.supervisor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
