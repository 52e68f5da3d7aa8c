use crate::backend::handle::ServerHandle;
use crate::backend::layout::{AppLayout, BackendLaunch};
use crate::backend::process::stop_backend_with_grace;
use crate::backend::spawn::start_backend;
use crate::config::SupervisorConfig;
use crate::error::SupervisorError;
use crate::port::{PortProbe, TcpPortProbe, acquire_port_with};

use common::ErrorLocation;
use models::{BackendInfo, ServerState};

use std::panic::Location;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::{debug, error, info};
use tokio::time::{MissedTickBehavior, interval};

/// Owns the backend for one application run.
///
/// `start` runs at most once; `stop` is safe in every state and any number
/// of times.
pub struct Supervisor {
    config: SupervisorConfig,
    layout: AppLayout,
    handle: ServerHandle,
    probe: Box<dyn PortProbe + Send + Sync>,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig, layout: AppLayout) -> Self {
        Self::with_probe(config, layout, TcpPortProbe::default())
    }

    /// Use a custom port probe instead of real socket binds.
    pub fn with_probe(
        config: SupervisorConfig,
        layout: AppLayout,
        probe: impl PortProbe + Send + Sync + 'static,
    ) -> Self {
        Self {
            config,
            layout,
            handle: ServerHandle::new(),
            probe: Box::new(probe),
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn state(&self) -> ServerState {
        self.handle.state()
    }

    pub fn port(&self) -> Option<u16> {
        self.handle.port()
    }

    pub fn info(&self) -> Option<&BackendInfo> {
        self.handle.info()
    }

    /// Acquire a port, spawn the backend and wait for readiness.
    ///
    /// # Returns
    ///
    /// * `Ok(port)` - backend is `Running` on `port`
    /// * `Err(SupervisorError)` - the supervisor is now `Stopped`; nothing is
    ///   left running
    pub async fn start(&mut self) -> Result<u16, SupervisorError> {
        let state = self.handle.state();
        if state != ServerState::NotStarted {
            return Err(SupervisorError::AlreadyStarted {
                state,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.handle.begin_starting();

        match self.launch().await {
            Ok(handle) => {
                let port = handle.port().unwrap_or_default();
                self.handle = handle;
                Ok(port)
            }
            Err(e) => {
                error!("Backend startup failed: {e}");
                self.handle.mark_stopped();
                Err(e)
            }
        }
    }

    async fn launch(&self) -> Result<ServerHandle, SupervisorError> {
        let ports = &self.config.ports;
        let port = acquire_port_with(self.probe.as_ref(), ports.start, ports.end)?;

        let launch = BackendLaunch::resolve(&self.config.backend, &self.layout)?;
        let handle = start_backend(port, &launch, &self.config.readiness).await?;

        Ok(handle)
    }

    /// Terminate the backend within the configured grace period.
    pub fn stop(&mut self) {
        stop_backend_with_grace(&mut self.handle, self.config.shutdown.grace());
    }

    /// Move the backend out so it can be stopped without holding a lock
    /// across the grace period. From here on the supervisor reports `Stopped`
    /// and its liveness checks are no-ops.
    pub fn take_handle(&mut self) -> ServerHandle {
        let mut stopped = ServerHandle::new();
        stopped.mark_stopped();
        std::mem::replace(&mut self.handle, stopped)
    }

    /// See [`ServerHandle::check_liveness`].
    pub fn check_liveness(&mut self) -> ServerState {
        self.handle.check_liveness()
    }
}

/// Periodically check the backend until it is `Stopped`.
///
/// Detection only: an exited backend is logged and marked stopped, never
/// restarted. The lock is released before every await.
pub async fn watch_liveness(supervisor: Arc<Mutex<Supervisor>>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Watching backend liveness every {period:?}");

    loop {
        ticker.tick().await;

        let state = supervisor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .check_liveness();

        if state == ServerState::Stopped {
            debug!("Backend stopped, liveness watch finished");
            return;
        }
    }
}
