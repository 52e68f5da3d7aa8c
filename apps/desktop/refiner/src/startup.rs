//! Bringing the application up, and the one way it fails.
//!
//! Order is fixed: config, layout, port, backend, readiness, window. Any
//! failure before the window exists ends in a single error dialog and exit
//! code 1.

use crate::error::RefinerError;
use crate::runtime::AppRuntime;
use crate::window::create_main_window;

use supervisor_core::config::SupervisorConfig;
use supervisor_core::error::SupervisorError;
use supervisor_core::{AppLayout, Supervisor, watch_liveness};

use std::path::Path;

use log::{error, info, warn};
use tauri::async_runtime::{block_on, spawn};
use tauri::{AppHandle, Manager, Runtime};
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};

pub const STARTUP_ERROR_TITLE: &str = "Startup Error";
pub const STARTUP_ERROR_MESSAGE: &str = "Failed to start the application server. Please try again.";
pub const STARTUP_FAILURE_EXIT_CODE: i32 = 1;

/// Read `config.json`, writing defaults on first run.
///
/// A broken file never blocks startup: it is logged, left in place for the
/// user to fix, and defaults are used for this run.
pub fn load_config(config_dir: &Path) -> SupervisorConfig {
    let path = SupervisorConfig::file_path(config_dir);

    if !path.exists() {
        let config = SupervisorConfig::default();
        match config.save(config_dir) {
            Ok(()) => info!("Wrote default config to {}", path.display()),
            Err(e) => warn!("Could not write default config: {e}"),
        }
        return config;
    }

    match SupervisorConfig::load(config_dir) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Ignoring {}: {e}. Using defaults", path.display());
            SupervisorConfig::default()
        }
    }
}

/// Start the backend and wrap it for the rest of the run.
///
/// On failure nothing is left running.
pub async fn run_startup(
    config: SupervisorConfig,
    layout: AppLayout,
) -> Result<AppRuntime, RefinerError> {
    info!("Backend directory: {}", layout.backend_dir().display());

    let mut supervisor = Supervisor::new(config, layout);
    match supervisor.start().await {
        Ok(port) => {
            info!("Backend ready on port {port}");
            Ok(AppRuntime::new(supervisor, port))
        }
        Err(e) => {
            supervisor.stop();
            Err(e.into())
        }
    }
}

/// Full startup from inside Tauri's `setup`: backend, window, liveness watch.
///
/// The runtime is only managed once the window exists, so a failed launch
/// leaves no state behind for the exit handler.
pub fn launch<R, M>(manager: &M, config: SupervisorConfig) -> Result<(), RefinerError>
where
    R: Runtime,
    M: Manager<R>,
{
    let layout = AppLayout::detect().map_err(SupervisorError::from)?;
    let runtime = block_on(run_startup(config, layout))?;

    if let Err(e) = create_main_window(manager, runtime.port()) {
        runtime.shutdown();
        return Err(e);
    }

    if let Some(interval) = runtime.liveness_interval() {
        spawn(watch_liveness(runtime.supervisor(), interval));
    }

    manager.manage(runtime);
    Ok(())
}

/// Text shown in the startup error dialog.
pub fn startup_failure_text(err: &RefinerError) -> String {
    format!("{STARTUP_ERROR_MESSAGE}\n\n{err}")
}

/// Log the failure, show the dialog, exit with code 1 once it is dismissed.
pub fn report_startup_failure<R: Runtime>(app: &AppHandle<R>, err: &RefinerError) {
    error!("Startup failed: {err}");

    let handle = app.clone();
    app.dialog()
        .message(startup_failure_text(err))
        .title(STARTUP_ERROR_TITLE)
        .kind(MessageDialogKind::Error)
        .buttons(MessageDialogButtons::Ok)
        .show(move |_| handle.exit(STARTUP_FAILURE_EXIT_CODE));
}
