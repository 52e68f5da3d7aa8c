// Prevents additional console window on Windows in release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use refiner::error::RefinerError;
use refiner::logger::initialize as LoggerInitialize;
use refiner::runtime::AppRuntime;
use refiner::startup::{launch, load_config, report_startup_failure};

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;

use log::info;
use tauri::{Manager, RunEvent};

fn main() {
    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let log_dir = app
                .path()
                .app_log_dir()
                .map_err(|e| RefinerError::Refiner {
                    message: format!("Failed to get log directory: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            create_dir_all(&log_dir).map_err(|e| RefinerError::Refiner {
                message: format!("Failed to create log directory: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

            // Logger FIRST
            LoggerInitialize(&log_dir)?;

            info!("MetaData Refiner starting");
            info!("Log directory: {}", log_dir.display());

            let config_dir = app
                .path()
                .app_config_dir()
                .map_err(|e| RefinerError::Refiner {
                    message: format!("Failed to get config directory: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                })?;
            let config = load_config(&config_dir);

            if let Err(e) = launch(&*app, config) {
                report_startup_failure(app.handle(), &e);
            }

            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app, event| {
            if let RunEvent::Exit = event
                && let Some(runtime) = app.try_state::<AppRuntime>()
            {
                runtime.shutdown();
            }
        });
}
