use crate::error::RefinerError;
use crate::navigation::NavigationGuard;

use common::ErrorLocation;

use std::panic::Location;

use log::info;
use tauri::{Manager, Runtime, WebviewUrl, WebviewWindow, WebviewWindowBuilder};

pub const MAIN_WINDOW_LABEL: &str = "main";
pub const MAIN_WINDOW_TITLE: &str = "MetaData Refiner";
pub const MAIN_WINDOW_WIDTH: f64 = 1200.0;
pub const MAIN_WINDOW_HEIGHT: f64 = 800.0;

/// Open the main window on the backend's UI and pin it to that origin.
#[track_caller]
pub fn create_main_window<R, M>(manager: &M, port: u16) -> Result<WebviewWindow<R>, RefinerError>
where
    R: Runtime,
    M: Manager<R>,
{
    let guard = NavigationGuard::new(port)?;
    let url = guard.start_url().clone();
    let location = ErrorLocation::from(Location::caller());

    info!("Opening main window at {url}");

    WebviewWindowBuilder::new(manager, MAIN_WINDOW_LABEL, WebviewUrl::External(url))
        .title(MAIN_WINDOW_TITLE)
        .inner_size(MAIN_WINDOW_WIDTH, MAIN_WINDOW_HEIGHT)
        .on_navigation(move |target| guard.allows(target))
        .build()
        .map_err(|e| RefinerError::Window {
            message: format!("Failed to create main window: {e}"),
            location,
        })
}
