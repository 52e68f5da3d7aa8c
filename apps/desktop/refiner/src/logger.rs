//! Logging for the MetaData Refiner desktop application.
//!
//! Dual output (stdout with colors + file) with thread-safe initialization.
//! Backend stdout/stderr arrives here under the `backend` target.

use crate::error::RefinerError;

use common::ErrorLocation;

use std::io::stdout;
use std::panic::Location;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339;
use log::{LevelFilter, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();

static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

pub const LOG_FILE_NAME: &str = "refiner.log";

const LOGGER_INITIALIZED_MESSAGE_PREFIX: &str = "Logger initialized with level: ";

const LOGGER_ALREADY_INITIALIZED_MESSAGE: &str = "Logger already initialized";

#[cfg(debug_assertions)]
const LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// HTTP client internals are noisy at debug during readiness polling.
const QUIET_TARGETS: [&str; 3] = ["hyper_util", "reqwest", "rustls"];

/// Initialize the logger with dual output (stdout + `refiner.log`).
///
/// Safe to call multiple times: later calls log a warning and return Ok.
///
/// # Errors
///
/// Returns an error if the log file cannot be created or a global logger is
/// already installed by someone else.
pub fn initialize(log_dir: &Path) -> Result<(), RefinerError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("{LOGGER_ALREADY_INITIALIZED_MESSAGE}");
        return Ok(());
    }

    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = build_dispatch(log_dir).and_then(apply_dispatch);
        if result.is_ok() {
            info!("{LOGGER_INITIALIZED_MESSAGE_PREFIX}{LOG_LEVEL:?}");
        }
    });

    result
}

/// Assemble the stdout and file chains without installing them.
#[track_caller]
pub(crate) fn build_dispatch(log_dir: &Path) -> Result<Dispatch, RefinerError> {
    let log_file_path = log_dir.join(LOG_FILE_NAME);

    let color_configuration = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let base_dispatch = QUIET_TARGETS
        .iter()
        .fold(Dispatch::new().level(LOG_LEVEL), |dispatch, target| {
            dispatch.level_for(*target, LevelFilter::Info)
        });

    let stdout_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message} [{file}:{line}]",
                date = format_rfc3339(SystemTime::now()),
                level = color_configuration.color(record.level()),
                file = record.file().unwrap_or("unknown"),
                line = record.line().unwrap_or(0),
            ))
        })
        .chain(stdout());

    let log_file = fern::log_file(&log_file_path).map_err(|e| RefinerError::Refiner {
        message: format!(
            "Failed to create log file {}: {e}",
            log_file_path.display()
        ),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let file_dispatch = Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message} [{file}:{line}]",
                date = format_rfc3339(SystemTime::now()),
                level = record.level(),
                file = record.file().unwrap_or("unknown"),
                line = record.line().unwrap_or(0),
            ))
        })
        .chain(log_file);

    Ok(base_dispatch.chain(stdout_dispatch).chain(file_dispatch))
}

#[track_caller]
fn apply_dispatch(dispatch: Dispatch) -> Result<(), RefinerError> {
    dispatch.apply().map_err(|e| RefinerError::Refiner {
        message: format!("Failed to initialize logger: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })
}
