use common::ErrorLocation;
use supervisor_core::error::SupervisorError;

use std::panic::Location;

use thiserror::Error;

/// Errors raised while bringing the application up.
///
/// Every one of them ends in the startup dialog, so the display text is what
/// the user sees after the fixed message.
#[derive(Debug, Error)]
pub enum RefinerError {
    /// Error from this App
    #[error("Refiner Error: {message} {location}")]
    Refiner {
        message: String,
        location: ErrorLocation,
    },

    /// Error from supervisor-core (port, spawn, config)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },

    /// The main window could not be created
    #[error("Window Error: {message} {location}")]
    Window {
        message: String,
        location: ErrorLocation,
    },
}

impl From<SupervisorError> for RefinerError {
    #[track_caller]
    fn from(err: SupervisorError) -> Self {
        RefinerError::Core {
            message: err.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
