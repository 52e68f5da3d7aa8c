use common::ErrorLocation;
use models::ModelError;

use std::error::Error as StdError;
use std::panic::Location;
use std::path::PathBuf;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum SpawnError {
    #[error("Spawn Error: {message} {location}")]
    Spawn {
        message: String,
        location: ErrorLocation,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Working Directory Error: {message}: {path} {location}")]
    WorkingDirectory {
        path: PathBuf,
        message: String,
        location: ErrorLocation,
    },

    #[error("Entry Point Missing Error: {path} {location}")]
    EntryPointMissing {
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("Timeout Error: {message} {location}")]
    Timeout {
        message: String,
        location: ErrorLocation,
    },

    #[error("Exited Early Error: {message} {location}")]
    ExitedEarly {
        message: String,
        location: ErrorLocation,
    },

    #[error("Validation Error: {message} {location}")]
    Validation {
        message: String,
        location: ErrorLocation,
    },
}

impl From<ModelError> for SpawnError {
    #[track_caller]
    fn from(error: ModelError) -> Self {
        SpawnError::Validation {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
