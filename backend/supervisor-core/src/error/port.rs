use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum PortError {
    #[error("No Port Available Error: every port in {start}..{end} is occupied {location}")]
    NoPortAvailable {
        start: u16,
        end: u16,
        location: ErrorLocation,
    },

    #[error("Invalid Range Error: {message} {location}")]
    InvalidRange {
        message: String,
        location: ErrorLocation,
    },
}
