pub mod config;
pub mod port;
pub mod spawn;

use common::ErrorLocation;
use models::ServerState;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Port(#[from] port::PortError),

    #[error(transparent)]
    Spawn(#[from] spawn::SpawnError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("Already Started Error: supervisor is {state}, a run starts exactly once {location}")]
    AlreadyStarted {
        state: ServerState,
        location: ErrorLocation,
    },
}
