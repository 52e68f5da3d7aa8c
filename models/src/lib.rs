//! Domain models for the MetaData Refiner shell.
//!
//! Pure data describing the backend process the shell supervises. Models carry
//! validation but no behavior: spawning, probing and killing live in
//! `supervisor-core`.

pub mod backend_info;
pub mod error;
pub mod server_state;

pub use backend_info::BackendInfo;
pub use backend_info::builder::BackendInfoBuilder;
pub use error::model_error::ModelError;
pub use server_state::ServerState;

pub use common::ErrorLocation;

/// Lowest port the shell will ever hand to a backend.
pub const MIN_BACKEND_PORT: u16 = 1024;

#[cfg(test)]
mod tests;
