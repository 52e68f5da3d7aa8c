//! Shared building blocks for the MetaData Refiner shell.
//!
//! Everything here is used by more than one crate in the workspace:
//!
//! - **common** (this crate): error location tracking
//! - **models**: pure data describing the backend process
//! - **supervisor-core**: port acquisition and backend lifecycle
//! - **refiner**: the desktop application wiring everything together

pub mod error;

pub use error::error_location::ErrorLocation;
