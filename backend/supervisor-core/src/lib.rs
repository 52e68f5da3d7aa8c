pub mod backend;
pub mod config;
pub mod error;
pub mod port;
pub mod supervisor;

#[cfg(test)]
mod tests;

pub use backend::handle::ServerHandle;
pub use backend::layout::{AppLayout, BackendLaunch};
pub use supervisor::{Supervisor, watch_liveness};

/// Interface the backend binds and the supervisor polls.
pub const BACKEND_HOSTNAME: &str = "127.0.0.1";
pub const BACKEND_BASE_URL: &str = const_format::concatcp!("http://", BACKEND_HOSTNAME);

/// Host the window loads the UI from.
pub const UI_HOSTNAME: &str = "localhost";
pub const UI_BASE_URL: &str = const_format::concatcp!("http://", UI_HOSTNAME);

pub const DEFAULT_PORT_RANGE_START: u16 = 5001;
pub const DEFAULT_PORT_RANGE_END: u16 = 5100;
