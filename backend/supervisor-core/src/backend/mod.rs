//! Backend process lifecycle.
//!
//! - [`layout`]: where the backend lives and how to launch it
//! - [`spawn`]: starting it with the port/mode environment
//! - [`readiness`]: deciding when it can serve
//! - [`process`]: stopping it and checking on it
//! - [`handle`]: the owned handle tying these together

pub mod handle;
pub mod layout;
pub mod process;
pub mod readiness;
pub mod spawn;
