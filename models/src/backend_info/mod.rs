pub mod builder;

use serde::Serialize;

use std::path::PathBuf;

/// Description of a spawned backend process.
///
/// Immutable once built: the port in particular never changes for the
/// lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendInfo {
    pub pid: u32,
    pub port: u16,
    pub base_url: String,
    pub command: String,
    pub working_dir: PathBuf,
}
