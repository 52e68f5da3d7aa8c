use crate::error::model_error::ModelError;
use crate::{BackendInfo, ErrorLocation, MIN_BACKEND_PORT};

use std::panic::Location;
use std::path::PathBuf;

/// Builder for creating validated BackendInfo instances.
#[derive(Debug, Default)]
pub struct BackendInfoBuilder {
    pid: Option<u32>,
    port: Option<u16>,
    base_url: Option<String>,
    command: Option<String>,
    working_dir: Option<PathBuf>,
}

impl BackendInfoBuilder {
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_command(mut self, cmd: impl Into<String>) -> Self {
        self.command = Some(cmd.into());
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Build the BackendInfo with validation.
    #[track_caller]
    pub fn build(self) -> Result<BackendInfo, ModelError> {
        let pid = self.pid.ok_or_else(|| ModelError::Validation {
            message: String::from("PID is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if pid == 0 {
            return Err(ModelError::Validation {
                message: String::from("PID must be non-zero"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let port = self.port.ok_or_else(|| ModelError::Validation {
            message: String::from("Port is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if port < MIN_BACKEND_PORT {
            return Err(ModelError::Validation {
                message: format!("Port {port} is below {MIN_BACKEND_PORT}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let base_url = self.base_url.ok_or_else(|| ModelError::Validation {
            message: String::from("Base URL is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if !base_url.starts_with("http://") {
            return Err(ModelError::Validation {
                message: format!("Invalid base URL format: {base_url}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if !base_url.ends_with(&format!(":{port}")) {
            return Err(ModelError::Validation {
                message: format!("Base URL {base_url} does not target port {port}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let command = self.command.ok_or_else(|| ModelError::Validation {
            message: String::from("Command is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if command.trim().is_empty() {
            return Err(ModelError::Validation {
                message: String::from("Command cannot be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let working_dir = self.working_dir.ok_or_else(|| ModelError::Validation {
            message: String::from("Working directory is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        Ok(BackendInfo {
            pid,
            port,
            base_url,
            command,
            working_dir,
        })
    }
}
