use crate::config::BackendConfig;
use crate::error::spawn::SpawnError;

use common::ErrorLocation;

use std::collections::BTreeMap;
use std::env::current_exe;
use std::ffi::{OsStr, OsString};
use std::io::{Error as IoError, ErrorKind};
use std::panic::Location;
use std::path::{Path, PathBuf};

use log::debug;

const PACKAGED_BACKEND_DIR: &str = "app";

/// `backend/supervisor-core` sits two levels below the workspace root.
const WORKSPACE_DEPTH: usize = 2;

#[cfg(target_os = "macos")]
const PACKAGED_RESOURCE_DIR: &str = "Resources";
#[cfg(not(target_os = "macos"))]
const PACKAGED_RESOURCE_DIR: &str = "resources";

#[cfg(windows)]
const DEFAULT_INTERPRETER: &str = "python";
#[cfg(not(windows))]
const DEFAULT_INTERPRETER: &str = "python3";

const VIRTUALENV_DIRS: [&str; 2] = [".venv", "venv"];

#[cfg(windows)]
const VIRTUALENV_INTERPRETER: &str = "Scripts/python.exe";
#[cfg(not(windows))]
const VIRTUALENV_INTERPRETER: &str = "bin/python3";

/// Where the backend's files live for this build of the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppLayout {
    /// Installed bundle; the backend ships under `<resource_dir>/app`.
    Packaged { resource_dir: PathBuf },
    /// Source checkout; the backend sits at the project root.
    Development { root: PathBuf },
}

impl AppLayout {
    /// Release builds are packaged, debug builds run from the source checkout.
    ///
    /// Neither depends on the directory the app was started from; use
    /// `backend.working_dir` to point a debug build elsewhere.
    #[track_caller]
    pub fn detect() -> Result<Self, SpawnError> {
        if cfg!(debug_assertions) {
            let root = development_root()?;
            debug!("Development layout rooted at {}", root.display());
            return Ok(AppLayout::Development { root });
        }

        let exe = current_exe().map_err(|e| SpawnError::Spawn {
            message: format!("Failed to get current executable path: {e}"),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(e),
        })?;

        let resource_dir = packaged_resource_dir(&exe)?;
        debug!("Packaged layout with resources at {}", resource_dir.display());
        Ok(AppLayout::Packaged { resource_dir })
    }

    /// Directory holding the backend entry point.
    pub fn backend_dir(&self) -> PathBuf {
        match self {
            AppLayout::Packaged { resource_dir } => resource_dir.join(PACKAGED_BACKEND_DIR),
            AppLayout::Development { root } => root.clone(),
        }
    }
}

/// Workspace root of the checkout this crate was built from.
#[track_caller]
pub(crate) fn development_root() -> Result<PathBuf, SpawnError> {
    let location = ErrorLocation::from(Location::caller());
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(WORKSPACE_DEPTH)
        .map(Path::to_path_buf)
        .ok_or_else(|| SpawnError::WorkingDirectory {
            path: manifest_dir.to_path_buf(),
            message: String::from("Crate is not inside the expected workspace"),
            location,
        })
}

/// Bundle resource directory relative to the running executable.
///
/// macOS bundles keep the binary in `Contents/MacOS` and resources in
/// `Contents/Resources`; elsewhere resources sit next to the binary.
#[track_caller]
pub(crate) fn packaged_resource_dir(exe: &Path) -> Result<PathBuf, SpawnError> {
    let no_parent = || SpawnError::Spawn {
        message: format!("Executable has no parent directory: {}", exe.display()),
        location: ErrorLocation::from(Location::caller()),
        source: Box::new(IoError::new(ErrorKind::NotFound, "no parent dir")),
    };

    let exe_dir = exe.parent().ok_or_else(no_parent)?;

    if cfg!(target_os = "macos") {
        let contents = exe_dir.parent().ok_or_else(no_parent)?;
        Ok(contents.join(PACKAGED_RESOURCE_DIR))
    } else {
        Ok(exe_dir.join(PACKAGED_RESOURCE_DIR))
    }
}

/// Everything needed to start one backend process.
#[derive(Debug, Clone)]
pub struct BackendLaunch {
    program: OsString,
    args: Vec<OsString>,
    working_dir: PathBuf,
    env: BTreeMap<String, String>,
}

impl BackendLaunch {
    pub fn new(program: impl Into<OsString>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Resolve the launch from configuration and the detected layout.
    ///
    /// # Errors
    ///
    /// * [`SpawnError::WorkingDirectory`] - backend directory missing
    /// * [`SpawnError::EntryPointMissing`] - entry script not in the directory
    #[track_caller]
    pub fn resolve(config: &BackendConfig, layout: &AppLayout) -> Result<Self, SpawnError> {
        let working_dir = config
            .working_dir
            .clone()
            .unwrap_or_else(|| layout.backend_dir());

        if !working_dir.is_dir() {
            return Err(SpawnError::WorkingDirectory {
                path: working_dir,
                message: String::from("Backend directory does not exist"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let entry_point = working_dir.join(&config.entry_script);
        if !entry_point.is_file() {
            return Err(SpawnError::EntryPointMissing {
                path: entry_point,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let program = resolve_interpreter(config.interpreter.as_deref(), &working_dir);
        debug!(
            "Resolved backend: {} {} in {}",
            program.to_string_lossy(),
            entry_point.display(),
            working_dir.display()
        );

        let mut launch = BackendLaunch::new(program, working_dir).arg(entry_point);
        launch.env.extend(config.env.clone());
        Ok(launch)
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn extra_env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Human-readable command line for logs and [`models::BackendInfo`].
    pub fn display_command(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| part.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Configured interpreter, else a project virtualenv, else python from `PATH`.
pub(crate) fn resolve_interpreter(configured: Option<&str>, working_dir: &Path) -> OsString {
    if let Some(interpreter) = configured {
        return OsString::from(interpreter);
    }

    VIRTUALENV_DIRS
        .iter()
        .map(|dir| working_dir.join(dir).join(VIRTUALENV_INTERPRETER))
        .find(|candidate| candidate.is_file())
        .map(PathBuf::into_os_string)
        .unwrap_or_else(|| OsString::from(DEFAULT_INTERPRETER))
}
