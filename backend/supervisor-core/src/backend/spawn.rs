use crate::backend::handle::ServerHandle;
use crate::backend::layout::BackendLaunch;
use crate::backend::process::kill_now;
use crate::backend::readiness::wait_until_ready;
use crate::config::ReadinessConfig;
use crate::error::spawn::SpawnError;
use crate::{BACKEND_BASE_URL, BACKEND_HOSTNAME};

use common::ErrorLocation;
use models::BackendInfoBuilder;

use std::io::ErrorKind;
use std::panic::Location;
use std::process::Stdio;

use log::{debug, info, warn};
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::process::Child as TokioChild;
use tokio::process::Command as TokioCommand;
use tokio::spawn as TokioSpawn;

pub const MODE_ENV: &str = "FLASK_ENV";
pub const PRODUCTION_MODE: &str = "production";
pub const DEBUG_ENV: &str = "FLASK_DEBUG";
pub const DEBUG_DISABLED: &str = "0";
pub const PORT_ENV: &str = "PORT";
pub const HOST_ENV: &str = "HOST";

/// Log target for forwarded backend output.
pub const BACKEND_LOG_TARGET: &str = "backend";

/// Contract variables are applied after the configured extras so they win.
pub(crate) fn build_backend_command(port: u16, launch: &BackendLaunch) -> TokioCommand {
    let mut cmd = TokioCommand::new(launch.program());
    cmd.args(launch.args())
        .current_dir(launch.working_dir())
        .envs(launch.extra_env())
        .env(MODE_ENV, PRODUCTION_MODE)
        .env(DEBUG_ENV, DEBUG_DISABLED)
        .env(PORT_ENV, port.to_string())
        .env(HOST_ENV, BACKEND_HOSTNAME)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Spawn the backend on `port` and wait until it is considered ready.
///
/// Output is forwarded to the log for the lifetime of the process under the
/// `backend` target. With the default fixed-delay readiness the returned
/// handle is `Running` even if the process has already died; use
/// [`ServerHandle::check_liveness`] to find out.
///
/// # Errors
///
/// * [`SpawnError::Spawn`] - the process could not be created
/// * [`SpawnError::Timeout`] / [`SpawnError::ExitedEarly`] - HTTP polling
///   readiness failed; the child has been killed
pub async fn start_backend(
    port: u16,
    launch: &BackendLaunch,
    readiness: &ReadinessConfig,
) -> Result<ServerHandle, SpawnError> {
    let mut handle = ServerHandle::new();
    handle.begin_starting();
    handle.assign_port(port)?;

    let command_line = launch.display_command();
    info!("Starting backend on port {port}: {command_line}");

    let mut child = spawn_backend_process(port, launch)?;
    forward_output(&mut child);

    let Some(pid) = child.id() else {
        handle.mark_stopped();
        return Err(SpawnError::ExitedEarly {
            message: String::from("Backend process exited before its PID could be read"),
            location: ErrorLocation::from(Location::caller()),
        });
    };

    let base_url = format!("{BACKEND_BASE_URL}:{port}");

    let info = match BackendInfoBuilder::default()
        .with_pid(pid)
        .with_port(port)
        .with_base_url(base_url.clone())
        .with_command(command_line)
        .with_working_dir(launch.working_dir())
        .build()
    {
        Ok(info) => info,
        Err(e) => {
            kill_now(&mut child);
            handle.mark_stopped();
            return Err(e.into());
        }
    };

    if let Err(e) = wait_until_ready(&mut child, &base_url, readiness).await {
        warn!("Backend readiness failed, killing spawned process (PID {pid})");
        kill_now(&mut child);
        handle.mark_stopped();
        return Err(e);
    }

    handle.attach(child, info);
    handle.mark_running();

    info!("Backend running at {base_url} (PID: {pid})");
    Ok(handle)
}

#[track_caller]
fn spawn_backend_process(port: u16, launch: &BackendLaunch) -> Result<TokioChild, SpawnError> {
    let program = launch.program().to_string_lossy().into_owned();
    debug!(
        "Spawning {program} in {}",
        launch.working_dir().display()
    );

    build_backend_command(port, launch)
        .spawn()
        .map_err(|err| {
            let message = if err.kind() == ErrorKind::NotFound {
                format!("Backend interpreter '{program}' not found: {err}")
            } else {
                format!("Failed to spawn {program}: {err}")
            };
            SpawnError::Spawn {
                message,
                location: ErrorLocation::from(Location::caller()),
                source: Box::new(err),
            }
        })
}

/// Forward stdout at info and stderr at warn without ever blocking the caller.
fn forward_output(child: &mut TokioChild) {
    if let Some(stdout) = child.stdout.take() {
        TokioSpawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(target: BACKEND_LOG_TARGET, "stdout: {line}");
            }
            debug!(target: BACKEND_LOG_TARGET, "stdout closed");
        });
    }

    if let Some(stderr) = child.stderr.take() {
        TokioSpawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                warn!(target: BACKEND_LOG_TARGET, "stderr: {line}");
            }
            debug!(target: BACKEND_LOG_TARGET, "stderr closed");
        });
    }
}
