use crate::backend::handle::ServerHandle;

use std::process::ExitStatus;
use std::thread::sleep;
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, info, trace, warn};
use sysinfo::{Pid, Process, ProcessesToUpdate, Signal, System};
use tokio::process::Child as TokioChild;

pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
const KILL_REAP_MAX_ELAPSED: Duration = Duration::from_secs(2);
const EXIT_POLL_INITIAL_INTERVAL: Duration = Duration::from_millis(25);
const EXIT_POLL_MAX_INTERVAL: Duration = Duration::from_millis(500);

pub(crate) fn with_process<F, R>(pid: u32, f: F) -> Option<R>
where
    F: FnOnce(&Process) -> R,
{
    let pid = Pid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    sys.process(pid).map(f)
}

/// Whether a process with this PID exists (zombies included).
pub fn process_exists(pid: u32) -> bool {
    with_process(pid, |_| true).unwrap_or(false)
}

/// Stop the backend with the default grace period.
///
/// See [`stop_backend_with_grace`].
pub fn stop_backend(handle: &mut ServerHandle) {
    stop_backend_with_grace(handle, DEFAULT_SHUTDOWN_GRACE);
}

/// Terminate the backend and mark the handle `Stopped`.
///
/// Accepts a handle in any state and never fails: calling it twice, or on a
/// handle that never started, only logs. SIGTERM first (hard kill where the
/// platform has no terminate signal), then up to `grace` for the process to
/// exit before it is killed outright.
pub fn stop_backend_with_grace(handle: &mut ServerHandle, grace: Duration) {
    let Some(mut child) = handle.take_child() else {
        debug!("No backend process to stop (state: {})", handle.state());
        handle.mark_stopped();
        return;
    };

    let pid = handle.pid().or_else(|| child.id());

    match child.try_wait() {
        Ok(Some(status)) => {
            info!("Backend already exited with {status}");
            handle.mark_stopped();
            return;
        }
        Ok(None) => {}
        Err(e) => warn!("Failed to poll backend before stopping: {e}"),
    }

    info!("Stopping backend (PID {})", pid.unwrap_or_default());

    let terminated = pid.is_some_and(terminate_pid);
    if !terminated {
        kill_now(&mut child);
    }

    match wait_for_exit(&mut child, grace) {
        Some(status) => info!("Backend exited with {status}"),
        None => {
            warn!("Backend still running after {grace:?}, killing");
            kill_now(&mut child);
            match wait_for_exit(&mut child, KILL_REAP_MAX_ELAPSED) {
                Some(status) => info!("Backend killed: {status}"),
                None => warn!("Backend did not report exit after kill"),
            }
        }
    }

    handle.mark_stopped();
}

/// Send SIGTERM. `false` when the process is gone, protected, or the platform
/// has no terminate signal.
fn terminate_pid(pid: u32) -> bool {
    if pid <= 1 {
        warn!("Refusing to signal PID {pid}");
        return false;
    }

    with_process(pid, |p| match p.kill_with(Signal::Term) {
        Some(sent) => {
            debug!("Sent SIGTERM to PID {pid}: success={sent}");
            sent
        }
        None => {
            debug!("SIGTERM unsupported on this platform for PID {pid}");
            false
        }
    })
    .unwrap_or_else(|| {
        debug!("Process {pid} not found");
        false
    })
}

/// Hard kill without waiting. Errors mean the process is already gone.
pub(crate) fn kill_now(child: &mut TokioChild) {
    if let Err(e) = child.start_kill() {
        debug!("Kill request not delivered: {e}");
    }
}

/// Reap the child, polling with exponential backoff for at most `max_elapsed`.
fn wait_for_exit(child: &mut TokioChild, max_elapsed: Duration) -> Option<ExitStatus> {
    let mut backoff = ExponentialBackoff {
        initial_interval: EXIT_POLL_INITIAL_INTERVAL,
        current_interval: EXIT_POLL_INITIAL_INTERVAL,
        max_interval: EXIT_POLL_MAX_INTERVAL,
        max_elapsed_time: Some(max_elapsed),
        ..Default::default()
    };

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) => {}
            Err(e) => {
                warn!("Failed to poll backend exit: {e}");
                return None;
            }
        }

        match backoff.next_backoff() {
            Some(duration) => {
                trace!("Backend still alive, retrying after {duration:?}");
                sleep(duration);
            }
            None => return None,
        }
    }
}
