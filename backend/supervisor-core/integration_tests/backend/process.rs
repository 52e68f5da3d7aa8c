use crate::helpers::{shell_backend, short_delay, wait_until_gone};

use supervisor_core::ServerHandle;
use supervisor_core::backend::process::{process_exists, stop_backend, stop_backend_with_grace};
use supervisor_core::backend::spawn::start_backend;

use models::ServerState;

use std::time::Duration;

use serial_test::serial;

// ============================================================================
// Stopping
// ============================================================================

/// **VALUE**: Quitting before the backend ever started must not fail.
///
/// **BUG THIS CATCHES**: Would catch a stop path that unwraps the child.
#[test]
fn given_handle_never_started_when_stopping_then_stopped_without_error() {
    // GIVEN
    let mut handle = ServerHandle::new();

    // WHEN
    stop_backend(&mut handle);

    // THEN
    assert_eq!(handle.state(), ServerState::Stopped);
    assert!(!handle.has_process());
}

/// **VALUE**: A normal run ends with the backend gone.
///
/// **WHY THIS MATTERS**: An orphaned backend keeps its port and the next launch
/// silently moves to another one.
#[tokio::test]
#[serial]
async fn given_running_backend_when_stopping_then_process_terminated() {
    // GIVEN: A backend that would live for 30 seconds
    let launch = shell_backend("echo ready; exec sleep 30");
    let mut handle = start_backend(47201, &launch, &short_delay()).await.unwrap();
    let pid = handle.pid().unwrap();
    assert_eq!(handle.state(), ServerState::Running);
    assert!(process_exists(pid), "Backend should be alive after the delay");

    // WHEN
    stop_backend(&mut handle);

    // THEN
    assert_eq!(handle.state(), ServerState::Stopped);
    assert!(wait_until_gone(pid, Duration::from_secs(3)));
}

/// **VALUE**: Stop is idempotent.
///
/// **BUG THIS CATCHES**: Would catch a second stop signalling a PID the OS may
/// have handed to an unrelated process.
#[tokio::test]
#[serial]
async fn given_stopped_backend_when_stopping_again_then_no_op() {
    // GIVEN
    let launch = shell_backend("exec sleep 30");
    let mut handle = start_backend(47202, &launch, &short_delay()).await.unwrap();
    stop_backend(&mut handle);

    // WHEN
    stop_backend(&mut handle);

    // THEN
    assert_eq!(handle.state(), ServerState::Stopped);
    assert!(!handle.has_process());
}

/// **VALUE**: A backend that ignores SIGTERM is still killed once the grace
/// period runs out.
///
/// **BUG THIS CATCHES**: Would catch a stop that waits forever on a stuck
/// backend and hangs the app's exit.
#[tokio::test]
#[serial]
async fn given_backend_ignoring_sigterm_when_stopping_then_killed_after_grace() {
    // GIVEN: sh traps TERM and keeps waiting on its sleep child
    let launch = shell_backend("trap '' TERM; while true; do sleep 1; done");
    let mut handle = start_backend(47203, &launch, &short_delay()).await.unwrap();
    let pid = handle.pid().unwrap();

    // WHEN
    stop_backend_with_grace(&mut handle, Duration::from_millis(300));

    // THEN
    assert_eq!(handle.state(), ServerState::Stopped);
    assert!(wait_until_gone(pid, Duration::from_secs(3)));
}

// ============================================================================
// Fixed-delay optimism
// ============================================================================

/// **VALUE**: With the fixed delay, a backend that dies immediately still
/// reports `Running`; only a liveness check notices.
///
/// **WHY THIS MATTERS**: This is the observed startup behavior: the window opens
/// and shows a connection error rather than the app refusing to start.
#[tokio::test]
#[serial]
async fn given_backend_exiting_nonzero_when_delay_elapses_then_running_until_checked() {
    // GIVEN
    let launch = shell_backend("exit 1");

    // WHEN
    let mut handle = start_backend(47204, &launch, &short_delay()).await.unwrap();

    // THEN
    assert_eq!(handle.state(), ServerState::Running);
    assert_eq!(handle.check_liveness(), ServerState::Stopped);
    assert!(!handle.has_process());
}
