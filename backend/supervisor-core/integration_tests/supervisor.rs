use crate::helpers::{stub_backend_config, wait_until_gone};

use supervisor_core::backend::process::{process_exists, stop_backend};
use supervisor_core::error::SupervisorError;
use supervisor_core::error::port::PortError;
use supervisor_core::error::spawn::SpawnError;
use supervisor_core::{AppLayout, Supervisor, watch_liveness};

use models::ServerState;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serial_test::serial;
use tempfile::TempDir;
use tokio::time::timeout;

fn layout(dir: &TempDir) -> AppLayout {
    AppLayout::Development {
        root: dir.path().to_path_buf(),
    }
}

// ============================================================================
// End to end
// ============================================================================

/// **VALUE**: The whole lifecycle: probe, spawn on the chosen port, report
/// ready, stop.
///
/// **WHY THIS MATTERS**: With 5001 taken, the window must be pointed at 5002,
/// and the backend must be told 5002 too.
#[tokio::test]
#[serial]
async fn given_first_port_occupied_when_starting_then_backend_runs_on_next_and_stops() {
    // GIVEN: 5001 reported occupied; stub writes its PORT and stays alive
    let dir = tempfile::tempdir().unwrap();
    let config = stub_backend_config(
        dir.path(),
        "echo ready\necho \"$PORT $HOST $FLASK_ENV\" > env.txt\nexec sleep 30\n",
    );
    let mut supervisor = Supervisor::with_probe(config, layout(&dir), |port: u16| port != 5001);

    // WHEN
    let port = supervisor.start().await.unwrap();

    // THEN
    assert_eq!(port, 5002);
    assert_eq!(supervisor.state(), ServerState::Running);
    let info = supervisor.info().unwrap().clone();
    assert_eq!(info.port, 5002);
    assert_eq!(info.base_url, "http://127.0.0.1:5002");
    assert!(process_exists(info.pid));

    let env = std::fs::read_to_string(dir.path().join("env.txt")).unwrap();
    assert_eq!(env.trim(), "5002 127.0.0.1 production");

    // WHEN
    supervisor.stop();

    // THEN
    assert_eq!(supervisor.state(), ServerState::Stopped);
    assert!(wait_until_gone(info.pid, Duration::from_secs(3)));
}

/// **VALUE**: No free port means no backend at all.
///
/// **BUG THIS CATCHES**: Would catch spawning with a fallback port after the
/// range was exhausted.
#[tokio::test]
#[serial]
async fn given_every_port_occupied_when_starting_then_no_port_and_nothing_spawned() {
    // GIVEN
    let dir = tempfile::tempdir().unwrap();
    let config = stub_backend_config(dir.path(), "touch spawned\nexec sleep 30\n");
    let mut supervisor = Supervisor::with_probe(config, layout(&dir), |_: u16| false);

    // WHEN
    let result = supervisor.start().await;

    // THEN
    assert!(
        matches!(
            result,
            Err(SupervisorError::Port(PortError::NoPortAvailable { start: 5001, end: 5100, .. }))
        ),
        "got {result:?}"
    );
    assert_eq!(supervisor.state(), ServerState::Stopped);
    assert!(supervisor.info().is_none());
    assert!(!dir.path().join("spawned").exists());
}

#[tokio::test]
#[serial]
async fn given_missing_interpreter_when_starting_then_spawn_error_and_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = stub_backend_config(dir.path(), "exit 0\n");
    config.backend.interpreter = Some("refiner-no-such-interpreter".to_string());
    let mut supervisor = Supervisor::with_probe(config, layout(&dir), |_: u16| true);

    let result = supervisor.start().await;

    assert!(
        matches!(result, Err(SupervisorError::Spawn(SpawnError::Spawn { .. }))),
        "got {result:?}"
    );
    assert_eq!(supervisor.state(), ServerState::Stopped);
}

/// **VALUE**: A run starts exactly once.
///
/// **BUG THIS CATCHES**: Would catch a second start spawning a second backend
/// that nothing would ever stop.
#[tokio::test]
#[serial]
async fn given_running_supervisor_when_starting_again_then_already_started() {
    // GIVEN
    let dir = tempfile::tempdir().unwrap();
    let config = stub_backend_config(dir.path(), "exec sleep 30\n");
    let mut supervisor = Supervisor::with_probe(config, layout(&dir), |_: u16| true);
    supervisor.start().await.unwrap();

    // WHEN
    let second = supervisor.start().await;

    // THEN
    assert!(matches!(
        second,
        Err(SupervisorError::AlreadyStarted { state: ServerState::Running, .. })
    ));
    assert_eq!(supervisor.state(), ServerState::Running);

    supervisor.stop();
}

#[test]
fn given_never_started_supervisor_when_stopping_twice_then_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let config = stub_backend_config(dir.path(), "exit 0\n");
    let mut supervisor = Supervisor::new(config, layout(&dir));

    supervisor.stop();
    supervisor.stop();

    assert_eq!(supervisor.state(), ServerState::Stopped);
}

// ============================================================================
// Liveness
// ============================================================================

/// **VALUE**: A backend that crashes after startup is noticed and logged.
///
/// **BUG THIS CATCHES**: Would catch the watcher spinning forever on a dead
/// backend, or never releasing the lock.
#[tokio::test]
#[serial]
async fn given_backend_exiting_after_start_when_watching_then_watch_finishes_stopped() {
    // GIVEN: Alive through the 300ms delay, dead shortly after
    let dir = tempfile::tempdir().unwrap();
    let config = stub_backend_config(dir.path(), "sleep 1\nexit 2\n");
    let mut supervisor = Supervisor::with_probe(config, layout(&dir), |_: u16| true);
    supervisor.start().await.unwrap();
    assert_eq!(supervisor.check_liveness(), ServerState::Running);
    let supervisor = Arc::new(Mutex::new(supervisor));

    // WHEN
    let watched = timeout(
        Duration::from_secs(10),
        watch_liveness(Arc::clone(&supervisor), Duration::from_millis(100)),
    )
    .await;

    // THEN
    assert!(watched.is_ok(), "Watcher should return once the backend exits");
    assert_eq!(supervisor.lock().unwrap().state(), ServerState::Stopped);
}

/// **VALUE**: The backend can be taken out and stopped while the supervisor
/// already reads `Stopped`.
///
/// **BUG THIS CATCHES**: Would catch the taken handle leaving a live child
/// behind in the supervisor, where a later stop would signal it again.
#[tokio::test]
#[serial]
async fn given_running_supervisor_when_taking_handle_then_supervisor_stopped_and_handle_running() {
    // GIVEN
    let dir = tempfile::tempdir().unwrap();
    let config = stub_backend_config(dir.path(), "exec sleep 30\n");
    let mut supervisor = Supervisor::with_probe(config, layout(&dir), |_: u16| true);
    supervisor.start().await.unwrap();

    // WHEN
    let mut handle = supervisor.take_handle();

    // THEN
    assert_eq!(supervisor.state(), ServerState::Stopped);
    assert!(supervisor.info().is_none());
    assert_eq!(handle.state(), ServerState::Running);
    let pid = handle.pid().unwrap();

    stop_backend(&mut handle);
    assert!(wait_until_gone(pid, Duration::from_secs(3)));
}
