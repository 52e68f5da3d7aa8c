use refiner::error::RefinerError;
use refiner::startup::run_startup;

use models::ServerState;
use supervisor_core::AppLayout;
use supervisor_core::config::{ReadinessConfig, SupervisorConfig};

use std::fs::write;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serial_test::serial;

/// Layout whose backend dir holds `app.py`, run with `sh` instead of Python.
fn stub_layout(root: &Path, script: &str) -> (SupervisorConfig, AppLayout) {
    write(root.join("app.py"), script).unwrap();

    let mut config = SupervisorConfig::default();
    config.ports.start = 47300;
    config.ports.end = 47320;
    config.backend.interpreter = Some("sh".to_string());
    config.readiness = ReadinessConfig::fixed_delay(Duration::from_millis(300));
    config.shutdown.grace_ms = 2_000;

    let layout = AppLayout::Development {
        root: root.to_path_buf(),
    };
    (config, layout)
}

/// **VALUE**: A successful startup hands back a runtime whose shutdown stops
/// the backend.
///
/// **WHY THIS MATTERS**: This is the path every normal launch and quit takes.
#[tokio::test]
#[serial]
async fn given_working_backend_when_starting_then_runtime_running_until_shutdown() {
    // GIVEN
    let dir = tempfile::tempdir().unwrap();
    let (config, layout) = stub_layout(dir.path(), "echo ready\nexec sleep 30\n");

    // WHEN
    let runtime = run_startup(config, layout).await.unwrap();

    // THEN
    assert!((47300..47320).contains(&runtime.port()));
    assert_eq!(runtime.backend_state(), ServerState::Running);

    runtime.shutdown();
    assert_eq!(runtime.backend_state(), ServerState::Stopped);
}

/// **VALUE**: A missing backend entry point is a startup failure with a
/// readable cause, not a window pointing at nothing.
///
/// **BUG THIS CATCHES**: Would catch spawning the interpreter on a file that
/// does not exist and reporting success after the delay.
#[tokio::test]
#[serial]
async fn given_missing_entry_script_when_starting_then_core_error() {
    // GIVEN
    let dir = tempfile::tempdir().unwrap();
    let (mut config, layout) = stub_layout(dir.path(), "exit 0\n");
    config.backend.entry_script = "missing.py".to_string();

    // WHEN
    let result = run_startup(config, layout).await;

    // THEN
    let err = result.err().expect("startup should fail");
    assert!(matches!(err, RefinerError::Core { .. }));
    assert!(err.to_string().contains("missing.py"), "got {err}");
}

/// **VALUE**: Waiting out a slow backend on quit does not freeze anything
/// else that asks about the backend.
///
/// **WHY THIS MATTERS**: The liveness watcher runs on a tokio worker; blocking
/// it on the lock for the whole grace period stalls the runtime during exit.
#[tokio::test]
#[serial]
async fn given_backend_ignoring_sigterm_when_shutting_down_then_state_readable_meanwhile() {
    // GIVEN: A backend that ignores SIGTERM, so shutdown waits the full grace
    let dir = tempfile::tempdir().unwrap();
    let (mut config, layout) = stub_layout(
        dir.path(),
        "trap '' TERM\nwhile true; do sleep 1; done\n",
    );
    config.shutdown.grace_ms = 1_500;
    let runtime = Arc::new(run_startup(config, layout).await.unwrap());

    // WHEN
    let stopping = Arc::clone(&runtime);
    let shutdown = thread::spawn(move || stopping.shutdown());
    thread::sleep(Duration::from_millis(300));
    let asked = Instant::now();
    let state = runtime.backend_state();

    // THEN
    assert!(
        asked.elapsed() < Duration::from_millis(500),
        "State query waited {:?}",
        asked.elapsed()
    );
    assert_eq!(state, ServerState::Stopped);
    shutdown.join().unwrap();
    assert!(runtime.has_shut_down());
}
