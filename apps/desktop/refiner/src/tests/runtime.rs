use crate::runtime::AppRuntime;

use models::ServerState;
use supervisor_core::config::SupervisorConfig;
use supervisor_core::{AppLayout, Supervisor};

use std::thread;

fn idle_runtime(config: SupervisorConfig) -> AppRuntime {
    let layout = AppLayout::Development {
        root: std::env::temp_dir(),
    };
    AppRuntime::new(Supervisor::new(config, layout), 5001)
}

/// **VALUE**: Quitting twice (window close then app exit) stops the backend once.
///
/// **BUG THIS CATCHES**: Would catch the once-guard being dropped, sending a
/// second signal to a PID the OS may have reused.
#[test]
fn given_runtime_when_shutting_down_twice_then_runs_once() {
    // GIVEN
    let runtime = idle_runtime(SupervisorConfig::default());
    assert!(!runtime.has_shut_down());

    // WHEN
    runtime.shutdown();
    runtime.shutdown();

    // THEN
    assert!(runtime.has_shut_down());
    assert_eq!(runtime.backend_state(), ServerState::Stopped);
}

/// **VALUE**: Shutdown still happens after a panic elsewhere poisoned the lock.
///
/// **WHY THIS MATTERS**: The exit handler is the last chance to stop the
/// backend; giving up on poison would orphan it.
#[test]
fn given_poisoned_lock_when_shutting_down_then_still_stops() {
    // GIVEN
    let runtime = idle_runtime(SupervisorConfig::default());
    let supervisor = runtime.supervisor();
    let _ = thread::spawn(move || {
        let _guard = supervisor.lock().unwrap();
        panic!("poison the supervisor lock");
    })
    .join();
    assert!(runtime.supervisor().is_poisoned());

    // WHEN
    runtime.shutdown();

    // THEN
    assert!(runtime.has_shut_down());
    assert_eq!(runtime.backend_state(), ServerState::Stopped);
}

#[test]
fn given_liveness_disabled_when_building_runtime_then_no_interval() {
    let mut config = SupervisorConfig::default();
    config.liveness.interval_ms = 0;

    let runtime = idle_runtime(config);

    assert!(runtime.liveness_interval().is_none());
    assert_eq!(runtime.port(), 5001);
}
