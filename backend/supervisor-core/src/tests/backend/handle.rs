use crate::backend::handle::ServerHandle;
use crate::error::spawn::SpawnError;

use models::ServerState;

#[test]
fn given_new_handle_when_inspected_then_not_started_without_port() {
    let handle = ServerHandle::new();

    assert_eq!(handle.state(), ServerState::NotStarted);
    assert_eq!(handle.port(), None);
    assert!(handle.info().is_none());
    assert!(!handle.has_process());
}

/// **VALUE**: The port is fixed once assigned.
///
/// **BUG THIS CATCHES**: Would catch a code path that silently rebinds the
/// backend to a different port mid-run while the window still points at the old one.
#[test]
fn given_assigned_port_when_assigning_different_port_then_rejected() {
    // GIVEN: Port 5002 assigned
    let mut handle = ServerHandle::new();
    handle.assign_port(5002).unwrap();

    // WHEN: Re-assigning the same port, then another one
    let same = handle.assign_port(5002);
    let other = handle.assign_port(5003);

    // THEN
    assert!(same.is_ok());
    assert!(matches!(other, Err(SpawnError::Validation { .. })));
    assert_eq!(handle.port(), Some(5002));
}

/// **VALUE**: `Stopped` is terminal within a run.
///
/// **BUG THIS CATCHES**: Would catch `transition` applying illegal moves instead
/// of ignoring them.
#[test]
fn given_stopped_handle_when_marked_running_then_stays_stopped() {
    // GIVEN: A handle that failed during start
    let mut handle = ServerHandle::new();
    handle.begin_starting();
    handle.mark_stopped();

    // WHEN
    handle.mark_running();

    // THEN
    assert_eq!(handle.state(), ServerState::Stopped);
}

#[test]
fn given_handle_without_process_when_checking_liveness_then_state_unchanged() {
    let mut handle = ServerHandle::new();

    assert_eq!(handle.check_liveness(), ServerState::NotStarted);

    handle.begin_starting();
    assert_eq!(handle.check_liveness(), ServerState::Starting);
}
