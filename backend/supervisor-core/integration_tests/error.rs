use supervisor_core::error::SupervisorError;
use supervisor_core::error::port::PortError;
use supervisor_core::error::spawn::SpawnError;

use common::ErrorLocation;
use models::ServerState;

use std::error::Error;
use std::io::{Error as IoError, ErrorKind};

/// **VALUE**: The startup dialog shows this text; it has to say what was full.
#[test]
fn given_no_port_error_when_formatted_then_names_range_and_location() {
    let err = PortError::NoPortAvailable {
        start: 5001,
        end: 5100,
        location: ErrorLocation::here(),
    };

    let text = err.to_string();

    assert!(text.starts_with("No Port Available Error"));
    assert!(text.contains("5001..5100"));
    assert!(text.contains("error.rs"), "Location suffix missing: {text}");
}

/// **VALUE**: The OS error behind a failed spawn stays reachable for logs.
///
/// **BUG THIS CATCHES**: Would catch losing `#[source]` on `SpawnError::Spawn`.
#[test]
fn given_spawn_error_when_inspecting_source_then_io_error_preserved() {
    let err = SpawnError::Spawn {
        message: "Backend interpreter 'python3' not found".to_string(),
        location: ErrorLocation::here(),
        source: Box::new(IoError::new(ErrorKind::NotFound, "No such file")),
    };

    let source = err.source().expect("source should be set");

    assert!(source.to_string().contains("No such file"));
    assert!(err.to_string().contains("Spawn Error"));
}

/// **VALUE**: Wrapping keeps the inner message verbatim.
#[test]
fn given_wrapped_port_error_when_formatted_then_transparent() {
    let inner = PortError::InvalidRange {
        message: "range 5100..5100 is empty".to_string(),
        location: ErrorLocation::here(),
    };
    let inner_text = inner.to_string();

    let wrapped = SupervisorError::from(inner);

    assert_eq!(wrapped.to_string(), inner_text);
}

#[test]
fn given_already_started_error_when_formatted_then_names_state() {
    let err = SupervisorError::AlreadyStarted {
        state: ServerState::Running,
        location: ErrorLocation::here(),
    };

    assert!(err.to_string().contains("supervisor is running"));
}
