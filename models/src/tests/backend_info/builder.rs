use crate::{BackendInfoBuilder, ModelError};

fn complete_builder() -> BackendInfoBuilder {
    BackendInfoBuilder::default()
        .with_pid(4242)
        .with_port(5001)
        .with_base_url("http://127.0.0.1:5001")
        .with_command("python3 app.py")
        .with_working_dir("/opt/refiner/app")
}

fn validation_message(result: Result<crate::BackendInfo, ModelError>) -> String {
    match result {
        Err(ModelError::Validation { message, .. }) => message,
        Ok(info) => panic!("Expected validation error, got {info:?}"),
    }
}

/// **VALUE**: The happy path produces exactly the fields the supervisor passed in.
///
/// **BUG THIS CATCHES**: Would catch field mix-ups in `build()` (e.g. port copied from pid).
#[test]
fn given_all_fields_when_building_then_returns_backend_info() {
    // GIVEN: A fully populated builder
    let builder = complete_builder();

    // WHEN: Building
    let info = builder.build().expect("complete builder should validate");

    // THEN: Fields round-trip
    assert_eq!(info.pid, 4242);
    assert_eq!(info.port, 5001);
    assert_eq!(info.base_url, "http://127.0.0.1:5001");
    assert_eq!(info.command, "python3 app.py");
    assert_eq!(info.working_dir.to_str(), Some("/opt/refiner/app"));
}

/// **VALUE**: PID 0 would make stop requests signal the whole process group.
///
/// **BUG THIS CATCHES**: Would catch removal of the zero-PID guard.
#[test]
fn given_zero_pid_when_building_then_returns_validation_error() {
    // GIVEN: Builder with PID zero
    let builder = complete_builder().with_pid(0);

    // WHEN / THEN
    assert_eq!(validation_message(builder.build()), "PID must be non-zero");
}

/// **VALUE**: Backends never get privileged ports.
///
/// **BUG THIS CATCHES**: Would catch a port range misconfiguration slipping through
/// into a spawned process description.
#[test]
fn given_privileged_port_when_building_then_returns_validation_error() {
    // GIVEN: Port 80 with a matching URL
    let builder = complete_builder()
        .with_port(80)
        .with_base_url("http://127.0.0.1:80");

    // WHEN / THEN
    assert_eq!(validation_message(builder.build()), "Port 80 is below 1024");
}

/// **VALUE**: The URL handed to readiness polling must target the assigned port.
///
/// **BUG THIS CATCHES**: Would catch a stale base URL left over from a previous port.
#[test]
fn given_base_url_for_other_port_when_building_then_returns_validation_error() {
    // GIVEN: Port and URL disagree
    let builder = complete_builder().with_base_url("http://127.0.0.1:5002");

    // WHEN
    let message = validation_message(builder.build());

    // THEN
    assert!(message.contains("does not target port 5001"), "{message}");
}

#[test]
fn given_missing_working_dir_when_building_then_returns_validation_error() {
    let builder = BackendInfoBuilder::default()
        .with_pid(1234)
        .with_port(5001)
        .with_base_url("http://127.0.0.1:5001")
        .with_command("python3 app.py");

    assert_eq!(
        validation_message(builder.build()),
        "Working directory is required"
    );
}

#[test]
fn given_blank_command_when_building_then_returns_validation_error() {
    let builder = complete_builder().with_command("   ");

    assert_eq!(validation_message(builder.build()), "Command cannot be empty");
}
