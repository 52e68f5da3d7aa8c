// Unit tests for backend command construction.
// Process-level tests are in integration_tests/backend/

use crate::backend::layout::BackendLaunch;
use crate::backend::spawn::{
    DEBUG_DISABLED, DEBUG_ENV, HOST_ENV, MODE_ENV, PORT_ENV, PRODUCTION_MODE,
    build_backend_command,
};

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::Path;

fn envs_of(cmd: &tokio::process::Command) -> HashMap<String, Option<String>> {
    cmd.as_std()
        .get_envs()
        .map(|(key, value)| {
            (
                key.to_string_lossy().into_owned(),
                value.map(|v| v.to_string_lossy().into_owned()),
            )
        })
        .collect()
}

/// **VALUE**: The backend contract is the port and mode variables.
///
/// **BUG THIS CATCHES**: Would catch a backend starting in debug mode (reloader
/// forks a second process the supervisor cannot stop) or on its default port.
#[test]
fn given_port_when_building_command_then_sets_contract_environment() {
    // GIVEN
    let launch = BackendLaunch::new("python3", "/opt/refiner/app").arg("/opt/refiner/app/app.py");

    // WHEN
    let cmd = build_backend_command(5007, &launch);
    let envs = envs_of(&cmd);

    // THEN
    assert_eq!(envs[PORT_ENV].as_deref(), Some("5007"));
    assert_eq!(envs[MODE_ENV].as_deref(), Some(PRODUCTION_MODE));
    assert_eq!(envs[DEBUG_ENV].as_deref(), Some(DEBUG_DISABLED));
    assert_eq!(envs[HOST_ENV].as_deref(), Some("127.0.0.1"));
}

/// **VALUE**: Configured extras cannot override the contract.
///
/// **BUG THIS CATCHES**: Would catch reordering `.envs()` after the contract
/// variables, letting a stale `PORT` in config.json desync window and backend.
#[test]
fn given_extra_env_overriding_port_when_building_command_then_contract_wins() {
    // GIVEN: Extras that collide with the contract plus one harmless extra
    let launch = BackendLaunch::new("python3", "/tmp")
        .env(PORT_ENV, "9999")
        .env(DEBUG_ENV, "1")
        .env("OPENAI_MODEL", "small");

    // WHEN
    let envs = envs_of(&build_backend_command(5010, &launch));

    // THEN
    assert_eq!(envs[PORT_ENV].as_deref(), Some("5010"));
    assert_eq!(envs[DEBUG_ENV].as_deref(), Some("0"));
    assert_eq!(envs["OPENAI_MODEL"].as_deref(), Some("small"));
}

#[test]
fn given_launch_when_building_command_then_program_args_and_dir_match() {
    let launch = BackendLaunch::new("python3", "/opt/refiner/app").arg("app.py");

    let cmd = build_backend_command(5001, &launch);
    let std_cmd = cmd.as_std();

    assert_eq!(std_cmd.get_program(), "python3");
    assert_eq!(
        std_cmd.get_args().collect::<Vec<_>>(),
        vec![OsStr::new("app.py")]
    );
    assert_eq!(std_cmd.get_current_dir(), Some(Path::new("/opt/refiner/app")));
}
