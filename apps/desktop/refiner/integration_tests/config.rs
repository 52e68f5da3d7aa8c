use refiner::startup::load_config;

use supervisor_core::config::SupervisorConfig;

use std::fs::{read_to_string, write};

/// **VALUE**: First run leaves an editable config behind.
///
/// **BUG THIS CATCHES**: Would catch defaults being used without ever being
/// written, leaving users nothing to edit.
#[test]
fn given_no_config_file_when_loading_then_defaults_written() {
    // GIVEN
    let dir = tempfile::tempdir().unwrap();

    // WHEN
    let config = load_config(dir.path());

    // THEN
    assert_eq!(config, SupervisorConfig::default());
    let written = SupervisorConfig::load(dir.path()).unwrap();
    assert_eq!(written, config);
}

#[test]
fn given_custom_config_file_when_loading_then_values_used() {
    let dir = tempfile::tempdir().unwrap();
    write(
        SupervisorConfig::file_path(dir.path()),
        r#"{ "ports": { "start": 6001, "end": 6010 } }"#,
    )
    .unwrap();

    let config = load_config(dir.path());

    assert_eq!((config.ports.start, config.ports.end), (6001, 6010));
}

/// **VALUE**: A broken config never stops the app from starting, and the
/// user's file is not overwritten.
///
/// **BUG THIS CATCHES**: Would catch a fallback that "repairs" the file by
/// saving defaults over the user's edits.
#[test]
fn given_invalid_config_file_when_loading_then_defaults_and_file_untouched() {
    // GIVEN: Parses, but fails validation
    let dir = tempfile::tempdir().unwrap();
    let path = SupervisorConfig::file_path(dir.path());
    let contents = r#"{ "ports": { "start": 80, "end": 90 } }"#;
    write(&path, contents).unwrap();

    // WHEN
    let config = load_config(dir.path());

    // THEN
    assert_eq!(config, SupervisorConfig::default());
    assert_eq!(read_to_string(&path).unwrap(), contents);
}
