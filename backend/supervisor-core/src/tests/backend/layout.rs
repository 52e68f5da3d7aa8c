use crate::backend::layout::{
    AppLayout, BackendLaunch, development_root, packaged_resource_dir, resolve_interpreter,
};
use crate::config::BackendConfig;
use crate::error::spawn::SpawnError;

use std::env::{current_dir, set_current_dir};
use std::fs::{create_dir_all, read_to_string, write};
use std::path::{Path, PathBuf};

use serial_test::serial;
use tempfile::TempDir;

fn backend_dir_with_entry() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path().join("app.py"), "print('hi')\n").unwrap();
    dir
}

#[test]
fn given_packaged_layout_when_resolving_backend_dir_then_uses_app_subdir() {
    let layout = AppLayout::Packaged {
        resource_dir: PathBuf::from("/opt/refiner/resources"),
    };

    assert_eq!(layout.backend_dir(), Path::new("/opt/refiner/resources/app"));
}

#[test]
fn given_development_layout_when_resolving_backend_dir_then_uses_root() {
    let layout = AppLayout::Development {
        root: PathBuf::from("/home/dev/refiner"),
    };

    assert_eq!(layout.backend_dir(), Path::new("/home/dev/refiner"));
}

/// **VALUE**: Debug builds find the backend in the checkout no matter where
/// the app was launched from.
///
/// **BUG THIS CATCHES**: Would catch rooting the development layout at the
/// current directory, so `cargo run` from the workspace root and from the app
/// crate resolve different backends.
#[test]
#[serial]
fn given_different_working_dirs_when_detecting_layout_then_same_layout() {
    // GIVEN
    let original = current_dir().unwrap();
    let elsewhere = tempfile::tempdir().unwrap();
    let from_original = AppLayout::detect().unwrap();

    // WHEN
    set_current_dir(elsewhere.path()).unwrap();
    let from_elsewhere = AppLayout::detect();
    set_current_dir(&original).unwrap();

    // THEN
    assert_eq!(from_elsewhere.unwrap(), from_original);
}

#[test]
fn given_checkout_when_resolving_development_root_then_workspace_manifest() {
    let root = development_root().unwrap();

    let manifest = read_to_string(root.join("Cargo.toml")).unwrap();
    assert!(manifest.contains("[workspace]"), "{} is not the workspace root", root.display());
}

/// **VALUE**: Packaged builds find the bundled backend next to the executable.
///
/// **BUG THIS CATCHES**: Would catch a layout change that looks for resources in
/// the working directory, which is arbitrary for an installed app.
#[cfg(not(target_os = "macos"))]
#[test]
fn given_installed_executable_when_deriving_resource_dir_then_sibling_resources() {
    let exe = Path::new("/opt/refiner/refiner");

    let dir = packaged_resource_dir(exe).unwrap();

    assert_eq!(dir, Path::new("/opt/refiner/resources"));
}

#[cfg(target_os = "macos")]
#[test]
fn given_bundle_executable_when_deriving_resource_dir_then_contents_resources() {
    let exe = Path::new("/Applications/Refiner.app/Contents/MacOS/refiner");

    let dir = packaged_resource_dir(exe).unwrap();

    assert_eq!(dir, Path::new("/Applications/Refiner.app/Contents/Resources"));
}

/// **VALUE**: The entry script is launched by absolute path from its own directory.
///
/// **BUG THIS CATCHES**: Would catch a relative script path that only works when
/// the shell happens to be started from the backend directory.
#[test]
fn given_entry_script_present_when_resolving_then_launch_targets_it() {
    // GIVEN: A backend directory with app.py and an explicit interpreter
    let dir = backend_dir_with_entry();
    let config = BackendConfig {
        interpreter: Some("python3.12".to_string()),
        working_dir: Some(dir.path().to_path_buf()),
        ..BackendConfig::default()
    };
    let layout = AppLayout::Development {
        root: PathBuf::from("/nonexistent"),
    };

    // WHEN
    let launch = BackendLaunch::resolve(&config, &layout).unwrap();

    // THEN: Override beats layout; script path is absolute
    assert_eq!(launch.program(), "python3.12");
    assert_eq!(launch.working_dir(), dir.path());
    assert_eq!(launch.args().len(), 1);
    assert_eq!(Path::new(&launch.args()[0]), dir.path().join("app.py"));
}

#[test]
fn given_missing_directory_when_resolving_then_working_directory_error() {
    let config = BackendConfig::default();
    let layout = AppLayout::Development {
        root: PathBuf::from("/definitely/not/here"),
    };

    let result = BackendLaunch::resolve(&config, &layout);

    assert!(matches!(result, Err(SpawnError::WorkingDirectory { .. })));
}

/// **VALUE**: A missing script is a startup error, not a crash of the child later.
///
/// **BUG THIS CATCHES**: Would catch dropping the entry check, which turns a
/// broken install into a backend that exits silently after the readiness delay.
#[test]
fn given_missing_entry_script_when_resolving_then_entry_point_missing() {
    // GIVEN: Empty directory as the development root
    let dir = tempfile::tempdir().unwrap();
    let layout = AppLayout::Development {
        root: dir.path().to_path_buf(),
    };

    // WHEN
    let result = BackendLaunch::resolve(&BackendConfig::default(), &layout);

    // THEN
    match result {
        Err(SpawnError::EntryPointMissing { path, .. }) => {
            assert_eq!(path, dir.path().join("app.py"));
        }
        other => panic!("Expected EntryPointMissing, got {other:?}"),
    }
}

#[test]
fn given_config_env_when_resolving_then_carried_into_launch() {
    let dir = backend_dir_with_entry();
    let mut config = BackendConfig {
        working_dir: Some(dir.path().to_path_buf()),
        ..BackendConfig::default()
    };
    config
        .env
        .insert("OPENAI_TIMEOUT".to_string(), "30".to_string());
    let layout = AppLayout::Development {
        root: dir.path().to_path_buf(),
    };

    let launch = BackendLaunch::resolve(&config, &layout).unwrap();

    assert_eq!(
        launch.extra_env().get("OPENAI_TIMEOUT").map(String::as_str),
        Some("30")
    );
}

#[cfg(unix)]
#[test]
fn given_project_virtualenv_when_resolving_interpreter_then_prefers_it() {
    // GIVEN: backend dir with .venv/bin/python3
    let dir = tempfile::tempdir().unwrap();
    let venv_bin = dir.path().join(".venv").join("bin");
    create_dir_all(&venv_bin).unwrap();
    write(venv_bin.join("python3"), "").unwrap();

    // WHEN
    let interpreter = resolve_interpreter(None, dir.path());

    // THEN
    assert_eq!(Path::new(&interpreter), venv_bin.join("python3"));
}

#[test]
fn given_no_virtualenv_when_resolving_interpreter_then_falls_back_to_path_python() {
    let dir = tempfile::tempdir().unwrap();

    let interpreter = resolve_interpreter(None, dir.path());

    let expected = if cfg!(windows) { "python" } else { "python3" };
    assert_eq!(interpreter, expected);
}

#[test]
fn given_launch_with_args_when_displaying_then_space_joined() {
    let launch = BackendLaunch::new("sh", "/tmp").arg("-c").arg("echo ready");

    assert_eq!(launch.display_command(), "sh -c echo ready");
}
