use supervisor_core::BackendLaunch;
use supervisor_core::backend::process::process_exists;
use supervisor_core::config::{ReadinessConfig, SupervisorConfig};

use std::env::temp_dir;
use std::fs::write;
use std::path::Path;
use std::time::{Duration, Instant};

pub const SHORT_DELAY: Duration = Duration::from_millis(300);

/// `sh -c <script>` as a stand-in backend.
pub fn shell_backend(script: &str) -> BackendLaunch {
    BackendLaunch::new("sh", temp_dir()).arg("-c").arg(script)
}

pub fn short_delay() -> ReadinessConfig {
    ReadinessConfig::fixed_delay(SHORT_DELAY)
}

/// Config that runs `script` as `sh stub.sh` from `dir`.
pub fn stub_backend_config(dir: &Path, script: &str) -> SupervisorConfig {
    write(dir.join("stub.sh"), script).expect("write stub script");

    let mut config = SupervisorConfig::default();
    config.backend.interpreter = Some("sh".to_string());
    config.backend.entry_script = "stub.sh".to_string();
    config.backend.working_dir = Some(dir.to_path_buf());
    config.readiness = short_delay();
    config.shutdown.grace_ms = 2_000;
    config
}

/// Poll until `pid` disappears or `timeout` passes.
pub fn wait_until_gone(pid: u32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if !process_exists(pid) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    !process_exists(pid)
}
