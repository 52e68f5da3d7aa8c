use crate::config::{ReadinessConfig, ReadinessMode};
use crate::error::spawn::SpawnError;

use common::ErrorLocation;

use std::panic::Location;
use std::time::{Duration, Instant};

use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, info, trace};
use reqwest::Client;
use tokio::process::Child as TokioChild;
use tokio::time::sleep as TokioSleep;

const CHECK_HEALTH_DURATION: Duration = Duration::from_secs(3);
const POLL_INITIAL_INTERVAL: Duration = Duration::from_millis(100);
const POLL_MAX_INTERVAL: Duration = Duration::from_secs(1);

/// Probe the backend once.
///
/// Any HTTP answer below 500 counts: the backend's routes are its own
/// business, a bound listener is all readiness means here.
///
/// # Arguments
///
/// * `base_url` - e.g. `http://127.0.0.1:5001`
/// * `path` - request path starting with `/`
pub async fn check_health(base_url: &str, path: &str) -> bool {
    check_health_within(base_url, path, CHECK_HEALTH_DURATION).await
}

/// [`check_health`] with a caller-chosen request timeout.
pub async fn check_health_within(base_url: &str, path: &str, timeout: Duration) -> bool {
    let url = format!("{base_url}{path}");
    let client = Client::new();

    match client.get(&url).timeout(timeout).send().await {
        Ok(resp) if !resp.status().is_server_error() => {
            debug!("Health check succeeded for {url}: status={}", resp.status());
            true
        }
        Ok(resp) => {
            debug!("Health check failed for {url}: status={}", resp.status());
            false
        }
        Err(e) => {
            trace!("Health check failed for {url}: {e}");
            false
        }
    }
}

/// Block until the backend is considered ready.
///
/// `FixedDelay` never fails and never looks at the child: a backend that died
/// during the delay is still reported ready.
pub(crate) async fn wait_until_ready(
    child: &mut TokioChild,
    base_url: &str,
    config: &ReadinessConfig,
) -> Result<(), SpawnError> {
    match config.mode {
        ReadinessMode::FixedDelay => {
            debug!("Waiting {:?} for backend to bind", config.delay());
            TokioSleep(config.delay()).await;
            Ok(())
        }
        ReadinessMode::HttpPoll => poll_health(child, base_url, config).await,
    }
}

async fn poll_health(
    child: &mut TokioChild,
    base_url: &str,
    config: &ReadinessConfig,
) -> Result<(), SpawnError> {
    let mut backoff = ExponentialBackoff {
        initial_interval: POLL_INITIAL_INTERVAL,
        current_interval: POLL_INITIAL_INTERVAL,
        max_interval: POLL_MAX_INTERVAL,
        max_elapsed_time: Some(config.max_wait()),
        ..Default::default()
    };

    let deadline = Instant::now() + config.max_wait();

    debug!(
        "Polling {base_url}{} for readiness (max {:?})",
        config.health_path,
        config.max_wait()
    );

    loop {
        if let Ok(Some(status)) = child.try_wait() {
            return Err(SpawnError::ExitedEarly {
                message: format!("Backend exited with {status} before becoming ready"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(timed_out(base_url, config));
        }

        let request_timeout = remaining.min(CHECK_HEALTH_DURATION);
        if check_health_within(base_url, &config.health_path, request_timeout).await {
            info!("Backend is ready at {base_url}");
            return Ok(());
        }

        match backoff.next_backoff() {
            Some(duration) => {
                let duration = duration.min(deadline.saturating_duration_since(Instant::now()));
                trace!("Backend not ready, retrying after {duration:?}");
                TokioSleep(duration).await;
            }
            None => return Err(timed_out(base_url, config)),
        }
    }
}

#[track_caller]
fn timed_out(base_url: &str, config: &ReadinessConfig) -> SpawnError {
    SpawnError::Timeout {
        message: format!(
            "Backend at {base_url} did not become ready within {:?}",
            config.max_wait()
        ),
        location: ErrorLocation::from(Location::caller()),
    }
}
