use crate::helpers::shell_backend;

use supervisor_core::backend::process::stop_backend;
use supervisor_core::backend::readiness::{check_health, check_health_within};
use supervisor_core::backend::spawn::start_backend;
use supervisor_core::config::ReadinessConfig;
use supervisor_core::error::spawn::SpawnError;

use models::ServerState;

use std::net::TcpListener;
use std::time::{Duration, Instant};

use serial_test::serial;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mock_port(server: &MockServer) -> u16 {
    server.address().port()
}

/// A port nothing listens on: bind, read it, release it.
fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

// ============================================================================
// check_health
// ============================================================================

#[tokio::test]
async fn given_client_error_status_when_checking_health_then_healthy() {
    // GIVEN: A 404 still proves a listener is bound
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    // WHEN
    let healthy = check_health(&server.uri(), "/").await;

    // THEN
    assert!(healthy);
}

#[tokio::test]
async fn given_server_error_status_when_checking_health_then_unhealthy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    assert!(!check_health(&server.uri(), "/").await);
}

#[tokio::test]
async fn given_nothing_listening_when_checking_health_then_unhealthy() {
    let base_url = format!("http://127.0.0.1:{}", unused_port());

    assert!(!check_health(&base_url, "/").await);
}

#[tokio::test]
async fn given_slow_server_when_checking_health_within_timeout_then_gives_up_early() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let started = Instant::now();
    let healthy = check_health_within(&server.uri(), "/", Duration::from_millis(200)).await;

    assert!(!healthy);
    assert!(started.elapsed() < Duration::from_secs(2));
}

// ============================================================================
// HTTP polling readiness
// ============================================================================

/// **VALUE**: Polling returns as soon as the backend answers.
///
/// **BUG THIS CATCHES**: Would catch polling the wrong host or path, which
/// would only ever time out.
#[tokio::test]
#[serial]
async fn given_backend_answering_on_health_path_when_polling_then_running() {
    // GIVEN: The mock plays the HTTP side, a sleeping shell plays the process
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1..)
        .mount(&server)
        .await;
    let launch = shell_backend("exec sleep 30");
    let readiness = ReadinessConfig::http_poll("/health", Duration::from_secs(5));

    // WHEN
    let mut handle = start_backend(mock_port(&server), &launch, &readiness)
        .await
        .unwrap();

    // THEN
    assert_eq!(handle.state(), ServerState::Running);
    assert_eq!(handle.port(), Some(mock_port(&server)));

    stop_backend(&mut handle);
}

/// **VALUE**: A backend that never becomes healthy fails startup within the
/// configured bound.
///
/// **WHY THIS MATTERS**: Without a bound the app would hang on launch with no
/// window and no dialog.
#[tokio::test]
#[serial]
async fn given_backend_always_failing_when_polling_then_timeout() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let launch = shell_backend("exec sleep 30");
    let readiness = ReadinessConfig::http_poll("/", Duration::from_millis(800));

    // WHEN
    let result = start_backend(mock_port(&server), &launch, &readiness).await;

    // THEN
    assert!(
        matches!(result, Err(SpawnError::Timeout { .. })),
        "got {result:?}"
    );
}

/// **VALUE**: A crashed backend is reported as such instead of waiting out the
/// whole deadline.
///
/// **BUG THIS CATCHES**: Would catch polling that never looks at the child.
#[tokio::test]
#[serial]
async fn given_backend_exiting_during_poll_when_polling_then_exited_early() {
    // GIVEN: Nothing ever listens; the process dies at once
    let launch = shell_backend("exit 3");
    let readiness = ReadinessConfig::http_poll("/", Duration::from_secs(10));

    // WHEN
    let result = start_backend(unused_port(), &launch, &readiness).await;

    // THEN
    assert!(
        matches!(result, Err(SpawnError::ExitedEarly { .. })),
        "got {result:?}"
    );
}

/// **VALUE**: The readiness deadline holds even when the backend accepts
/// connections but never answers.
///
/// **BUG THIS CATCHES**: Would catch a per-request timeout longer than the
/// time left, which overruns `max_wait` by a whole request.
#[tokio::test]
#[serial]
async fn given_backend_hanging_on_requests_when_polling_then_timeout_within_max_wait() {
    // GIVEN: Every response takes far longer than the readiness budget
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;
    let launch = shell_backend("exec sleep 30");
    let readiness = ReadinessConfig::http_poll("/", Duration::from_millis(600));

    // WHEN
    let started = Instant::now();
    let result = start_backend(mock_port(&server), &launch, &readiness).await;

    // THEN
    assert!(
        matches!(result, Err(SpawnError::Timeout { .. })),
        "got {result:?}"
    );
    assert!(
        started.elapsed() < Duration::from_millis(2_500),
        "took {:?}",
        started.elapsed()
    );
}
