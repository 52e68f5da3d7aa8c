use crate::navigation::NavigationGuard;

use url::Url;

fn url(raw: &str) -> Url {
    Url::parse(raw).unwrap()
}

#[test]
fn given_port_when_building_guard_then_start_url_is_localhost_on_port() {
    let guard = NavigationGuard::new(5002).unwrap();

    assert_eq!(guard.start_url().as_str(), "http://localhost:5002/");
}

/// **VALUE**: The UI can move between its own pages.
#[test]
fn given_same_origin_paths_when_navigating_then_allowed() {
    let guard = NavigationGuard::new(5002).unwrap();

    assert!(guard.allows(&url("http://localhost:5002/")));
    assert!(guard.allows(&url("http://localhost:5002/records/7?tab=raw#top")));
}

/// **VALUE**: The window never leaves the backend's origin.
///
/// **WHY THIS MATTERS**: The webview has no address bar; a link that leaves the
/// origin would strand the user on a foreign page inside the app.
///
/// **BUG THIS CATCHES**: Would catch a prefix check on the URL string, which
/// lets `http://localhost:50021` or `http://localhost:5002.evil.test` through.
#[test]
fn given_other_origins_when_navigating_then_refused() {
    // GIVEN
    let guard = NavigationGuard::new(5002).unwrap();

    // WHEN / THEN
    for raw in [
        "http://localhost:5003/",
        "http://localhost:50021/",
        "https://localhost:5002/",
        "http://127.0.0.1:5002/",
        "http://localhost.evil.test:5002/",
        "https://example.com/",
        "file:///etc/passwd",
    ] {
        assert!(!guard.allows(&url(raw)), "{raw} should be refused");
    }
}
