use supervisor_core::error::port::PortError;
use supervisor_core::port::{PortProbe, TcpPortProbe, acquire_port};

use std::net::TcpListener;
use std::ops::Range;

use serial_test::serial;

// ============================================================================
// Port acquisition against real sockets
// Ranges are far from the default 5001..5100 so a running app does not interfere
// ============================================================================

/// Hold every bindable port in `range`. Ports another process already holds
/// are occupied anyway.
fn occupy(range: Range<u16>) -> Vec<TcpListener> {
    range
        .filter_map(|port| TcpListener::bind(("127.0.0.1", port)).ok())
        .collect()
}

/// **VALUE**: A port held by another listener is never returned.
///
/// **BUG THIS CATCHES**: Would catch a probe that binds a different interface
/// than the backend and so misses listeners on loopback.
#[test]
#[serial]
fn given_listeners_on_low_ports_when_acquiring_then_skips_them() {
    // GIVEN: 47100..47105 held by us
    let held = occupy(47100..47105);
    let held_ports: Vec<u16> = held
        .iter()
        .map(|l| l.local_addr().unwrap().port())
        .collect();

    // WHEN
    let port = acquire_port(47100, 47120).expect("some port above 47104 is free");

    // THEN
    assert!(!held_ports.contains(&port));
    assert!(port >= 47105);
}

/// **VALUE**: A fully occupied range is reported, not silently widened.
///
/// **BUG THIS CATCHES**: Would catch fallback to an OS-assigned port, which the
/// window would never learn about.
#[test]
#[serial]
fn given_whole_range_held_when_acquiring_then_no_port_available() {
    // GIVEN
    let _held = occupy(47120..47126);

    // WHEN
    let result = acquire_port(47120, 47126);

    // THEN
    assert!(
        matches!(result, Err(PortError::NoPortAvailable { start: 47120, end: 47126, .. })),
        "got {result:?}"
    );
}

/// **VALUE**: The one released port in an otherwise full range is found.
#[test]
#[serial]
fn given_single_released_port_when_acquiring_then_returns_it() {
    // GIVEN: Hold 47130..47140, then release 47134
    let mut held = occupy(47130..47140);
    held.retain(|l| l.local_addr().unwrap().port() != 47134);

    // WHEN
    let port = acquire_port(47130, 47140);

    // THEN
    assert_eq!(port.unwrap(), 47134);
}

/// **VALUE**: Probing must release the port so the backend can bind it.
///
/// **BUG THIS CATCHES**: Would catch a probe that leaks its listener (e.g. via
/// `mem::forget`), making every backend fail with "address in use".
#[test]
#[serial]
fn given_acquired_port_when_binding_again_then_succeeds() {
    // GIVEN
    let port = acquire_port(47150, 47170).unwrap();

    // WHEN
    let rebind = TcpListener::bind(("127.0.0.1", port));

    // THEN
    assert!(rebind.is_ok(), "Port {port} should be free after probing");
    assert!(!TcpPortProbe::default().is_available(port), "Now held by rebind");
}

/// **VALUE**: A port held only on the IPv6 loopback is not handed out.
///
/// **WHY THIS MATTERS**: The window loads `localhost`, which may resolve to
/// `::1`. Sharing the port with a foreign `[::1]` listener would show that
/// server's pages inside the app.
///
/// **BUG THIS CATCHES**: Would catch a probe that only binds `127.0.0.1`.
#[test]
#[serial]
fn given_foreign_listener_on_ipv6_loopback_when_acquiring_then_port_skipped() {
    // GIVEN: 47411 held on [::1] only
    let Ok(held) = TcpListener::bind(("::1", 47411)) else {
        eprintln!("IPv6 loopback unavailable, nothing to check");
        return;
    };

    // WHEN
    let port = acquire_port(47411, 47420).expect("a later port is free");

    // THEN
    assert_ne!(port, 47411);
    drop(held);
}

/// **VALUE**: A port held on the IPv4 loopback stays unavailable for the
/// dual-loopback probe as well.
#[test]
#[serial]
fn given_listener_on_ipv4_loopback_when_probing_then_unavailable() {
    let held = TcpListener::bind(("127.0.0.1", 0)).unwrap();
    let port = held.local_addr().unwrap().port();

    assert!(!TcpPortProbe::default().is_available(port));
}
