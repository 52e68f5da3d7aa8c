// Unit tests for port selection over mocked probes.
// Tests that bind real sockets are in integration_tests/port.rs

use crate::error::port::PortError;
use crate::port::{TcpPortProbe, acquire_port_with, host_missing};

use std::cell::RefCell;
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// **VALUE**: Occupied ports must never be handed to the backend.
///
/// **BUG THIS CATCHES**: Would catch an inverted availability check or an
/// off-by-one that returns the port just probed instead of the free one.
#[test]
fn given_occupied_ports_when_acquiring_then_none_of_them_is_returned() {
    // GIVEN: 5001-5004 occupied
    let occupied = [5001, 5002, 5003, 5004];
    let probe = |port: u16| !occupied.contains(&port);

    // WHEN
    let port = acquire_port_with(&probe, 5001, 5100).expect("5005 is free");

    // THEN
    assert!(!occupied.contains(&port));
    assert_eq!(port, 5005, "First free port in ascending order");
}

/// **VALUE**: With a single free port the result is fully determined.
///
/// **BUG THIS CATCHES**: Would catch non-sequential probing (random or descending).
#[test]
fn given_only_5042_free_when_acquiring_then_returns_5042() {
    // GIVEN: Only 5042 free
    let probe = |port: u16| port == 5042;

    // WHEN / THEN
    assert_eq!(acquire_port_with(&probe, 5001, 5100).unwrap(), 5042);
}

/// **VALUE**: Probing is strictly ascending and stops at the first hit.
///
/// **BUG THIS CATCHES**: Would catch probing past the winner, which costs a bind
/// per remaining port during startup.
#[test]
fn given_free_port_when_acquiring_then_stops_probing_after_it() {
    // GIVEN: A probe that records every call
    let probed = RefCell::new(Vec::new());
    let probe = |port: u16| {
        probed.borrow_mut().push(port);
        port >= 5003
    };

    // WHEN
    let port = acquire_port_with(&probe, 5001, 5100).unwrap();

    // THEN
    assert_eq!(port, 5003);
    assert_eq!(*probed.borrow(), vec![5001, 5002, 5003]);
}

/// **VALUE**: A full range is the fatal `NoPortAvailable` startup error.
///
/// **BUG THIS CATCHES**: Would catch an inclusive upper bound (probing 5100) or a
/// silent fallback port.
#[test]
fn given_every_port_occupied_when_acquiring_then_no_port_available() {
    // GIVEN: Nothing free; record the highest port probed
    let highest = RefCell::new(0u16);
    let probe = |port: u16| {
        *highest.borrow_mut() = port;
        false
    };

    // WHEN
    let result = acquire_port_with(&probe, 5001, 5100);

    // THEN
    match result {
        Err(PortError::NoPortAvailable { start, end, .. }) => {
            assert_eq!((start, end), (5001, 5100));
        }
        other => panic!("Expected NoPortAvailable, got {other:?}"),
    }
    assert_eq!(*highest.borrow(), 5099, "End bound is exclusive");
}

#[test]
fn given_empty_range_when_acquiring_then_invalid_range() {
    let result = acquire_port_with(&|_: u16| true, 5100, 5100);

    assert!(matches!(result, Err(PortError::InvalidRange { .. })));
}

#[test]
fn given_privileged_start_when_acquiring_then_invalid_range() {
    let result = acquire_port_with(&|_: u16| true, 80, 5100);

    match result {
        Err(PortError::InvalidRange { message, .. }) => assert!(message.contains("80")),
        other => panic!("Expected InvalidRange, got {other:?}"),
    }
}

/// **VALUE**: The real probe checks both loopbacks the window might resolve
/// `localhost` to.
#[test]
fn given_default_tcp_probe_when_inspected_then_covers_both_loopbacks() {
    let probe = TcpPortProbe::default();

    assert_eq!(
        probe.hosts(),
        &[
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(Ipv6Addr::LOCALHOST)
        ]
    );
}

/// **VALUE**: Machines without IPv6 still get ports.
///
/// **BUG THIS CATCHES**: Would catch treating "no such address" as "occupied",
/// which makes every port unavailable when `::1` does not exist.
#[test]
fn given_missing_address_errors_when_classifying_then_host_skipped() {
    assert!(host_missing(ErrorKind::AddrNotAvailable));
    assert!(host_missing(ErrorKind::Unsupported));
    assert!(!host_missing(ErrorKind::AddrInUse));
    assert!(!host_missing(ErrorKind::PermissionDenied));
}
