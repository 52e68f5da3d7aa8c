//! Free-port selection for the backend.
//!
//! Ports are probed in ascending order and the first one that can be bound is
//! returned. The probing listener is dropped right away, so the port is free
//! again by the time the backend binds it (barring a race with another
//! process, which the backend surfaces as its own bind failure).

use crate::BACKEND_HOSTNAME;
use crate::error::port::PortError;

use common::ErrorLocation;
use models::MIN_BACKEND_PORT;

use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, TcpListener};
use std::panic::Location;

use log::{debug, info, trace};

/// Decides whether a single port can be handed to the backend.
pub trait PortProbe {
    fn is_available(&self, port: u16) -> bool;
}

impl<F> PortProbe for F
where
    F: Fn(u16) -> bool,
{
    fn is_available(&self, port: u16) -> bool {
        self(port)
    }
}

/// Binds a real TCP listener on every host and releases it immediately.
///
/// The default covers both loopbacks: the window loads `localhost`, which may
/// resolve to `::1`, so a port held there is not free even though the backend
/// binds `127.0.0.1`. A host the machine does not have (no IPv6) cannot hold
/// a conflicting listener and is skipped.
#[derive(Debug, Clone)]
pub struct TcpPortProbe {
    hosts: Vec<IpAddr>,
}

impl TcpPortProbe {
    pub fn new(host: IpAddr) -> Self {
        Self { hosts: vec![host] }
    }

    pub fn hosts(&self) -> &[IpAddr] {
        &self.hosts
    }
}

impl Default for TcpPortProbe {
    fn default() -> Self {
        let backend_host = BACKEND_HOSTNAME
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        Self {
            hosts: vec![backend_host, IpAddr::V6(Ipv6Addr::LOCALHOST)],
        }
    }
}

impl PortProbe for TcpPortProbe {
    fn is_available(&self, port: u16) -> bool {
        self.hosts.iter().all(|host| free_on(*host, port))
    }
}

fn free_on(host: IpAddr, port: u16) -> bool {
    match TcpListener::bind((host, port)) {
        Ok(listener) => {
            drop(listener);
            true
        }
        Err(e) if host_missing(e.kind()) => {
            trace!("Skipping {host} for port {port}: {e}");
            true
        }
        Err(e) => {
            trace!("Port {port} on {host} unavailable: {e}");
            false
        }
    }
}

/// Bind errors meaning the address itself does not exist on this machine.
pub(crate) fn host_missing(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::AddrNotAvailable | ErrorKind::Unsupported)
}

/// Return the first port in `start..end` that is free on both loopbacks.
///
/// # Errors
///
/// * [`PortError::InvalidRange`] - `start` is privileged or the range is empty
/// * [`PortError::NoPortAvailable`] - every port in the range is occupied
#[track_caller]
pub fn acquire_port(start: u16, end: u16) -> Result<u16, PortError> {
    acquire_port_with(&TcpPortProbe::default(), start, end)
}

/// [`acquire_port`] over an arbitrary probe.
#[track_caller]
pub fn acquire_port_with<P>(probe: &P, start: u16, end: u16) -> Result<u16, PortError>
where
    P: PortProbe + ?Sized,
{
    if start < MIN_BACKEND_PORT {
        return Err(PortError::InvalidRange {
            message: format!("range start {start} is below {MIN_BACKEND_PORT}"),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    if start >= end {
        return Err(PortError::InvalidRange {
            message: format!("range {start}..{end} is empty"),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    debug!("Probing ports {start}..{end}");

    for port in start..end {
        if probe.is_available(port) {
            info!("Selected port {port}");
            return Ok(port);
        }
        trace!("Port {port} is occupied");
    }

    Err(PortError::NoPortAvailable {
        start,
        end,
        location: ErrorLocation::from(Location::caller()),
    })
}
