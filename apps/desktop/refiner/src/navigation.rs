use crate::error::RefinerError;

use common::ErrorLocation;
use supervisor_core::UI_BASE_URL;

use std::panic::Location;

use log::warn;
use url::{Origin, Url};

/// Keeps the window on the backend's own origin.
///
/// Only `http://localhost:<port>` is allowed; a different scheme, host or
/// port is refused. `127.0.0.1` is a different origin and is refused too.
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    start_url: Url,
    origin: Origin,
}

impl NavigationGuard {
    #[track_caller]
    pub fn new(port: u16) -> Result<Self, RefinerError> {
        let raw = format!("{UI_BASE_URL}:{port}");
        let start_url = Url::parse(&raw).map_err(|e| RefinerError::Refiner {
            message: format!("Invalid UI URL {raw}: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        Ok(Self {
            origin: start_url.origin(),
            start_url,
        })
    }

    /// URL the window loads first.
    pub fn start_url(&self) -> &Url {
        &self.start_url
    }

    pub fn allows(&self, url: &Url) -> bool {
        let allowed = url.origin() == self.origin;
        if !allowed {
            warn!("Blocked navigation to {url}");
        }
        allowed
    }
}
