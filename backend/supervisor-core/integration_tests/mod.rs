#[cfg(unix)]
mod backend;
mod error;
#[cfg(unix)]
mod helpers;
mod port;
#[cfg(unix)]
mod supervisor;
