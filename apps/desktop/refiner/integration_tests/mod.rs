mod config;
#[cfg(unix)]
mod startup;
