// Library exports for testing
// The binary (main.rs) imports these as well

pub mod error;
pub mod logger;
pub mod navigation;
pub mod runtime;
pub mod startup;
pub mod window;

#[cfg(test)]
mod tests;
