//! Initialization of logging and metrics shared by every binary plus a few
//! helpers to make the core crates observable.
pub mod config;
pub mod metrics;
pub mod tracing;

pub use config::Config;
