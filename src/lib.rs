//! Command line client for the Mixer configuration service.

pub mod commands;
pub mod config;
pub mod error;
pub mod mixer;

/// Version injected at compile time via MIXERCTL_VERSION env var (set by CI/CD),
/// or the crate version for local builds.
pub const VERSION: &str = match option_env!("MIXERCTL_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};
