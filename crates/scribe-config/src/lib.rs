#![allow(clippy::must_use_candidate)]

pub mod client;
pub mod defaults;
mod env;
mod loader;
pub mod telemetry;

use serde::Deserialize;

pub use client::*;
pub use defaults::*;
pub use telemetry::TelemetryConfig;

/// Top-level scribe configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Connection settings for the audio API
    #[serde(default)]
    pub client: ClientConfig,
    /// Request parameters used when the caller does not set them
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
