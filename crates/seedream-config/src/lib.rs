#![allow(clippy::must_use_candidate)]

pub mod access;
pub mod cors;
mod env;
pub mod health;
mod loader;
pub mod server;
pub mod telemetry;
pub mod upstream;

use serde::Deserialize;

pub use access::*;
pub use cors::*;
pub use health::*;
pub use server::*;
pub use telemetry::TelemetryConfig;
pub use upstream::*;

/// Top-level relay configuration
///
/// Built once at startup and handed to the server by value; nothing reads
/// process environment after this point.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream image generation API
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
