pub mod exporters;
pub mod tracing;

use std::collections::HashMap;

use serde::Deserialize;

use self::{exporters::ExporterConfig, tracing::TracingConfig};

/// Telemetry configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Service name for telemetry metadata
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Additional resource attributes
    #[serde(default)]
    pub resource_attributes: HashMap<String, String>,
    /// OTLP exporter; without one only console logging is set up
    #[serde(default)]
    pub exporter: Option<ExporterConfig>,
    /// Trace sampling configuration
    #[serde(default)]
    pub tracing: TracingConfig,
}

fn default_service_name() -> String {
    "seedream-relay".to_string()
}
