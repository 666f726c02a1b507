use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

/// Default upstream API base
pub const DEFAULT_API_BASE: &str = "https://ark.ap-southeast.bytepluses.com";

/// Hard ceiling on images per request, imposed by the upstream API
pub const MAX_IMAGES_LIMIT: u32 = 15;

/// Upstream image generation API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// API base URL; the generation path is appended to it
    #[serde(default = "default_api_base")]
    pub api_base: Url,
    /// Bearer token for the upstream API
    ///
    /// Optional so that the relay can start without one; requests are
    /// rejected until it is set.
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Upper bound for `images_count`
    #[serde(default = "default_max_images")]
    pub max_images: u32,
    /// Model id prefixes that support native sequential (batch) generation
    #[serde(default = "default_native_batch_prefixes")]
    pub native_batch_prefixes: Vec<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: None,
            timeout_seconds: default_timeout_seconds(),
            max_images: default_max_images(),
            native_batch_prefixes: default_native_batch_prefixes(),
        }
    }
}

impl UpstreamConfig {
    /// API base without a trailing slash, as reported by the health probe
    pub fn api_base_str(&self) -> &str {
        self.api_base.as_str().trim_end_matches('/')
    }

    /// Full URL of the image generation endpoint
    pub fn generations_url(&self) -> String {
        format!("{}/api/v3/images/generations", self.api_base_str())
    }

    /// The API key, treating an empty string as unset
    pub fn api_key(&self) -> Option<&SecretString> {
        self.api_key
            .as_ref()
            .filter(|key| !key.expose_secret().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Whether the model can produce several images from one request
    pub fn supports_native_batch(&self, model: &str) -> bool {
        self.native_batch_prefixes
            .iter()
            .any(|prefix| model.starts_with(prefix.as_str()))
    }
}

#[allow(clippy::expect_used)]
fn default_api_base() -> Url {
    Url::parse(DEFAULT_API_BASE).expect("default API base is a valid URL")
}

#[allow(clippy::missing_const_for_fn)]
fn default_timeout_seconds() -> u64 {
    120
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_images() -> u32 {
    MAX_IMAGES_LIMIT
}

fn default_native_batch_prefixes() -> Vec<String> {
    vec!["seedream-4-0".to_string()]
}
