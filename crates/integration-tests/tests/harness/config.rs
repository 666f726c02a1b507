//! Programmatic configuration builder for integration tests

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use seedream_config::{AccessConfig, BasicAuthConfig, Config, ServerConfig, UpstreamConfig};
use url::Url;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a builder pointed at the given mock upstream, with an API key
    pub fn new(api_base: &str) -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    ..ServerConfig::default()
                },
                upstream: UpstreamConfig {
                    api_base: Url::parse(api_base).expect("valid URL"),
                    api_key: Some(SecretString::from("test-key")),
                    ..UpstreamConfig::default()
                },
                telemetry: None,
            },
        }
    }

    /// Remove the upstream API key
    pub fn without_api_key(mut self) -> Self {
        self.config.upstream.api_key = None;
        self
    }

    /// Lower the per-call timeout
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.config.upstream.timeout_seconds = seconds;
        self
    }

    /// Lower the request body limit
    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.config.server.body_limit = bytes;
        self
    }

    /// Restrict access to the given client addresses
    pub fn with_allow_ips(mut self, ips: &[&str]) -> Self {
        self.config.server.access.allow_ips = ips
            .iter()
            .map(|ip| ip.parse::<IpAddr>().expect("valid IP"))
            .collect();
        self
    }

    /// Require HTTP Basic credentials
    pub fn with_basic_auth(mut self, username: &str, password: &str) -> Self {
        self.config.server.access = AccessConfig {
            basic_auth: Some(BasicAuthConfig {
                username: username.to_owned(),
                password: SecretString::from(password),
            }),
            ..self.config.server.access
        };
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
