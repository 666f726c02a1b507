use std::net::IpAddr;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Private-access restrictions applied to every route
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessConfig {
    /// Client IPs allowed to reach the relay; empty allows everyone
    #[serde(default)]
    pub allow_ips: Vec<IpAddr>,
    /// HTTP Basic credentials; absent disables the check
    #[serde(default)]
    pub basic_auth: Option<BasicAuthConfig>,
}

impl AccessConfig {
    /// Whether any restriction is configured
    pub fn is_restricted(&self) -> bool {
        !self.allow_ips.is_empty() || self.basic_auth.is_some()
    }
}

/// Username and password for HTTP Basic authentication
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BasicAuthConfig {
    pub username: String,
    pub password: SecretString,
}

impl BasicAuthConfig {
    /// Compare supplied credentials against the configured pair
    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password.expose_secret() == password
    }
}
