use std::net::SocketAddr;

use serde::Deserialize;

use crate::{access::AccessConfig, cors::CorsConfig, health::HealthConfig};

/// Default request body limit, large enough for base64 reference images
const DEFAULT_BODY_LIMIT: usize = 30 * 1024 * 1024;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub listen_address: Option<SocketAddr>,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default = "default_cors")]
    pub cors: Option<CorsConfig>,
    #[serde(default)]
    pub access: AccessConfig,
    /// Maximum accepted request body size in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: None,
            health: HealthConfig::default(),
            cors: default_cors(),
            access: AccessConfig::default(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

#[allow(clippy::unnecessary_wraps)]
fn default_cors() -> Option<CorsConfig> {
    Some(CorsConfig::default())
}

#[allow(clippy::missing_const_for_fn)]
fn default_body_limit() -> usize {
    DEFAULT_BODY_LIMIT
}
