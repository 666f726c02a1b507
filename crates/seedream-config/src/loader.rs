use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use anyhow::Context;
use secrecy::SecretString;
use url::Url;

use crate::{BasicAuthConfig, Config, MAX_IMAGES_LIMIT, ServerConfig, UpstreamConfig};

/// Port used when neither the config nor `PORT` names one
const DEFAULT_PORT: u16 = 3000;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).context("failed to parse config")?;

        config.validate()?;

        Ok(config)
    }

    /// Build configuration from the plain environment variables
    ///
    /// Used when no config file is present. Recognizes `PORT`,
    /// `ARK_API_KEY`, `API_BASE`, `APP_USERNAME`, `APP_PASSWORD`, and the
    /// comma-separated `ALLOW_IPS`.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an unparseable value or the
    /// result fails validation
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match non_empty_var("PORT") {
            Some(port) => port.parse::<u16>().with_context(|| format!("invalid PORT `{port}`"))?,
            None => DEFAULT_PORT,
        };

        let mut upstream = UpstreamConfig::default();
        if let Some(base) = non_empty_var("API_BASE") {
            upstream.api_base = Url::parse(&base).with_context(|| format!("invalid API_BASE `{base}`"))?;
        }
        upstream.api_key = non_empty_var("ARK_API_KEY").map(SecretString::from);

        let mut server = ServerConfig {
            listen_address: Some(SocketAddr::from(([0, 0, 0, 0], port))),
            ..ServerConfig::default()
        };

        if let Some(ips) = non_empty_var("ALLOW_IPS") {
            server.access.allow_ips = parse_ip_list(&ips)?;
        }

        // Basic auth only kicks in when both halves are present
        if let (Some(username), Some(password)) = (non_empty_var("APP_USERNAME"), non_empty_var("APP_PASSWORD")) {
            server.access.basic_auth = Some(BasicAuthConfig {
                username,
                password: SecretString::from(password),
            });
        }

        let config = Self {
            server,
            upstream,
            telemetry: None,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if upstream limits are out of range or the
    /// health path is malformed
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_upstream()?;
        self.validate_server()?;
        Ok(())
    }

    fn validate_upstream(&self) -> anyhow::Result<()> {
        let upstream = &self.upstream;

        if upstream.timeout_seconds == 0 {
            anyhow::bail!("upstream.timeout_seconds must be greater than 0");
        }

        if upstream.max_images == 0 || upstream.max_images > MAX_IMAGES_LIMIT {
            anyhow::bail!("upstream.max_images must be between 1 and {MAX_IMAGES_LIMIT}");
        }

        if !matches!(upstream.api_base.scheme(), "http" | "https") {
            anyhow::bail!("upstream.api_base must be an http(s) URL");
        }

        Ok(())
    }

    fn validate_server(&self) -> anyhow::Result<()> {
        let health = &self.server.health;

        if health.enabled && !health.path.starts_with('/') {
            anyhow::bail!("server.health.path must start with '/'");
        }

        if let Some(ref basic) = self.server.access.basic_auth
            && basic.username.is_empty()
        {
            anyhow::bail!("server.access.basic_auth.username must not be empty");
        }

        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_ip_list(raw: &str) -> anyhow::Result<Vec<IpAddr>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .parse::<IpAddr>()
                .with_context(|| format!("invalid address in ALLOW_IPS: `{entry}`"))
        })
        .collect()
}
