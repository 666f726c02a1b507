use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::{Engine, prelude::BASE64_STANDARD};
use http::{HeaderValue, StatusCode, header};
use seedream_config::{AccessConfig, BasicAuthConfig};

const BASIC_CHALLENGE: &str = r#"Basic realm="Protected""#;

/// Restrict access by client IP and HTTP Basic credentials
///
/// The allowlist is checked first; the credential check only runs when a
/// username and password are configured.
pub async fn access_middleware(config: Arc<AccessConfig>, request: Request, next: Next) -> Response {
    if !config.allow_ips.is_empty() {
        let client_ip = client_ip(&request);

        if !client_ip.is_some_and(|ip| config.allow_ips.contains(&ip)) {
            tracing::warn!(client_ip = ?client_ip, "request from address outside the allowlist");
            return (StatusCode::FORBIDDEN, "Forbidden").into_response();
        }
    }

    if let Some(ref basic) = config.basic_auth {
        let authorization = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Basic "));

        let Some(encoded) = authorization else {
            return challenge("Auth required");
        };

        if !credentials_match(basic, encoded) {
            tracing::warn!("basic auth rejected");
            return challenge("Invalid credentials");
        }
    }

    next.run(request).await
}

/// Resolve the client address, preferring proxy headers over the peer
fn client_ip(request: &Request) -> Option<IpAddr> {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next());

    let real_ip = || {
        request
            .headers()
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
    };

    if let Some(raw) = forwarded.or_else(real_ip) {
        return raw.trim().parse::<IpAddr>().ok().map(|ip| ip.to_canonical());
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_canonical())
}

fn credentials_match(config: &BasicAuthConfig, encoded: &str) -> bool {
    let Ok(decoded) = BASE64_STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let decoded = String::from_utf8_lossy(&decoded);

    decoded
        .split_once(':')
        .is_some_and(|(username, password)| config.matches(username, password))
}

fn challenge(message: &'static str) -> Response {
    let mut response = (StatusCode::UNAUTHORIZED, message).into_response();
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(BASIC_CHALLENGE));
    response
}
