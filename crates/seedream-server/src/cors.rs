use http::{HeaderName, Method};
use seedream_config::{AnyOrList, CorsConfig};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Build a Tower CORS layer from configuration
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins = match &config.origins {
        AnyOrList::Any => AllowOrigin::any(),
        AnyOrList::List(origins) => AllowOrigin::list(origins.iter().filter_map(|o| o.parse().ok())),
    };

    let methods = match &config.methods {
        AnyOrList::Any => AllowMethods::any(),
        AnyOrList::List(methods) => {
            AllowMethods::list(methods.iter().filter_map(|m| m.parse::<Method>().ok()))
        }
    };

    let headers = match &config.headers {
        AnyOrList::Any => AllowHeaders::any(),
        AnyOrList::List(headers) => {
            AllowHeaders::list(headers.iter().filter_map(|h| h.parse::<HeaderName>().ok()))
        }
    };

    let layer = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers);

    match config.max_age_duration() {
        Some(max_age) => layer.max_age(max_age),
        None => layer,
    }
}
