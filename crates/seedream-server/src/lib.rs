mod access;
mod cors;
mod health;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use seedream_config::Config;
use tower_http::trace::TraceLayer;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream client cannot be initialized
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let imagegen_state = seedream_imagegen::build_server(&config)?;

        let mut app = Router::new();

        // Health check
        if config.server.health.enabled {
            let status = Arc::new(health::HealthStatus::from_config(&config));
            app = app.route(
                &config.server.health.path,
                axum::routing::get(health::health_handler).with_state(status),
            );
        }

        // Image generation routes
        app = app.merge(seedream_imagegen::endpoint_router().with_state(imagegen_state));

        // Apply middleware layers (innermost first)

        app = app.layer(DefaultBodyLimit::max(config.server.body_limit));

        // Private access (IP allowlist, basic auth)
        if config.server.access.is_restricted() {
            let access_config = Arc::new(config.server.access.clone());
            app = app.layer(axum::middleware::from_fn(move |req, next| {
                let config = Arc::clone(&access_config);
                async move { access::access_middleware(config, req, next).await }
            }));
        }

        // Tracing
        app = app.layer(TraceLayer::new_for_http());

        // CORS
        if let Some(ref cors_config) = config.server.cors {
            app = app.layer(cors::cors_layer(cors_config));
        }

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(
            listener,
            self.router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            tracing::info!("graceful shutdown initiated");
        })
        .await?;

        Ok(())
    }
}
