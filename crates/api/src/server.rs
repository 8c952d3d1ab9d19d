//! Server configuration and startup.

use crate::routes::router;
use crate::state::AppState;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Reads `HODL_API_HOST` / `HODL_API_PORT`, defaulting otherwise.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(host) = std::env::var("HODL_API_HOST") {
            config.host = host;
        }
        if let Some(port) = std::env::var("HODL_API_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
        {
            config.port = port;
        }
        config
    }
}

/// Serves the REST API.
pub struct ApiServer {
    config: ServerConfig,
}

impl ApiServer {
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Binds and serves until the process is stopped.
    ///
    /// # Errors
    /// Returns an error if the listener cannot bind or the server fails.
    pub async fn run(&self, state: AppState) -> std::io::Result<()> {
        let app = router(state)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive());

        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(addr = %addr, "API server listening");
        axum::serve(listener, app).await
    }
}
