use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::web::routes::{self, AppState};

/// Web server configuration
pub struct WebServerConfig {
    pub bind_addr: SocketAddr,
}

/// Web server instance
pub struct WebServer {
    config: WebServerConfig,
    state: AppState,
}

impl WebServer {
    pub fn new(config: WebServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Router with CORS and request tracing applied
    pub fn app(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        routes::create_router(self.state.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Start the web server
    pub async fn start(self) -> Result<()> {
        let app = self.app();

        println!("🌐 Web server starting on http://{}", self.config.bind_addr);
        println!("   API endpoints: http://{}/api/run, /api/requirements/sessions", self.config.bind_addr);

        let listener = tokio::net::TcpListener::bind(&self.config.bind_addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
