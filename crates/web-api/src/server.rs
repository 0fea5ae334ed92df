use crate::handlers;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tradehook_engine::OrderSequencer;

pub struct ApiServer {
    sequencer: Arc<OrderSequencer>,
}

impl ApiServer {
    #[must_use]
    pub const fn new(sequencer: Arc<OrderSequencer>) -> Self {
        Self { sequencer }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/webhook", post(handlers::webhook))
            .route("/health", get(handlers::health))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.sequencer.clone())
    }

    /// Starts the webhook server listening on the specified address.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the address or
    /// serve requests.
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("webhook server listening on {}", addr);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}
