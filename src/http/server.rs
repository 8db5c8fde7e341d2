//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router: host routes, host fallback, page middleware
//! - Wire up middleware (timeout, tracing)
//! - Start the cache sweeper alongside the listener
//! - Serve until shutdown, then drain

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::cache::CacheSweeper;
use crate::config::RouterConfig;
use crate::http::dispatcher::Dispatcher;
use crate::http::middleware::page_dispatch_middleware;
use crate::http::response::text_response;

/// Body of the host fallback, reached by forwarded requests no host route takes.
pub const FALLBACK_BODY: &str = "No handler for request";

/// HTTP server fronting the page dispatcher.
pub struct PageServer {
    router: Router,
    config: RouterConfig,
    dispatcher: Arc<Dispatcher>,
}

impl PageServer {
    pub fn new(config: RouterConfig, dispatcher: Arc<Dispatcher>) -> Self {
        let router = Self::build_router(&config, dispatcher.clone());
        Self {
            router,
            config,
            dispatcher,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RouterConfig, dispatcher: Arc<Dispatcher>) -> Router {
        Router::new()
            .route("/healthz", get(health_handler))
            .fallback(fallback_handler)
            .layer(middleware::from_fn_with_state(dispatcher, page_dispatch_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// The assembled router, e.g. for driving with `tower::ServiceExt::oneshot`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        if self.config.cache.sweep_enabled {
            let sweeper = CacheSweeper::new(self.dispatcher.caches(), self.config.cache.sweep_interval());
            tokio::spawn(sweeper.run(shutdown.resubscribe()));
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn fallback_handler() -> Response {
    text_response(StatusCode::NOT_FOUND, FALLBACK_BODY).into_response()
}
