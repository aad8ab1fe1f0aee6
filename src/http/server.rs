//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum Router from the route pipeline
//! - Wire up middleware (tracing, timeout, body limit, request ID,
//!   security headers)
//! - Serve with graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::files::FileStorage;
use crate::routing::pipeline::{build_router, BuildError};
use crate::routing::HandlerRegistry;
use crate::store::StoreHandle;

/// Application state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: StoreHandle,
    pub files: Arc<dyn FileStorage>,
    pub config: Arc<AppConfig>,
}

/// HTTP server for the application shell.
#[derive(Debug)]
pub struct AppServer {
    router: Router,
    config: Arc<AppConfig>,
}

impl AppServer {
    /// Build the full router from configuration. Route table errors and a
    /// missing not-found page abort construction.
    pub fn new(
        config: Arc<AppConfig>,
        registry: &HandlerRegistry,
        store: StoreHandle,
        files: Arc<dyn FileStorage>,
    ) -> Result<Self, BuildError> {
        let state = AppState {
            store,
            files,
            config: config.clone(),
        };

        let mut router = build_router(&config, registry, state)?
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_secs,
            )))
            .layer(RequestBodyLimitLayer::new(config.server.max_body_bytes))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http());

        if config.server.security_headers {
            router = router
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::CONTENT_SECURITY_POLICY,
                    HeaderValue::from_static("default-src 'self'"),
                ));
        }

        Ok(Self { router, config })
    }

    /// The built router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the server until the shutdown broadcast fires. Interactive
    /// deployments wire Ctrl+C to the broadcast via
    /// [`Shutdown::listen_for_ctrl_c`](crate::lifecycle::Shutdown::listen_for_ctrl_c).
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("shutdown requested");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
