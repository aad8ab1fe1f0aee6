//! plinth — configuration-driven application server shell.
//!
//! Boot sequence:
//! 1. Load and validate configuration
//! 2. Connect the document store (bounded readiness polling)
//! 3. Await the readiness probe
//! 4. Build the route pipeline from the declarative table
//! 5. Accept connections

use std::path::PathBuf;
use std::sync::Arc;

use axum::response::{IntoResponse, Json};
use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;

use plinth::config::load_config;
use plinth::files::{DiskStorage, FileStorage};
use plinth::lifecycle::Shutdown;
use plinth::observability;
use plinth::routing::HandlerRegistry;
use plinth::store::{MemoryBackend, StoreHandle, StoreManager};
use plinth::AppServer;

#[derive(Parser)]
#[command(version, about = "Configuration-driven application server shell")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "plinth.toml")]
    config: PathBuf,
}

/// Controllers every deployment gets for free; applications register
/// their own on top before the server is built.
fn base_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    registry.register_controller_fn("status", |_ctx| async move {
        Json(json!({
            "status": "operational",
            "version": env!("CARGO_PKG_VERSION"),
        }))
        .into_response()
    });

    registry.register_controller_fn("echo", |ctx| async move {
        Json(json!({
            "params": ctx.params,
            "query": ctx.query,
            "body": ctx.body,
        }))
        .into_response()
    });

    registry
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = Arc::new(load_config(&args.config)?);
    observability::logging::init(&config.observability);

    tracing::info!(
        bind_address = %config.server.bind_address,
        routes = config.routes.len(),
        store = %config.store.connection_string(),
        "configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "failed to parse metrics address"
            ),
        }
    }

    let backend = Arc::new(MemoryBackend::new());
    let manager = Arc::new(StoreManager::new(backend, config.store.clone()));
    manager.connect().await?;
    let probed = manager.await_ready().await?;
    tracing::info!(probe_ok = probed, "document store ready");

    let store = StoreHandle::new(manager.clone());
    let files: Arc<dyn FileStorage> = Arc::new(DiskStorage::create(&config.server.file_root)?);

    let registry = base_registry();
    let server = AppServer::new(config.clone(), &registry, store, files)?;

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let shutdown = Shutdown::new();
    shutdown.listen_for_ctrl_c();
    server.run(listener, shutdown.subscribe()).await?;

    manager.shutdown().await;
    tracing::info!("shutdown complete");
    Ok(())
}
