//! Configuration-driven application server shell.
//!
//! Wires an axum HTTP layer to a document-oriented store behind a backend
//! trait, builds live routes with composed validation/middleware chains from
//! a declarative table, and reserves the `/_` path namespace for fixed
//! system endpoints.

pub mod config;
pub mod files;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod store;
pub mod validate;

pub use config::AppConfig;
pub use http::{AppServer, AppState};
pub use lifecycle::Shutdown;
pub use routing::HandlerRegistry;
pub use store::{DocumentId, StoreError, StoreHandle, StoreManager};
