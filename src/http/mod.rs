//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, middleware layers)
//!     → routing pipeline (match + compose + dispatch)
//!     → controller response
//! ```

pub mod server;

pub use server::{AppServer, AppState};
