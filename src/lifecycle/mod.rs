//! Lifecycle coordination: startup ordering and graceful shutdown.
//!
//! Startup order is fixed: load config → connect the store → await
//! readiness → build routes → accept connections. The shutdown
//! coordinator lets the server and background tasks stop cleanly.

pub mod shutdown;

pub use shutdown::Shutdown;
