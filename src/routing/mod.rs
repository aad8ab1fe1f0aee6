//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route table (config)
//!     → registry.rs (resolve controller/middleware names)
//!     → pipeline.rs (compose validator + middlewares + controller,
//!                    register with axum, install 404 fallback)
//!     → system.rs (fixed endpoints under the reserved /_ prefix)
//! ```
//!
//! # Design Decisions
//! - Names resolve against a registry at startup; an unknown name is a
//!   fatal build error, never a runtime lookup
//! - Registration is strictly sequential and completes before the server
//!   accepts requests
//! - First failure during the build aborts startup; nothing is served
//!   from a partially built table

pub mod pipeline;
pub mod registry;
pub mod system;

pub use pipeline::{build_router, BuildError, RequestContext};
pub use registry::{Controller, HandlerRegistry, Middleware};
pub use system::RESERVED_PREFIX;
