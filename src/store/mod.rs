//! Document store subsystem.
//!
//! # Data Flow
//! ```text
//! StoreConfig
//!     → connection.rs (StoreManager: bounded readiness polling)
//!     → backend.rs (DocumentBackend trait: the actual driver)
//!     → handle.rs (StoreHandle: uniform CRUD contract for handlers)
//! ```
//!
//! # Design Decisions
//! - Connection state lives in one explicitly owned StoreManager shared via
//!   Arc, not module-level globals; tests can tear it down with shutdown()
//! - Readiness polling is bounded: max_connect_attempts then ConnectTimeout
//! - Operations return typed StoreError values and never panic; handlers
//!   branch on the error instead of catching anything
//! - Invalid-looking identifiers silently become fresh ones (see id.rs);
//!   DocumentId::parse is the strict, fail-fast variant

pub mod backend;
pub mod connection;
pub mod crypto;
pub mod handle;
pub mod id;
pub mod memory;

pub use backend::{DocumentBackend, FindOptions, StoreError, UpdateOptions, UpdateReport};
pub use connection::{ConnectionState, StoreManager};
pub use handle::{stamp_document, DocumentSet, StoreHandle};
pub use id::DocumentId;
pub use memory::MemoryBackend;

/// Collection receiving one lifecycle record per successful readiness probe.
pub const START_LOG_COLLECTION: &str = "_startLog";

/// Collection the email browser endpoint reads rendered messages from.
pub const SENT_EMAILS_COLLECTION: &str = "_sentEmails";
