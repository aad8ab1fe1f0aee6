//! File storage collaborator.
//!
//! The system delete/download endpoints delegate here. The trait keeps the
//! storage technology pluggable; the in-tree implementation writes files
//! under a configured root directory.

pub mod storage;

pub use storage::{DiskStorage, FileError, FileStorage, StoredFile};
