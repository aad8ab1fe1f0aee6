//! Canonical document identifiers.
//!
//! An identifier is exactly 24 hex characters. `coerce` accepts any input:
//! a valid candidate parses verbatim, anything else is silently replaced by
//! a freshly generated id. Callers that prefer fail-fast use `parse`.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::store::backend::StoreError;

/// A 24-hex-character document identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    /// Generate a fresh identifier from 12 random bytes.
    pub fn new() -> Self {
        let mut bytes = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// True iff `candidate` is exactly 24 hex characters.
    pub fn is_valid(candidate: &str) -> bool {
        candidate.len() == 24 && candidate.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Parse a valid candidate verbatim; otherwise generate a fresh id.
    /// Never fails. The invalid input is discarded without notice.
    pub fn coerce(candidate: &str) -> Self {
        if Self::is_valid(candidate) {
            Self(candidate.to_string())
        } else {
            Self::new()
        }
    }

    /// Strict variant of [`DocumentId::coerce`]: reject invalid candidates
    /// instead of replacing them.
    pub fn parse(candidate: &str) -> Result<Self, StoreError> {
        if Self::is_valid(candidate) {
            Ok(Self(candidate.to_string()))
        } else {
            Err(StoreError::InvalidIdentifier(candidate.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
