//! Request body validation subsystem.
//!
//! # Data Flow
//! ```text
//! route table entry with params
//!     → ParamSchema (declarative field specs)
//!     → params.rs (structural checks + case normalization)
//!     → validator middleware (routing/pipeline.rs)
//! ```
//!
//! # Design Decisions
//! - Validation never mutates the schema; normalization returns new values
//!   and callers write them back
//! - Error payloads carry stable numeric codes so clients can branch
//!   without parsing messages

pub mod params;

pub use params::{
    is_valid_type, test_params, to_lowercase_if_set, to_uppercase_if_set, FieldSpec, ParamSchema,
    ParamType, ValidationError,
};
