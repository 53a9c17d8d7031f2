//! Identifier utilities.
//!
//! CellCount uses two kinds of identifier:
//!
//! - [`CanonicalUuid`]: a random UUID in *canonical* form, **32 lowercase hexadecimal
//!   characters** without hyphens. Used for login session tokens.
//! - [`TimestampId`]: a time-prefixed identifier used as the key of every saved visit
//!   record, `YYYYMMDDTHHMMSS.mmmZ-<canonical uuid>`.
//!
//! Two saves can land in the same millisecond, so the timestamp alone does not identify
//! a record. A `TimestampId` keeps the human-readable time prefix, sorts chronologically
//! as a plain string, and is unique because of the UUID suffix.
//!
//! ## Canonical UUID form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Canonical form is *required* for externally supplied identifiers (HTTP paths, CLI
//! arguments). Non-canonical values (uppercase, hyphenated, wrong length, non-hex) are
//! rejected rather than normalised.

mod service;

pub use service::{CanonicalUuid, TimestampId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
