//! `Authorization: Bearer <token>` parsing.

use cellcount_uuid::CanonicalUuid;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BearerError {
    #[error("missing Authorization header")]
    Missing,
    #[error("Authorization header must use the Bearer scheme")]
    WrongScheme,
    #[error("malformed bearer token")]
    Malformed,
}

/// Extract the session token from an `Authorization` header value.
///
/// Tokens are canonical UUIDs (32 lowercase hex characters).
pub fn parse_bearer(header: Option<&str>) -> Result<CanonicalUuid, BearerError> {
    let header = header.ok_or(BearerError::Missing)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(BearerError::WrongScheme)?
        .trim();
    CanonicalUuid::parse(token).map_err(|_| BearerError::Malformed)
}
