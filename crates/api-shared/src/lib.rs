//! # API Shared
//!
//! Shared definitions for the CellCount HTTP API.
//!
//! Contains:
//! - JSON request/response types with OpenAPI schemas (`dto` module)
//! - Shared services like `HealthService`
//! - Bearer token parsing
//!
//! Used by `api-rest` and by clients that want typed responses.

pub mod auth;
pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
