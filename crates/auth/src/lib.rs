//! # CellCount Auth
//!
//! User registration, password checks and bearer login sessions.
//!
//! Users live in a YAML credentials file:
//!
//! ```yaml
//! usernames:
//!   jdoe:
//!     email: jdoe@example.org
//!     first_name: Jane
//!     last_name: Doe
//!     password_hash: $2b$12$<bcrypt salt and hash>
//! ```
//!
//! Login sessions are held in memory only; restarting the process logs everyone out.

pub mod config;
pub mod credentials;
pub mod error;
pub mod password;
pub mod service;

pub use config::AuthConfig;
pub use credentials::{CredentialStore, CredentialsFile, UserEntry};
pub use error::{AuthError, AuthResult};
pub use service::{AuthService, LoginToken, RegistrationRequest};
