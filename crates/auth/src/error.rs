#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("username must be 3-32 characters of letters, digits, '_', '.' or '-'")]
    InvalidUsername,
    #[error("invalid email address: '{0}'")]
    InvalidEmail(String),
    #[error("password must be 8-20 characters with upper and lower case letters, a digit and one of @$!%*?&")]
    WeakPassword,
    #[error("username '{0}' is already taken")]
    UserExists(String),
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("session token is unknown or expired")]
    InvalidToken,
    #[error("malformed password hash")]
    MalformedHash,
    #[error("failed to hash password: {0}")]
    Hashing(String),

    #[error("failed to read credentials file: {0}")]
    CredentialsRead(std::io::Error),
    #[error("failed to write credentials file: {0}")]
    CredentialsWrite(std::io::Error),
    #[error("failed to parse credentials file: {0}")]
    CredentialsParse(serde_yaml::Error),
    #[error("failed to serialize credentials: {0}")]
    CredentialsSerialize(serde_yaml::Error),
}

impl AuthError {
    /// True for errors caused by the submitted form rather than by storage.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AuthError::MissingField(_)
                | AuthError::InvalidUsername
                | AuthError::InvalidEmail(_)
                | AuthError::WeakPassword
        )
    }
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;
