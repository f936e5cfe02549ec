use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Event error: {0}")]
    Event(#[from] EventError),

    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is locked")]
    AccountLocked {
        /// Seconds until the lockout expires.
        retry_after_seconds: i64,
    },

    #[error("Rate limit exceeded")]
    RateLimited {
        /// Seconds until the current window rolls over.
        retry_after_seconds: i64,
    },

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Invalid access token: {0}")]
    InvalidAccessToken(String),

    #[error("Invalid one-time code")]
    InvalidTotpCode,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Record not found")]
    NotFound,
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Weak password: {0}")]
    WeakPassword(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event log error: {0}")]
    LogError(String),
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("JWT signing failed: {0}")]
    JwtSigning(String),

    #[error("JWT verification failed: {0}")]
    JwtVerification(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),
}

impl Error {
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    pub fn is_crypto_error(&self) -> bool {
        matches!(self, Error::Crypto(_))
    }

    /// Seconds the caller should wait before retrying, if this failure
    /// discloses retry timing. Lockout and rate-limit denials are the only
    /// errors that do.
    pub fn retry_after_seconds(&self) -> Option<i64> {
        match self {
            Error::Auth(AuthError::AccountLocked {
                retry_after_seconds,
            })
            | Error::Auth(AuthError::RateLimited {
                retry_after_seconds,
            }) => Some(*retry_after_seconds),
            _ => None,
        }
    }
}
