pub mod utilities;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account locked, retry after {retry_after_seconds} seconds")]
    AccountLocked { retry_after_seconds: i64 },

    /// The failure store could not be consulted, so the attempt is refused.
    #[error("Login failure store unavailable: {0}")]
    StoreUnavailable(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown policy: {0}")]
    UnknownPolicy(String),

    #[error("Duplicate policy: {0}")]
    DuplicatePolicy(String),

    #[error("Invalid policy {name}: {reason}")]
    InvalidPolicy { name: String, reason: String },

    #[error("Invalid lockout policy: {0}")]
    InvalidLockoutPolicy(String),

    #[error("Missing setting: {0}")]
    MissingSetting(String),

    #[error("Failed to load settings: {0}")]
    Load(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Account key must not be empty")]
    EmptyAccountKey,
}

impl Error {
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    /// True for `AccountLocked` and `StoreUnavailable`, the two ways a login is refused
    /// before credentials are looked at.
    pub fn is_lockout_error(&self) -> bool {
        matches!(
            self,
            Error::Auth(AuthError::AccountLocked { .. }) | Error::Auth(AuthError::StoreUnavailable(_))
        )
    }

    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
