//! Domain service for administrator authentication.
//!
//! Only credential checks live here. Session identity is owned by the HTTP
//! layer's session store.

use serde::Serialize;
use thiserror::Error;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Never says whether the username or the password was wrong.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// User info DTO for responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub username: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials against the stored salted hash.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn login(&self, username: &str, password: &str) -> Result<UserInfo, AuthError>;

    /// Gets information for a specific user.
    async fn get_user_info(&self, username: &str) -> Result<UserInfo, AuthError>;

    /// Seeds the administrator when the users table is empty.
    /// Returns `true` when a record was created.
    async fn ensure_admin(&self, username: &str, password: &str) -> Result<bool, AuthError>;
}
