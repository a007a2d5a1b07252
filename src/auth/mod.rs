//! Accounts, password hashing and bearer tokens.

pub mod password;
pub mod service;
pub mod token;

pub use service::{AuthService, AuthSession};
pub use token::{TokenClaims, TokenSigner};

use crate::db::DatabaseError;
use crate::mailer::MailError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Token not valid for this operation")]
    WrongPurpose,
    #[error("Invalid reset token")]
    NotResetToken,
    #[error("Invalid or expired reset token")]
    ResetTokenRejected,
    #[error("User not found")]
    UserNotFound,
    #[error("Stored password hash is malformed")]
    CorruptedHash,
    #[error("Internal auth error: {0}")]
    Internal(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Mail(#[from] MailError),
}
