//! Session error taxonomy.

use thiserror::Error;

/// Failure reported by an [`crate::AuthApi`] implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthApiError {
    /// The backend answered but refused the request.
    #[error("rejected ({code}): {message}")]
    Rejected { code: i64, message: String },

    /// The presented credential or token is not (or no longer) valid.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("decode error: {0}")]
    Decode(String),
}

/// Login failed. Recovered locally and shown to the user; the previous
/// session state is left untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("login rejected: {0}")]
    Rejected(String),

    #[error("login unavailable: {0}")]
    Unavailable(String),
}

impl From<AuthApiError> for AuthError {
    fn from(value: AuthApiError) -> Self {
        match value {
            AuthApiError::Unauthorized(msg) => Self::InvalidCredentials(msg),
            AuthApiError::Rejected { code, message } => Self::Rejected(format!("{code}: {message}")),
            AuthApiError::Transport(msg) | AuthApiError::Decode(msg) => Self::Unavailable(msg),
        }
    }
}

/// The session is missing or no longer valid.
///
/// Detected at navigation or API-call time; callers redirect to login rather
/// than tearing the session down.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("session expired or missing")]
pub struct SessionExpiredError;

/// Silent token renewal failed. Logged only.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("no refresh token available")]
    NoRefreshToken,

    #[error("refresh rejected: {0}")]
    Rejected(String),

    #[error("refresh unavailable: {0}")]
    Unavailable(String),

    /// The session was replaced or cleared while the refresh was in flight.
    #[error("session changed during refresh")]
    SessionChanged,
}

impl From<AuthApiError> for RefreshError {
    fn from(value: AuthApiError) -> Self {
        match value {
            AuthApiError::Unauthorized(msg) => Self::Rejected(msg),
            AuthApiError::Rejected { code, message } => Self::Rejected(format!("{code}: {message}")),
            AuthApiError::Transport(msg) | AuthApiError::Decode(msg) => Self::Unavailable(msg),
        }
    }
}

impl From<SessionExpiredError> for RefreshError {
    fn from(_: SessionExpiredError) -> Self {
        Self::SessionChanged
    }
}
