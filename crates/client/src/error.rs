use thiserror::Error;

use navgate_auth::AuthApiError;
use navgate_core::{ConfigError, StorageError};
use navgate_routing::{GraphError, RouteSourceError};

/// Failure talking to the backend.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx HTTP status.
    #[error("http status {status}: {body}")]
    Status { status: u16, body: String },

    /// HTTP 401, or an envelope carrying code 401.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The envelope decoded but its code is not 200.
    #[error("api error ({code}): {message}")]
    Api { code: i64, message: String },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("admin role required")]
    AdminRequired,
}

impl From<HttpError> for AuthApiError {
    fn from(value: HttpError) -> Self {
        match value {
            HttpError::Unauthorized(msg) => AuthApiError::Unauthorized(msg),
            HttpError::AdminRequired => AuthApiError::Unauthorized(value.to_string()),
            HttpError::Api { code, message } => AuthApiError::Rejected { code, message },
            HttpError::Status { status, body } => AuthApiError::Rejected {
                code: i64::from(status),
                message: body,
            },
            HttpError::Transport(e) => AuthApiError::Transport(e.to_string()),
            HttpError::Decode(e) => AuthApiError::Decode(e.to_string()),
        }
    }
}

impl From<HttpError> for RouteSourceError {
    fn from(value: HttpError) -> Self {
        match value {
            HttpError::Unauthorized(msg) => RouteSourceError::Unauthorized(msg),
            HttpError::Decode(e) => RouteSourceError::Decode(e.to_string()),
            other => RouteSourceError::Transport(other.to_string()),
        }
    }
}

/// The shell could not be assembled.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no data directory available for the session file; set NAVGATE_SESSION_FILE")]
    NoDataDir,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("failed to read route file {path}: {message}")]
    RouteFile { path: String, message: String },
}
