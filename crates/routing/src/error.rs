use thiserror::Error;

use navgate_auth::SessionExpiredError;

/// Mutation of the live route graph was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("route name '{0}' is already registered")]
    DuplicateName(String),

    #[error("parent route '{0}' is not registered")]
    UnknownParent(String),
}

/// Failure reported by a [`crate::RouteSource`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteSourceError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("decode error: {0}")]
    Decode(String),
}

/// Authorized routes could not be initialized. The registry stays
/// uninitialized so the next guarded navigation retries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteInitError {
    #[error("failed to fetch authorized routes: {0}")]
    Fetch(String),

    #[error(transparent)]
    SessionExpired(#[from] SessionExpiredError),

    #[error("session changed while routes were loading")]
    SessionChanged,

    #[error("route '{name}' references missing parent '{parent}'")]
    MissingParent { name: String, parent: String },

    #[error("route parent cycle involving '{0}'")]
    Cycle(String),

    #[error("duplicate route name '{0}'")]
    DuplicateName(String),

    #[error("admin role required to register the admin area")]
    NotAdmin,

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl From<RouteSourceError> for RouteInitError {
    fn from(value: RouteSourceError) -> Self {
        match value {
            RouteSourceError::Unauthorized(_) => Self::SessionExpired(SessionExpiredError),
            other => Self::Fetch(other.to_string()),
        }
    }
}
