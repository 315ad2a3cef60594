use thiserror::Error;

use navgate_auth::AuthError;
use navgate_routing::RouteInitError;

/// A navigation did not converge.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("too many redirects while navigating to '{0}'")]
    TooManyRedirects(String),

    #[error("navigation to '{0}' was re-dispatched too many times")]
    TooManyRedispatches(String),

    #[error("no route matches '{0}'")]
    Unmatched(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PortalError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Routes(#[from] RouteInitError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),
}
