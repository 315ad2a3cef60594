//! `navgate-auth`: session lifecycle for the navigation core.
//!
//! Holds the current credentials, keeps them in sync with persisted storage
//! and renews them silently ahead of expiry. Decoupled from routing: the route
//! graph learns about logouts only through [`SessionListener`].

pub mod api;
pub mod error;
pub mod persisted;
pub mod refresh;
pub mod roles;
pub mod session;
pub mod store;

pub use api::AuthApi;
pub use error::{AuthApiError, AuthError, RefreshError, SessionExpiredError};
pub use persisted::SessionCell;
pub use refresh::{ArmOutcome, RefreshScheduler, SchedulerState};
pub use roles::{Role, RoleSet};
pub use session::{Credentials, LoginGrant, Session, TokenGrant};
pub use store::{SessionListener, SessionStore};
