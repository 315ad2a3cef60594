//! `navgate-client`: concrete collaborators for the navigation core.
//!
//! A reqwest backend ([`HttpApi`]), the lazily built admin API, a JSON file
//! store for the session and the wiring that turns configuration into a
//! running [`navgate_guard::Portal`].

pub mod admin_api;
pub mod app;
pub mod config;
pub mod error;
pub mod file_store;
pub mod http;

pub use admin_api::{AdminSurface, LazyAdminApi, LogQuery, UserQuery};
pub use app::{App, default_routes, load_routes_file};
pub use config::ClientConfig;
pub use error::{AppError, HttpError};
pub use file_store::{FileStore, default_session_path};
pub use http::HttpApi;
