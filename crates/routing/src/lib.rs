//! `navgate-routing`: the live route graph and its registry.
//!
//! Route descriptors arrive as a flat list, are arranged into a forest and
//! registered into an arena-backed [`RouteGraph`]. The [`RouteRegistry`] is
//! the only writer of that graph; it also derives menus and the keep-alive
//! list, and registers the admin area for admin sessions.

pub mod admin;
pub mod builtin;
pub mod descriptor;
pub mod error;
pub mod forest;
pub mod graph;
pub mod menu;
pub mod registry;
pub mod source;
pub mod view;

pub use admin::{ADMIN_ROOT_NAME, load_admin_subtree};
pub use descriptor::{RouteDescriptor, RouteMeta, RouteTree, join_path};
pub use error::{GraphError, RouteInitError, RouteSourceError};
pub use forest::{build_forest, cache_routes};
pub use graph::{NodeId, ResolvedRoute, RouteGraph, RouteRecord};
pub use menu::{MenuItem, MenuMode, MenuModel};
pub use registry::{InitState, RouteRegistry};
pub use source::{RouteLoad, RouteSource, StaticRouteSource};
pub use view::{LazyView, NamedViews, ViewFactory, ViewHandle};
