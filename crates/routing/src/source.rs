use std::sync::Arc;

use async_trait::async_trait;

use crate::descriptor::RouteDescriptor;
use crate::error::RouteSourceError;

/// Backend collaborator returning the flat list of routes a user may see.
#[async_trait]
pub trait RouteSource: Send + Sync {
    async fn fetch_user_routes(&self, user_id: Option<&str>) -> Result<Vec<RouteDescriptor>, RouteSourceError>;
}

/// Where the registry takes its authorized list from.
#[derive(Clone)]
pub enum RouteLoad {
    /// Compiled-in list, identical for every user.
    Static(Vec<RouteDescriptor>),
    /// Fetched per session.
    Dynamic(Arc<dyn RouteSource>),
}

impl RouteLoad {
    pub fn is_dynamic(&self) -> bool {
        matches!(self, RouteLoad::Dynamic(_))
    }
}

impl core::fmt::Debug for RouteLoad {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RouteLoad::Static(list) => f.debug_tuple("Static").field(&list.len()).finish(),
            RouteLoad::Dynamic(_) => f.write_str("Dynamic"),
        }
    }
}

/// A [`RouteSource`] over a fixed list; handy for tests and offline shells.
#[derive(Debug, Clone, Default)]
pub struct StaticRouteSource {
    routes: Vec<RouteDescriptor>,
}

impl StaticRouteSource {
    pub fn new(routes: Vec<RouteDescriptor>) -> Self {
        Self { routes }
    }
}

#[async_trait]
impl RouteSource for StaticRouteSource {
    async fn fetch_user_routes(&self, _user_id: Option<&str>) -> Result<Vec<RouteDescriptor>, RouteSourceError> {
        Ok(self.routes.clone())
    }
}
