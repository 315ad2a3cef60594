//! Per-navigation context and guard outcomes.

use std::fmt;

use uuid::Uuid;

use navgate_routing::ResolvedRoute;

use crate::location::RouteLocation;

/// Correlates the log lines of one navigation attempt, re-dispatches
/// included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NavigationId(Uuid);

impl NavigationId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for NavigationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NavigationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Inputs of one guard evaluation. Discarded once the attempt resolves.
#[derive(Debug, Clone)]
pub struct GuardContext {
    pub id: NavigationId,
    pub to: RouteLocation,
    /// `to` matched against the route graph.
    pub route: ResolvedRoute,
    pub from: Option<RouteLocation>,
}

impl GuardContext {
    pub fn name(&self) -> &str {
        &self.route.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: RouteLocation,
    pub replace: bool,
}

impl Redirect {
    pub fn push(to: RouteLocation) -> Self {
        Self { to, replace: false }
    }

    pub fn replace(to: RouteLocation) -> Self {
        Self { to, replace: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Cancel the navigation; the current route stays.
    Block,
    Redirect(Redirect),
    /// Re-run the same target after the route graph changed underneath it.
    /// The retry takes the place of the in-flight attempt.
    Redispatch,
}
