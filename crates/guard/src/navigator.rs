//! Runs navigations through the guard pipeline, one at a time.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::Instrument;

use navgate_routing::view::ViewHandle;
use navgate_routing::{RouteMeta, RouteRegistry};

use crate::decision::{GuardContext, GuardDecision, NavigationId};
use crate::error::NavigationError;
use crate::location::RouteLocation;
use crate::pipeline::GuardPipeline;

/// Upper bound on redirects (guard and route-record) per attempt.
pub const MAX_REDIRECTS: usize = 8;
/// Upper bound on re-dispatches per attempt: one for lazy initialization,
/// one for admin self-healing.
pub const MAX_REDISPATCHES: usize = 2;

/// The route the app is showing.
#[derive(Debug, Clone)]
pub struct CurrentRoute {
    pub location: RouteLocation,
    pub name: String,
    pub params: BTreeMap<String, String>,
    pub meta: RouteMeta,
    pub view: Option<ViewHandle>,
}

#[derive(Debug, Clone)]
pub enum NavigationOutcome {
    Completed(CurrentRoute),
    /// Cancelled by a guard; the previous route stays current.
    Blocked,
}

impl NavigationOutcome {
    pub fn route(&self) -> Option<&CurrentRoute> {
        match self {
            NavigationOutcome::Completed(route) => Some(route),
            NavigationOutcome::Blocked => None,
        }
    }

    /// Full path of the route that was landed on.
    pub fn full_path(&self) -> Option<String> {
        self.route().map(|r| r.location.full_path())
    }
}

#[derive(Debug, Default)]
struct History {
    entries: Vec<String>,
}

pub struct Navigator {
    pipeline: GuardPipeline,
    registry: Arc<RouteRegistry>,
    current: RwLock<Option<CurrentRoute>>,
    history: RwLock<History>,
    serial: tokio::sync::Mutex<()>,
}

impl Navigator {
    pub fn new(pipeline: GuardPipeline) -> Self {
        Self {
            registry: pipeline.registry().clone(),
            pipeline,
            current: RwLock::new(None),
            history: RwLock::new(History::default()),
            serial: tokio::sync::Mutex::new(()),
        }
    }

    pub fn current(&self) -> Option<CurrentRoute> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Full paths visited, oldest first. Replacing navigations overwrite the
    /// last entry.
    pub fn history(&self) -> Vec<String> {
        self.history.read().unwrap_or_else(PoisonError::into_inner).entries.clone()
    }

    pub async fn push(&self, target: impl Into<RouteLocation>) -> Result<NavigationOutcome, NavigationError> {
        self.navigate(target.into(), false).await
    }

    pub async fn replace(&self, target: impl Into<RouteLocation>) -> Result<NavigationOutcome, NavigationError> {
        self.navigate(target.into(), true).await
    }

    async fn navigate(&self, target: RouteLocation, replace: bool) -> Result<NavigationOutcome, NavigationError> {
        let id = NavigationId::new();
        let span = tracing::debug_span!("navigation", %id, target = %target.full_path());
        async move {
            // Attempts run to completion, re-dispatches included, before the
            // next one starts.
            let _serial = self.serial.lock().await;
            self.run(id, target, replace).await
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        id: NavigationId,
        mut location: RouteLocation,
        mut replace: bool,
    ) -> Result<NavigationOutcome, NavigationError> {
        let original = location.full_path();
        let mut redirects = 0;
        let mut redispatches = 0;

        loop {
            let mut route = self
                .registry
                .resolve(&location.path)
                .ok_or_else(|| NavigationError::Unmatched(location.full_path()))?;

            while let Some(redirect) = route.redirect.clone() {
                redirects += 1;
                if redirects > MAX_REDIRECTS {
                    return Err(NavigationError::TooManyRedirects(original));
                }
                tracing::debug!(from = %location.path, to = %redirect, "route record redirect");
                location = RouteLocation::parse(&redirect);
                route = self
                    .registry
                    .resolve(&location.path)
                    .ok_or_else(|| NavigationError::Unmatched(location.full_path()))?;
            }

            let ctx = GuardContext {
                id,
                to: location.clone(),
                route,
                from: self.current().map(|c| c.location),
            };

            let decision = self.pipeline.before_each(&ctx).await;
            tracing::debug!(?decision, route = %ctx.route.name, "guard decision");

            match decision {
                GuardDecision::Allow => {
                    self.pipeline.before_resolve(&ctx);
                    let landed = self.commit(&ctx, replace);
                    let view = self.pipeline.after_each(&ctx);
                    let landed = CurrentRoute { view, ..landed };
                    *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(landed.clone());
                    return Ok(NavigationOutcome::Completed(landed));
                }
                GuardDecision::Block => {
                    self.pipeline.aborted();
                    return Ok(NavigationOutcome::Blocked);
                }
                GuardDecision::Redirect(redirect) => {
                    redirects += 1;
                    if redirects > MAX_REDIRECTS {
                        self.pipeline.aborted();
                        return Err(NavigationError::TooManyRedirects(original));
                    }
                    location = redirect.to;
                    replace = redirect.replace;
                }
                GuardDecision::Redispatch => {
                    redispatches += 1;
                    if redispatches > MAX_REDISPATCHES {
                        self.pipeline.aborted();
                        return Err(NavigationError::TooManyRedispatches(original));
                    }
                }
            }
        }
    }

    fn commit(&self, ctx: &GuardContext, replace: bool) -> CurrentRoute {
        let full = ctx.to.full_path();
        {
            let mut history = self.history.write().unwrap_or_else(PoisonError::into_inner);
            if replace && !history.entries.is_empty() {
                history.entries.pop();
            }
            history.entries.push(full);
        }

        CurrentRoute {
            location: ctx.to.clone(),
            name: ctx.route.name.clone(),
            params: ctx.route.params.clone(),
            meta: ctx.route.meta.clone(),
            view: None,
        }
    }
}

impl core::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Navigator")
            .field("current", &self.current().map(|c| c.location.full_path()))
            .finish_non_exhaustive()
    }
}
