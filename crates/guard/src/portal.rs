//! Wires session, registry, tabs and navigator into one application object.

use std::sync::Arc;

use navgate_auth::{AuthApi, Credentials, RefreshScheduler, SessionCell, SessionStore};
use navgate_core::{Clock, KeyValueStore, NavConfig};
use navgate_routing::{GraphError, RouteLoad, RouteRegistry, ViewFactory};

use crate::error::PortalError;
use crate::navigator::{NavigationOutcome, Navigator};
use crate::pipeline::GuardPipeline;
use crate::signals::Signals;
use crate::tabs::TabStore;

/// Collaborators a [`Portal`] is built from.
pub struct PortalParts {
    pub config: NavConfig,
    pub store: Arc<dyn KeyValueStore>,
    pub api: Arc<dyn AuthApi>,
    pub routes: RouteLoad,
    pub views: Arc<dyn ViewFactory>,
    pub signals: Arc<dyn Signals>,
    pub clock: Arc<dyn Clock>,
}

pub struct Portal {
    config: NavConfig,
    sessions: Arc<SessionStore>,
    registry: Arc<RouteRegistry>,
    tabs: Arc<TabStore>,
    navigator: Navigator,
    signals: Arc<dyn Signals>,
}

impl Portal {
    /// Build the application state, restoring any persisted session.
    pub fn new(parts: PortalParts) -> Result<Self, GraphError> {
        let PortalParts {
            config,
            store,
            api,
            routes,
            views,
            signals,
            clock,
        } = parts;

        let cell = Arc::new(SessionCell::restore(store));
        let scheduler = RefreshScheduler::new(&config, cell.clone(), api.clone(), clock);
        let sessions = Arc::new(SessionStore::new(cell.clone(), api, scheduler));
        let registry = Arc::new(RouteRegistry::new(config.clone(), cell.clone(), routes, views)?);
        let tabs = Arc::new(TabStore::new());

        sessions.add_listener(registry.clone());
        sessions.add_listener(tabs.clone());

        let pipeline = GuardPipeline::new(cell, registry.clone(), tabs.clone(), signals.clone());
        Ok(Self {
            config,
            sessions,
            registry,
            tabs,
            navigator: Navigator::new(pipeline),
            signals,
        })
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn registry(&self) -> &Arc<RouteRegistry> {
        &self.registry
    }

    pub fn tabs(&self) -> &Arc<TabStore> {
        &self.tabs
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Start-up hook: re-arm silent refresh for a restored session.
    pub fn resume(&self) {
        self.sessions.resume();
    }

    /// Log in, register the user's routes, then go to the page the login
    /// screen was asked to return to.
    ///
    /// A rejected login is shown to the user and leaves every piece of state
    /// as it was.
    pub async fn login(&self, credentials: &Credentials) -> Result<NavigationOutcome, PortalError> {
        let session = match self.sessions.login(credentials).await {
            Ok(session) => session,
            Err(err) => {
                self.signals.notify_error(&err.to_string());
                return Err(err.into());
            }
        };

        // Routes registered before this login (an anonymous visit, a previous
        // user) do not carry this session's grants.
        self.registry.reset();
        if let Err(err) = self.registry.init_authorized_routes().await {
            self.signals.notify_error(&format!("Failed to load routes: {err}"));
            return Err(err.into());
        }

        let redirect = self
            .navigator
            .current()
            .and_then(|c| c.location.query("redirect").map(str::to_string))
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "/".to_string());
        let target = if redirect == "/" && session.is_admin() {
            self.config.admin_base_path.clone()
        } else {
            redirect
        };

        Ok(self.navigator.push(target).await?)
    }

    /// Drop the session and everything derived from it, then go home.
    pub async fn logout(&self) -> Result<NavigationOutcome, PortalError> {
        self.sessions.logout();
        Ok(self.navigator.push("/").await?)
    }
}

impl core::fmt::Debug for Portal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Portal")
            .field("logged_in", &self.sessions.is_logged_in())
            .field("registry", &self.registry)
            .field("navigator", &self.navigator)
            .finish_non_exhaustive()
    }
}
