//! Owner of the live route graph and everything derived from it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use navgate_auth::{SessionCell, SessionListener};
use navgate_core::NavConfig;

use crate::admin::{ADMIN_ROOT_NAME, load_admin_subtree};
use crate::builtin::{APP_ROOT_NAME, app_root, builtin_routes};
use crate::descriptor::{RouteDescriptor, RouteTree};
use crate::error::{GraphError, RouteInitError};
use crate::forest::{build_forest, cache_routes};
use crate::graph::{ResolvedRoute, RouteGraph, RouteRecord};
use crate::menu::{MenuItem, MenuMode, MenuModel, admin_menus, build_menus};
use crate::source::RouteLoad;
use crate::view::{ViewFactory, ViewHandle};

/// Initialization progress of the authorized routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    NotInitialized,
    Initializing,
    Initialized,
}

/// Everything built from one authorized list, ready to be swapped in.
struct Prepared {
    descriptors: Vec<RouteDescriptor>,
    user_tree: RouteTree,
    user_menus: Vec<MenuItem>,
    cache_routes: Vec<String>,
    admin_forest: Option<Vec<RouteTree>>,
}

/// Route graph registry.
///
/// The graph always holds the built-in routes. [`init_authorized_routes`]
/// adds the user forest under `appRoot` and, for admin sessions, the admin
/// subtree; [`reset`] removes both. No other code mutates the graph.
///
/// Results of a load that straddles a login or logout are discarded: the
/// session generation is checked before anything is registered.
///
/// [`init_authorized_routes`]: RouteRegistry::init_authorized_routes
/// [`reset`]: RouteRegistry::reset
pub struct RouteRegistry {
    config: NavConfig,
    session: Arc<SessionCell>,
    load: RouteLoad,
    views: Arc<dyn ViewFactory>,
    graph: RwLock<RouteGraph>,
    state: Mutex<InitState>,
    init_lock: tokio::sync::Mutex<()>,
    attempts: AtomicU64,
    /// Error of the last attempt, with the session generation it ran under.
    last_failure: Mutex<Option<(u64, RouteInitError)>>,
    menus: RwLock<MenuModel>,
    authorized: RwLock<Vec<RouteDescriptor>>,
    cache: RwLock<Vec<String>>,
    registrations: AtomicU64,
}

impl RouteRegistry {
    pub fn new(
        config: NavConfig,
        session: Arc<SessionCell>,
        load: RouteLoad,
        views: Arc<dyn ViewFactory>,
    ) -> Result<Self, GraphError> {
        let mut graph = RouteGraph::new();
        for tree in builtin_routes() {
            graph.add_tree(None, &tree)?;
        }

        Ok(Self {
            config,
            session,
            load,
            views,
            graph: RwLock::new(graph),
            state: Mutex::new(InitState::NotInitialized),
            init_lock: tokio::sync::Mutex::new(()),
            attempts: AtomicU64::new(0),
            last_failure: Mutex::new(None),
            menus: RwLock::new(MenuModel::default()),
            authorized: RwLock::new(Vec::new()),
            cache: RwLock::new(Vec::new()),
            registrations: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionCell> {
        &self.session
    }

    pub fn init_state(&self) -> InitState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_initialized(&self) -> bool {
        self.init_state() == InitState::Initialized
    }

    /// How many times the authorized routes were registered.
    pub fn registrations(&self) -> u64 {
        self.registrations.load(Ordering::SeqCst)
    }

    /// Load, build and register the authorized routes for this session.
    ///
    /// Idempotent per session. Concurrent callers are serialized; a caller
    /// that waited on an attempt which failed under the same session gets
    /// that attempt's error instead of starting another one. An attempt made
    /// for an earlier session is never shared.
    pub async fn init_authorized_routes(&self) -> Result<(), RouteInitError> {
        if self.is_initialized() {
            return Ok(());
        }

        let observed = self.attempts.load(Ordering::SeqCst);
        let _guard = self.init_lock.lock().await;
        if self.is_initialized() {
            return Ok(());
        }
        let generation = self.session.generation();
        if self.attempts.load(Ordering::SeqCst) != observed {
            if let Some(err) = self.failure_for(generation) {
                return Err(err);
            }
        }

        self.set_state(InitState::Initializing);
        let result = self.initialize(generation).await;

        let mut last_failure = self.last_failure.lock().unwrap_or_else(PoisonError::into_inner);
        match &result {
            Ok(()) => *last_failure = None,
            Err(err) => {
                tracing::warn!(error = %err, generation, "authorized route initialization failed");
                *last_failure = Some((generation, err.clone()));
                self.set_state(InitState::NotInitialized);
            }
        }
        self.attempts.fetch_add(1, Ordering::SeqCst);
        result
    }

    /// Whether the last attempt failed under the current session.
    pub fn failed_this_session(&self) -> bool {
        self.failure_for(self.session.generation()).is_some()
    }

    fn failure_for(&self, generation: u64) -> Option<RouteInitError> {
        match &*self.last_failure.lock().unwrap_or_else(PoisonError::into_inner) {
            Some((failed_in, err)) if *failed_in == generation => Some(err.clone()),
            _ => None,
        }
    }

    async fn initialize(&self, generation: u64) -> Result<(), RouteInitError> {
        let descriptors = match &self.load {
            RouteLoad::Static(list) => list.clone(),
            RouteLoad::Dynamic(source) => {
                let user_id = self.session.snapshot().and_then(|s| s.user_id());
                source.fetch_user_routes(user_id.as_deref()).await?
            }
        };
        let prepared = self.prepare(descriptors)?;

        let mut graph = self.graph.write().unwrap_or_else(PoisonError::into_inner);
        // A login or logout while the list was loading makes it stale.
        if self.session.generation() != generation {
            return Err(RouteInitError::SessionChanged);
        }

        // Leftovers of an earlier registration.
        graph.remove(APP_ROOT_NAME);
        graph.remove(ADMIN_ROOT_NAME);

        graph.add_tree(None, &prepared.user_tree)?;
        if let Some(admin) = &prepared.admin_forest {
            for tree in admin {
                if let Err(err) = graph.add_tree(None, tree) {
                    graph.remove(APP_ROOT_NAME);
                    graph.remove(ADMIN_ROOT_NAME);
                    return Err(err.into());
                }
            }
        }

        {
            let mut menus = self.menus.write().unwrap_or_else(PoisonError::into_inner);
            menus.user = prepared.user_menus;
            menus.admin = prepared
                .admin_forest
                .as_ref()
                .and_then(|f| f.first())
                .map(admin_menus)
                .unwrap_or_default();
        }
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = prepared.cache_routes;
        *self.authorized.write().unwrap_or_else(PoisonError::into_inner) = prepared.descriptors;
        self.set_state(InitState::Initialized);
        self.registrations.fetch_add(1, Ordering::SeqCst);

        tracing::info!(
            routes = graph.len(),
            admin = prepared.admin_forest.is_some(),
            "authorized routes registered"
        );
        Ok(())
    }

    fn prepare(&self, descriptors: Vec<RouteDescriptor>) -> Result<Prepared, RouteInitError> {
        let forest = build_forest(&descriptors)?;
        let user_menus = build_menus(&forest);
        let cache_routes = cache_routes(&descriptors);
        let admin_forest = self
            .session
            .roles()
            .is_admin()
            .then(|| load_admin_subtree(&self.config.admin_base_path));

        Ok(Prepared {
            descriptors,
            user_tree: app_root(&self.config.home_path, forest),
            user_menus,
            cache_routes,
            admin_forest,
        })
    }

    /// Register the admin subtree if it is missing.
    ///
    /// Returns `Ok(true)` when it was added now, `Ok(false)` when it was
    /// already present.
    pub fn ensure_admin_subtree(&self) -> Result<bool, RouteInitError> {
        if !self.session.roles().is_admin() {
            return Err(RouteInitError::NotAdmin);
        }

        let mut graph = self.graph.write().unwrap_or_else(PoisonError::into_inner);
        if graph.has_route(ADMIN_ROOT_NAME) {
            return Ok(false);
        }

        let forest = load_admin_subtree(&self.config.admin_base_path);
        for tree in &forest {
            graph.add_tree(None, tree)?;
        }
        if let Some(root) = forest.first() {
            self.menus.write().unwrap_or_else(PoisonError::into_inner).admin = admin_menus(root);
        }
        tracing::info!(base = %self.config.admin_base_path, "admin routes registered on demand");
        Ok(true)
    }

    /// Drop every dynamically registered route and derived state. Safe to
    /// call when nothing was registered.
    pub fn reset(&self) {
        let mut graph = self.graph.write().unwrap_or_else(PoisonError::into_inner);
        let removed = graph.remove(APP_ROOT_NAME) + graph.remove(ADMIN_ROOT_NAME);

        *self.menus.write().unwrap_or_else(PoisonError::into_inner) = MenuModel::default();
        self.cache.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.authorized.write().unwrap_or_else(PoisonError::into_inner).clear();
        *self.last_failure.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.set_state(InitState::NotInitialized);

        tracing::debug!(removed, "route registry reset");
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.read_graph().has_route(name)
    }

    pub fn resolve(&self, path: &str) -> Option<ResolvedRoute> {
        self.read_graph().resolve(path)
    }

    pub fn routes(&self) -> Vec<RouteRecord> {
        self.read_graph().routes()
    }

    pub fn route_count(&self) -> usize {
        self.read_graph().len()
    }

    /// Resolve the view of a matched route, loading it on first use.
    pub fn load_view(&self, route: &ResolvedRoute) -> Option<ViewHandle> {
        route.view.get_or_load(self.views.as_ref())
    }

    pub fn set_menu_mode(&self, path: &str) {
        let mode = if self.config.is_admin_path(path) {
            MenuMode::Admin
        } else {
            MenuMode::User
        };
        self.menus.write().unwrap_or_else(PoisonError::into_inner).mode = mode;
    }

    pub fn set_active_menu(&self, key: impl Into<String>) {
        self.menus.write().unwrap_or_else(PoisonError::into_inner).active = Some(key.into());
    }

    pub fn menus(&self) -> MenuModel {
        self.menus.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn current_menus(&self) -> Vec<MenuItem> {
        self.menus.read().unwrap_or_else(PoisonError::into_inner).current().to_vec()
    }

    pub fn cache_routes(&self) -> Vec<String> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The flat list the current registration was built from.
    pub fn authorized_routes(&self) -> Vec<RouteDescriptor> {
        self.authorized.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn read_graph(&self) -> std::sync::RwLockReadGuard<'_, RouteGraph> {
        self.graph.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: InitState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

impl SessionListener for RouteRegistry {
    fn session_cleared(&self) {
        self.reset();
    }
}

impl core::fmt::Debug for RouteRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RouteRegistry")
            .field("state", &self.init_state())
            .field("routes", &self.route_count())
            .field("load", &self.load)
            .finish()
    }
}
