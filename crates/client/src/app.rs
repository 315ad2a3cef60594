//! Process wiring: config, persistence, backend and the portal.

use std::path::Path;
use std::sync::Arc;

use navgate_core::{KeyValueStore, RouteLoadMode, SystemClock};
use navgate_guard::{Portal, PortalParts, Signals, TracingSignals};
use navgate_routing::{NamedViews, RouteDescriptor, RouteLoad, RouteMeta};

use crate::admin_api::LazyAdminApi;
use crate::config::ClientConfig;
use crate::error::AppError;
use crate::file_store::FileStore;
use crate::http::HttpApi;

pub struct App {
    portal: Portal,
    api: Arc<HttpApi>,
    admin: LazyAdminApi,
}

impl App {
    /// Build the app from configuration, persisting the session to
    /// `config.session_file`.
    pub fn build(config: ClientConfig) -> Result<Self, AppError> {
        let store = Arc::new(FileStore::open(&config.session_file)?);
        Self::assemble(config, store, Arc::new(TracingSignals))
    }

    pub fn assemble(
        config: ClientConfig,
        store: Arc<dyn KeyValueStore>,
        signals: Arc<dyn Signals>,
    ) -> Result<Self, AppError> {
        let api = Arc::new(HttpApi::new(&config.api_url)?);

        let routes = match config.nav.route_load_mode {
            RouteLoadMode::Dynamic => RouteLoad::Dynamic(api.clone()),
            RouteLoadMode::Static => match &config.routes_file {
                Some(path) => RouteLoad::Static(load_routes_file(path)?),
                None => RouteLoad::Static(default_routes()),
            },
        };
        tracing::info!(api = %config.api_url, routes = ?routes, "assembling portal");

        let portal = Portal::new(PortalParts {
            config: config.nav.clone(),
            store,
            api: api.clone(),
            routes,
            views: Arc::new(NamedViews),
            signals,
            clock: Arc::new(SystemClock),
        })?;
        api.bind_session(portal.sessions().cell().clone());

        let admin = LazyAdminApi::new(api.clone(), config.nav.admin_base_path.clone());
        Ok(Self { portal, api, admin })
    }

    pub fn portal(&self) -> &Portal {
        &self.portal
    }

    pub fn api(&self) -> &Arc<HttpApi> {
        &self.api
    }

    pub fn admin(&self) -> &LazyAdminApi {
        &self.admin
    }
}

impl core::fmt::Debug for App {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("App")
            .field("portal", &self.portal)
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}

/// Read a JSON array of route descriptors.
pub fn load_routes_file(path: &Path) -> Result<Vec<RouteDescriptor>, AppError> {
    let error = |message: String| AppError::RouteFile {
        path: path.display().to_string(),
        message,
    };
    let bytes = std::fs::read(path).map_err(|e| error(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| error(e.to_string()))
}

/// Compiled-in route list for static mode.
pub fn default_routes() -> Vec<RouteDescriptor> {
    fn meta(title: &str, icon: &str) -> RouteMeta {
        RouteMeta {
            title: Some(title.to_string()),
            icon: Some(icon.to_string()),
            ..RouteMeta::default()
        }
    }

    vec![
        RouteDescriptor::new("/dashboard", "dashboard")
            .with_component("views/dashboard")
            .with_meta(RouteMeta {
                order: Some(0),
                ..meta("route.dashboard", "icon-park-outline:analysis")
            }),
        RouteDescriptor::new("/userCenter", "userCenter")
            .with_component("views/user-center")
            .with_meta(RouteMeta {
                order: Some(10),
                ..meta("route.userCenter", "carbon:user-avatar-filled-alt")
            }),
        RouteDescriptor::new("/setting", "setting")
            .with_redirect("/setting/account")
            .with_meta(RouteMeta {
                order: Some(20),
                ..meta("route.setting", "icon-park-outline:setting-two")
            }),
        RouteDescriptor::new("/setting/account", "setting-account")
            .with_component("views/setting/account")
            .with_meta(meta("route.settingAccount", "carbon:user")),
        RouteDescriptor::new("/setting/security", "setting-security")
            .with_component("views/setting/security")
            .with_meta(RouteMeta {
                keep_alive: Some(true),
                ..meta("route.settingSecurity", "carbon:security")
            }),
        RouteDescriptor::new("/docs", "docs").with_meta(RouteMeta {
            href: Some("https://docs.navgate.dev".to_string()),
            without_tab: Some(true),
            order: Some(30),
            ..meta("route.docs", "carbon:document")
        }),
    ]
}
