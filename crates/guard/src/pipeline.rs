//! The navigation guard pipeline.
//!
//! Three hook points run per navigation: [`GuardPipeline::before_each`]
//! decides, [`GuardPipeline::before_resolve`] updates menu and tab state for
//! an allowed target, [`GuardPipeline::after_each`] handles title, progress
//! and view loading.

use std::sync::Arc;

use navgate_auth::SessionCell;
use navgate_core::NavConfig;
use navgate_routing::{RouteInitError, RouteRegistry};
use navgate_routing::builtin::{FORBIDDEN_PATH, LOGIN_NAME, LOGIN_PATH, NOT_FOUND_NAME, NOT_FOUND_PATH, is_not_found};
use navgate_routing::view::ViewHandle;

use crate::decision::{GuardContext, GuardDecision, Redirect};
use crate::location::RouteLocation;
use crate::signals::Signals;
use crate::tabs::{Tab, TabStore};

/// Login page location, carrying the return address when there is one.
pub fn login_location(redirect: Option<String>) -> RouteLocation {
    let login = RouteLocation::new(LOGIN_PATH);
    match redirect {
        Some(target) => login.with_query("redirect", target),
        None => login,
    }
}

pub struct GuardPipeline {
    config: NavConfig,
    session: Arc<SessionCell>,
    registry: Arc<RouteRegistry>,
    tabs: Arc<TabStore>,
    signals: Arc<dyn Signals>,
}

impl GuardPipeline {
    pub fn new(
        session: Arc<SessionCell>,
        registry: Arc<RouteRegistry>,
        tabs: Arc<TabStore>,
        signals: Arc<dyn Signals>,
    ) -> Self {
        Self {
            config: registry.config().clone(),
            session,
            registry,
            tabs,
            signals,
        }
    }

    pub fn registry(&self) -> &Arc<RouteRegistry> {
        &self.registry
    }

    /// Decide what happens to a navigation attempt.
    ///
    /// Never fails: every internal failure becomes a redirect or a block.
    pub async fn before_each(&self, ctx: &GuardContext) -> GuardDecision {
        let meta = &ctx.route.meta;
        let name = ctx.name();

        if let Some(href) = &meta.href {
            self.signals.open_external(href);
            return GuardDecision::Block;
        }
        if self.config.show_progress {
            self.signals.progress_start();
        }

        let logged_in = self.session.is_logged_in();
        let roles = self.session.roles();
        let is_admin = roles.is_admin();
        let is_admin_route = self.config.is_admin_path(&ctx.to.path);

        self.registry.set_menu_mode(&ctx.to.path);

        if is_admin_route && (!logged_in || !is_admin) {
            tracing::warn!(target_path = %ctx.to.path, %roles, logged_in, "admin area denied");
            return GuardDecision::Redirect(if logged_in {
                Redirect::replace(RouteLocation::new(FORBIDDEN_PATH))
            } else {
                Redirect::push(login_location(Some(ctx.to.full_path())))
            });
        }

        let bypass = name == LOGIN_NAME || meta.requires_auth == Some(false);
        if !bypass && meta.requires_auth == Some(true) && !logged_in {
            let redirect = (name != NOT_FOUND_NAME).then(|| ctx.to.full_path());
            return GuardDecision::Redirect(Redirect::push(login_location(redirect)));
        }

        if !self.registry.is_initialized() && name != LOGIN_NAME {
            return match self.registry.init_authorized_routes().await {
                Ok(()) => {
                    tracing::debug!(target_path = %ctx.to.full_path(), "routes initialized, re-dispatching");
                    GuardDecision::Redispatch
                }
                // Loaded for a session that is gone; decide again for the current one.
                Err(RouteInitError::SessionChanged) => {
                    tracing::debug!(target_path = %ctx.to.full_path(), "session changed during route init, re-dispatching");
                    GuardDecision::Redispatch
                }
                Err(err) => {
                    self.signals.notify_error(&format!("Failed to load routes: {err}"));
                    let full = ctx.to.full_path();
                    let redirect = (full != "/").then_some(full);
                    GuardDecision::Redirect(Redirect::push(login_location(redirect)))
                }
            };
        }

        if is_not_found(name) {
            return self.not_found(ctx, is_admin_route && is_admin);
        }

        // A failed initialization redirects here; leaving again would loop.
        if name == LOGIN_NAME && logged_in && !self.registry.failed_this_session() {
            let home = if is_admin {
                self.config.admin_base_path.clone()
            } else {
                self.config.home_path.clone()
            };
            return GuardDecision::Redirect(Redirect::push(RouteLocation::new(home)));
        }

        GuardDecision::Allow
    }

    /// A not-found match on an initialized graph: heal a missing admin
    /// subtree, retry a path that resolves now, or show the 404 page.
    fn not_found(&self, ctx: &GuardContext, admin_target: bool) -> GuardDecision {
        if admin_target {
            match self.registry.ensure_admin_subtree() {
                Ok(true) => return GuardDecision::Redispatch,
                Ok(false) => {
                    tracing::warn!(target_path = %ctx.to.path, "admin routes present but path still unmatched");
                }
                Err(err) => tracing::warn!(error = %err, "could not register admin routes"),
            }
        }

        if ctx.to.full_path() != NOT_FOUND_PATH {
            if let Some(resolved) = self.registry.resolve(&ctx.to.path) {
                if !is_not_found(&resolved.name) {
                    return GuardDecision::Redispatch;
                }
            }
        }

        tracing::warn!(target_path = %ctx.to.full_path(), "no route matches, showing 404");
        GuardDecision::Allow
    }

    pub fn before_resolve(&self, ctx: &GuardContext) {
        let meta = &ctx.route.meta;
        let full = ctx.to.full_path();
        self.registry
            .set_active_menu(meta.active_menu.clone().unwrap_or_else(|| full.clone()));
        if !meta.is_without_tab() {
            self.tabs.add_tab(Tab {
                name: ctx.route.name.clone(),
                path: full.clone(),
                title: meta.title.clone(),
            });
        }
        self.tabs.set_current_tab(full);
    }

    pub fn after_each(&self, ctx: &GuardContext) -> Option<ViewHandle> {
        let app = &self.config.app_title;
        let title = match &ctx.route.meta.title {
            Some(page) if !page.is_empty() => format!("{page} - {app}"),
            _ => app.clone(),
        };
        self.signals.set_title(&title);
        self.finish_progress();
        self.registry.load_view(&ctx.route)
    }

    /// The attempt ended without a route change.
    pub fn aborted(&self) {
        self.finish_progress();
    }

    fn finish_progress(&self) {
        if self.config.show_progress {
            self.signals.progress_finish();
        }
    }
}

impl core::fmt::Debug for GuardPipeline {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GuardPipeline")
            .field("admin_base_path", &self.config.admin_base_path)
            .finish_non_exhaustive()
    }
}
