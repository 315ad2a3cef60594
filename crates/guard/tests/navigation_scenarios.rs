//! End-to-end navigation scenarios over a fully wired [`Portal`].

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use navgate_auth::{AuthApi, AuthApiError, Credentials, LoginGrant, Role, RoleSet, SchedulerState, Session, TokenGrant};
use navgate_core::{FixedClock, KeyValueStore, MemoryStore, NavConfig, keys};
use navgate_guard::{
    NavigationError, NavigationOutcome, Portal, PortalError, PortalParts, RecordingSignals, SignalEvent,
};
use navgate_routing::{NamedViews, RouteDescriptor, RouteLoad, RouteMeta, RouteSource, RouteSourceError};

const NOW: i64 = 1_700_000_000;

/// Accepts `user`/`admin` with any password.
struct ScriptedAuth {
    expires_in: Option<i64>,
    refreshes: AtomicUsize,
}

impl ScriptedAuth {
    fn new(expires_in: Option<i64>) -> Self {
        Self {
            expires_in,
            refreshes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AuthApi for ScriptedAuth {
    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, AuthApiError> {
        let role = match credentials.user_name.as_str() {
            "admin" => Role::ADMIN,
            "user" => Role::USER,
            _ => return Err(AuthApiError::Unauthorized("bad credentials".into())),
        };
        Ok(LoginGrant {
            access_token: format!("access-{}", credentials.user_name),
            refresh_token: "refresh".into(),
            expires_at: self.expires_in.map(|d| NOW + d),
            role: RoleSet::single(role),
            user_info: json!({"id": 1, "userName": credentials.user_name}),
        })
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<TokenGrant, AuthApiError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(TokenGrant {
            access_token: "access-renewed".into(),
            refresh_token: "refresh-renewed".into(),
            expires_at: Some(NOW + 3_600),
        })
    }
}

/// Route source that counts fetches and can be slowed down or broken.
struct SlowSource {
    routes: Vec<RouteDescriptor>,
    delay: Duration,
    fail: bool,
    fetches: AtomicUsize,
}

#[async_trait]
impl RouteSource for SlowSource {
    async fn fetch_user_routes(&self, _user_id: Option<&str>) -> Result<Vec<RouteDescriptor>, RouteSourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(RouteSourceError::Transport("connection reset".into()));
        }
        Ok(self.routes.clone())
    }
}

fn authorized() -> Vec<RouteDescriptor> {
    vec![
        RouteDescriptor::new("dashboard", "dashboard").with_meta(RouteMeta {
            title: Some("Dashboard".into()),
            ..RouteMeta::default()
        }),
        RouteDescriptor::new("/system", "system"),
        RouteDescriptor::new("/system/profile", "profile"),
        RouteDescriptor::new("docs", "docs").with_meta(RouteMeta {
            href: Some("https://docs.example.com".into()),
            ..RouteMeta::default()
        }),
    ]
}

struct Harness {
    portal: Portal,
    store: Arc<MemoryStore>,
    signals: Arc<RecordingSignals>,
    auth: Arc<ScriptedAuth>,
}

fn harness(config: NavConfig, routes: RouteLoad, auth: ScriptedAuth) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let signals = Arc::new(RecordingSignals::default());
    let auth = Arc::new(auth);
    let portal = Portal::new(PortalParts {
        config,
        store: store.clone(),
        api: auth.clone(),
        routes,
        views: Arc::new(NamedViews),
        signals: signals.clone(),
        clock: Arc::new(FixedClock::new(NOW)),
    })
    .unwrap();
    Harness {
        portal,
        store,
        signals,
        auth,
    }
}

fn static_harness() -> Harness {
    harness(
        NavConfig::default(),
        RouteLoad::Static(authorized()),
        ScriptedAuth::new(None),
    )
}

fn landed(outcome: &NavigationOutcome) -> String {
    outcome.full_path().expect("navigation was blocked")
}

fn route_names(portal: &Portal) -> BTreeSet<String> {
    portal.registry().routes().into_iter().map(|r| r.name).collect()
}

#[tokio::test]
async fn anonymous_users_are_sent_to_login_with_return_address() {
    let h = static_harness();
    let nav = h.portal.navigator();

    let outcome = nav.push("/dashboard").await.unwrap();
    assert_eq!(landed(&outcome), "/login?redirect=/dashboard");

    let outcome = nav.push("/system/profile?tab=2").await.unwrap();
    assert_eq!(outcome.route().unwrap().location.query("redirect"), Some("/system/profile?tab=2"));

    // A dead link is not worth returning to.
    let outcome = nav.push("/404").await.unwrap();
    assert_eq!(landed(&outcome), "/404");
}

#[tokio::test]
async fn admin_area_is_gated_by_role() {
    let h = static_harness();
    let nav = h.portal.navigator();

    let outcome = nav.push("/admin/users").await.unwrap();
    assert_eq!(landed(&outcome), "/login?redirect=/admin/users");

    h.portal.login(&Credentials::new("user", "pw")).await.unwrap();
    let outcome = nav.push("/admin/users").await.unwrap();
    assert_eq!(landed(&outcome), "/403");
    assert!(!h.portal.registry().has_route("admin-root"));
}

#[tokio::test]
async fn user_login_scenario() {
    let h = static_harness();
    let nav = h.portal.navigator();

    h.portal.login(&Credentials::new("user", "pw")).await.unwrap();

    let outcome = nav.push("/dashboard").await.unwrap();
    assert_eq!(outcome.route().unwrap().name, "dashboard");
    assert_eq!(h.signals.last_title().as_deref(), Some("Dashboard - navgate"));

    h.portal.logout().await.unwrap();
    let outcome = nav.push("/admin/users").await.unwrap();
    assert_eq!(landed(&outcome), "/login?redirect=/admin/users");
}

#[tokio::test]
async fn admin_sessions_resolve_admin_detail_pages() {
    let h = static_harness();
    let outcome = h.portal.login(&Credentials::new("admin", "pw")).await.unwrap();
    assert_eq!(landed(&outcome), "/admin/dashboard");

    let outcome = h.portal.navigator().push("/admin/users/7").await.unwrap();
    let route = outcome.route().unwrap();
    assert_eq!(route.name, "admin-user-detail");
    assert_eq!(route.params.get("id").map(String::as_str), Some("7"));
    assert_eq!(h.portal.registry().menus().active.as_deref(), Some("/admin/users"));
    assert_eq!(h.portal.registry().current_menus().len(), 4);
}

#[tokio::test]
async fn login_returns_to_the_requested_page() {
    let h = static_harness();
    h.portal.navigator().push("/system/profile").await.unwrap();

    let outcome = h.portal.login(&Credentials::new("admin", "pw")).await.unwrap();
    assert_eq!(landed(&outcome), "/system/profile");
}

#[tokio::test]
async fn rejected_login_changes_nothing() {
    let h = static_harness();
    h.portal.navigator().push("/login").await.unwrap();
    let before = route_names(&h.portal);

    let err = h.portal.login(&Credentials::new("mallory", "pw")).await.unwrap_err();

    assert!(matches!(err, PortalError::Auth(_)));
    assert!(!h.portal.sessions().is_logged_in());
    assert!(h.store.is_empty());
    assert_eq!(route_names(&h.portal), before);
    assert_eq!(h.signals.errors().len(), 1);
    assert_eq!(h.portal.navigator().current().unwrap().name, "login");
}

#[tokio::test]
async fn init_is_idempotent_per_session() {
    let h = static_harness();
    h.portal.login(&Credentials::new("user", "pw")).await.unwrap();
    let registry = h.portal.registry();

    let count = registry.route_count();
    registry.init_authorized_routes().await.unwrap();
    h.portal.navigator().push("/dashboard").await.unwrap();

    assert_eq!(registry.route_count(), count);
    assert_eq!(registry.registrations(), 1);
}

#[tokio::test]
async fn logout_then_login_matches_a_fresh_start() {
    let fresh = static_harness();
    fresh.portal.login(&Credentials::new("admin", "pw")).await.unwrap();
    let expected = route_names(&fresh.portal);

    let h = static_harness();
    h.portal.login(&Credentials::new("admin", "pw")).await.unwrap();
    h.portal.navigator().push("/dashboard").await.unwrap();
    assert!(!h.portal.tabs().tabs().is_empty());

    let outcome = h.portal.logout().await.unwrap();
    assert_eq!(landed(&outcome), "/");
    assert!(h.portal.tabs().tabs().is_empty());
    assert!(!h.portal.registry().has_route("admin-root"));
    assert!(h.store.get(keys::ACCESS_TOKEN).unwrap().is_none());

    h.portal.login(&Credentials::new("admin", "pw")).await.unwrap();
    assert_eq!(route_names(&h.portal), expected);
}

#[tokio::test]
async fn external_links_open_out_of_band() {
    let h = static_harness();
    h.portal.login(&Credentials::new("user", "pw")).await.unwrap();
    let before = h.portal.navigator().current().unwrap().location;

    let outcome = h.portal.navigator().push("/docs").await.unwrap();

    assert!(matches!(outcome, NavigationOutcome::Blocked));
    assert_eq!(h.portal.navigator().current().unwrap().location, before);
    assert!(h
        .signals
        .events()
        .contains(&SignalEvent::OpenExternal("https://docs.example.com".into())));
}

#[tokio::test(start_paused = true)]
async fn near_expiry_session_refreshes_immediately_once() {
    let config = NavConfig {
        auto_refresh_token: true,
        refresh_ahead_secs: 60,
        ..NavConfig::default()
    };
    let h = harness(config, RouteLoad::Static(authorized()), ScriptedAuth::new(Some(30)));

    h.portal.login(&Credentials::new("user", "pw")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(h.auth.refreshes.load(Ordering::SeqCst), 1);
    let scheduler = h.portal.sessions().scheduler();
    assert_eq!(
        scheduler.state(),
        SchedulerState::Armed {
            delay: Duration::from_secs(3_540)
        }
    );
    assert_eq!(h.portal.sessions().session().unwrap().token, "access-renewed");
}

#[tokio::test(start_paused = true)]
async fn back_to_back_navigations_share_one_initialization() {
    let source = Arc::new(SlowSource {
        routes: authorized(),
        delay: Duration::from_millis(100),
        fail: false,
        fetches: AtomicUsize::new(0),
    });
    let config = NavConfig {
        route_load_mode: navgate_core::RouteLoadMode::Dynamic,
        ..NavConfig::default()
    };
    let h = harness(config, RouteLoad::Dynamic(source.clone()), ScriptedAuth::new(None));
    h.portal.sessions().login(&Credentials::new("user", "pw")).await.unwrap();
    let nav = h.portal.navigator();

    let (a, b) = tokio::join!(nav.push("/dashboard"), nav.push("/dashboard"));

    assert_eq!(a.unwrap().route().unwrap().name, "dashboard");
    assert_eq!(b.unwrap().route().unwrap().name, "dashboard");
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(h.portal.registry().registrations(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_initialization_redirects_to_login() {
    let source = Arc::new(SlowSource {
        routes: Vec::new(),
        delay: Duration::ZERO,
        fail: true,
        fetches: AtomicUsize::new(0),
    });
    let h = harness(NavConfig::default(), RouteLoad::Dynamic(source.clone()), ScriptedAuth::new(None));
    h.portal.sessions().login(&Credentials::new("user", "pw")).await.unwrap();
    let nav = h.portal.navigator();

    let outcome = nav.push("/").await.unwrap();
    assert_eq!(landed(&outcome), "/login");
    assert_eq!(h.signals.errors().len(), 1);

    let outcome = nav.push("/dashboard").await.unwrap();
    assert_eq!(landed(&outcome), "/login?redirect=/dashboard");
    assert!(!h.portal.registry().is_initialized());
    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn restored_session_is_used_on_startup() {
    let store = Arc::new(MemoryStore::with_entries([
        (keys::ACCESS_TOKEN, json!("persisted")),
        (keys::ROLE, json!("admin")),
    ]));
    let portal = Portal::new(PortalParts {
        config: NavConfig::default(),
        store,
        api: Arc::new(ScriptedAuth::new(None)),
        routes: RouteLoad::Static(authorized()),
        views: Arc::new(NamedViews),
        signals: Arc::new(RecordingSignals::default()),
        clock: Arc::new(FixedClock::new(NOW)),
    })
    .unwrap();
    portal.resume();

    let outcome = portal.navigator().push("/admin/logs").await.unwrap();
    assert_eq!(outcome.route().unwrap().name, "admin-logs");
}

#[tokio::test]
async fn restored_session_is_sent_away_from_login() {
    let store = Arc::new(MemoryStore::with_entries([
        (keys::ACCESS_TOKEN, json!("persisted")),
        (keys::ROLE, json!("user")),
    ]));
    let portal = Portal::new(PortalParts {
        config: NavConfig::default(),
        store,
        api: Arc::new(ScriptedAuth::new(None)),
        routes: RouteLoad::Static(authorized()),
        views: Arc::new(NamedViews),
        signals: Arc::new(RecordingSignals::default()),
        clock: Arc::new(FixedClock::new(NOW)),
    })
    .unwrap();
    portal.resume();

    let outcome = portal.navigator().push("/login").await.unwrap();
    assert_eq!(landed(&outcome), "/");
    assert!(portal.registry().is_initialized());
}

#[tokio::test(start_paused = true)]
async fn login_while_anonymous_routes_load_still_succeeds() {
    let source = Arc::new(SlowSource {
        routes: authorized(),
        delay: Duration::from_millis(100),
        fail: false,
        fetches: AtomicUsize::new(0),
    });
    let h = harness(NavConfig::default(), RouteLoad::Dynamic(source.clone()), ScriptedAuth::new(None));
    let nav = h.portal.navigator();

    let (visit, login) = tokio::join!(nav.push("/"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.portal.login(&Credentials::new("user", "pw")).await
    });

    assert_eq!(landed(&visit.unwrap()), "/");
    assert_eq!(landed(&login.unwrap()), "/");
    assert!(h.signals.errors().is_empty());
    assert!(h.portal.registry().is_initialized());
    assert_eq!(h.portal.registry().registrations(), 1);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn admin_granted_after_an_anonymous_visit_reaches_admin_pages() {
    let h = static_harness();
    let nav = h.portal.navigator();
    nav.push("/").await.unwrap();
    assert!(h.portal.registry().is_initialized());
    assert!(!h.portal.registry().has_route("admin-root"));

    h.portal.sessions().cell().install(Session {
        token: "late-admin".into(),
        refresh_token: "r".into(),
        expires_at: None,
        roles: RoleSet::single(Role::ADMIN),
        user_info: json!({"id": 1}),
    });

    let outcome = nav.push("/admin/users").await.unwrap();
    assert_eq!(outcome.route().unwrap().name, "admin-users");
    assert!(h.portal.registry().has_route("admin-root"));
    assert_eq!(nav.history(), vec!["/", "/admin/users"]);
}

#[tokio::test]
async fn redirect_loops_are_cut_off() {
    let routes = vec![
        RouteDescriptor::new("/ping", "ping").with_redirect("/pong"),
        RouteDescriptor::new("/pong", "pong").with_redirect("/ping"),
    ];
    let h = harness(NavConfig::default(), RouteLoad::Static(routes), ScriptedAuth::new(None));
    h.portal.login(&Credentials::new("user", "pw")).await.unwrap();
    let before = h.portal.navigator().current().unwrap().location;

    let err = h.portal.navigator().push("/ping").await.unwrap_err();

    assert_eq!(err, NavigationError::TooManyRedirects("/ping".into()));
    assert_eq!(h.portal.navigator().current().unwrap().location, before);
}
