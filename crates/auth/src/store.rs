//! Session lifecycle: login, logout, restore.

use std::sync::{Arc, PoisonError, RwLock};

use crate::{
    AuthApi, AuthError, Credentials, RefreshScheduler, RoleSet, Session, SessionCell,
};

/// Told when the session ends so dependent state (route graph, tabs) can be
/// reset.
pub trait SessionListener: Send + Sync {
    fn session_cleared(&self);
}

/// Owner of the session lifecycle.
///
/// Login arms the refresh scheduler; logout disarms it and notifies every
/// registered [`SessionListener`].
pub struct SessionStore {
    cell: Arc<SessionCell>,
    api: Arc<dyn AuthApi>,
    scheduler: RefreshScheduler,
    listeners: RwLock<Vec<Arc<dyn SessionListener>>>,
}

impl SessionStore {
    pub fn new(cell: Arc<SessionCell>, api: Arc<dyn AuthApi>, scheduler: RefreshScheduler) -> Self {
        Self {
            cell,
            api,
            scheduler,
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn SessionListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Arm the refresh scheduler for a session restored at startup.
    pub fn resume(&self) {
        if self.is_logged_in() {
            let outcome = self.scheduler.arm();
            tracing::debug!(?outcome, "resumed persisted session");
        }
    }

    /// Exchange credentials for a session.
    ///
    /// On failure the previous state (including a previous session) is left
    /// untouched.
    pub async fn login(&self, credentials: &Credentials) -> Result<Arc<Session>, AuthError> {
        let grant = match self.api.login(credentials).await {
            Ok(grant) => grant,
            Err(e) => {
                tracing::warn!(user = %credentials.user_name, error = %e, "login failed");
                return Err(e.into());
            }
        };
        if grant.access_token.is_empty() {
            return Err(AuthError::Rejected("empty access token".to_string()));
        }

        let session = self.cell.install(Session::from_login(grant));
        tracing::info!(user = %credentials.user_name, roles = %session.roles, "logged in");

        let outcome = self.scheduler.arm();
        tracing::debug!(?outcome, "refresh scheduler armed after login");
        Ok(session)
    }

    /// Clear the session. Idempotent.
    pub fn logout(&self) {
        self.scheduler.disarm();
        self.cell.clear();

        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener.session_cleared();
        }
        tracing::info!("logged out");
    }

    pub fn is_logged_in(&self) -> bool {
        self.cell.is_logged_in()
    }

    /// Normalized role set of the current session (empty when logged out).
    pub fn current_roles(&self) -> RoleSet {
        self.cell.roles()
    }

    pub fn session(&self) -> Option<Arc<Session>> {
        self.cell.snapshot()
    }

    pub fn cell(&self) -> &Arc<SessionCell> {
        &self.cell
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use navgate_core::{FixedClock, KeyValueStore, MemoryStore, NavConfig, keys};
    use serde_json::json;

    use crate::{AuthApiError, LoginGrant, TokenGrant};

    struct Api;

    #[async_trait]
    impl AuthApi for Api {
        async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, AuthApiError> {
            if credentials.password != "secret" {
                return Err(AuthApiError::Unauthorized("bad password".into()));
            }
            let role = if credentials.user_name == "root" { "admin" } else { "user" };
            Ok(LoginGrant::from_payload(json!({
                "id": 1,
                "userName": credentials.user_name,
                "role": [role],
                "accessToken": format!("token-{}", credentials.user_name),
                "refreshToken": "refresh",
                "expiresAt": 2_000_000_000
            }))
            .unwrap())
        }

        async fn refresh(&self, _refresh_token: &str) -> Result<TokenGrant, AuthApiError> {
            Err(AuthApiError::Transport("offline".into()))
        }
    }

    #[derive(Default)]
    struct CountingListener(AtomicUsize);

    impl SessionListener for CountingListener {
        fn session_cleared(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn store_with(kv: Arc<MemoryStore>) -> SessionStore {
        let cell = Arc::new(SessionCell::restore(kv));
        let api: Arc<dyn AuthApi> = Arc::new(Api);
        let config = NavConfig {
            auto_refresh_token: true,
            ..NavConfig::default()
        };
        let scheduler = RefreshScheduler::new(
            &config,
            cell.clone(),
            api.clone(),
            Arc::new(FixedClock::new(1_700_000_000)),
        );
        SessionStore::new(cell, api, scheduler)
    }

    #[tokio::test]
    async fn login_persists_and_arms_refresh() {
        let kv = Arc::new(MemoryStore::new());
        let store = store_with(kv.clone());

        let session = store.login(&Credentials::new("root", "secret")).await.unwrap();

        assert!(store.is_logged_in());
        assert!(store.current_roles().is_admin());
        assert_eq!(session.token, "token-root");
        assert_eq!(kv.get(keys::ACCESS_TOKEN).unwrap(), Some(json!("token-root")));
        assert_eq!(kv.get(keys::ROLE).unwrap(), Some(json!(["admin"])));
        assert!(store.scheduler().is_armed());
    }

    #[tokio::test]
    async fn failed_login_leaves_previous_session() {
        let kv = Arc::new(MemoryStore::new());
        let store = store_with(kv.clone());
        store.login(&Credentials::new("alice", "secret")).await.unwrap();

        let err = store.login(&Credentials::new("root", "wrong")).await.unwrap_err();

        assert!(matches!(err, AuthError::InvalidCredentials(_)));
        assert_eq!(store.session().unwrap().token, "token-alice");
        assert!(!store.current_roles().is_admin());
    }

    #[tokio::test]
    async fn logout_is_idempotent_and_notifies_listeners() {
        let kv = Arc::new(MemoryStore::new());
        let store = store_with(kv.clone());
        let listener = Arc::new(CountingListener::default());
        store.add_listener(listener.clone());
        store.login(&Credentials::new("alice", "secret")).await.unwrap();

        store.logout();
        store.logout();

        assert!(!store.is_logged_in());
        assert!(store.current_roles().is_empty());
        assert!(kv.is_empty());
        assert!(!store.scheduler().is_armed());
        assert_eq!(listener.0.load(Ordering::SeqCst), 2);
    }
}
