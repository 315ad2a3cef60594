//! In-memory session kept in lock-step with the key/value store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use navgate_core::{KeyValueStore, keys};

use crate::{RoleSet, Session, SessionExpiredError, TokenGrant};

/// Holder of the current session.
///
/// The in-memory value is authoritative; every mutation is written through to
/// the backing store. A failed write is logged and does not roll back the
/// in-memory change.
///
/// Each install/clear bumps a generation counter. Work that started under one
/// generation (a refresh, a route fetch) must check it before applying its
/// result, so a logout in the meantime turns the late result into a no-op.
pub struct SessionCell {
    store: Arc<dyn KeyValueStore>,
    current: RwLock<Option<Arc<Session>>>,
    generation: AtomicU64,
}

impl SessionCell {
    /// Rebuild the session from persisted keys.
    pub fn restore(store: Arc<dyn KeyValueStore>) -> Self {
        let session = read_persisted(store.as_ref());
        if let Some(session) = &session {
            tracing::info!(roles = %session.roles, "restored persisted session");
        }
        Self {
            store,
            current: RwLock::new(session.map(Arc::new)),
            generation: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> Option<Arc<Session>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_logged_in(&self) -> bool {
        self.snapshot().is_some_and(|s| s.is_active())
    }

    pub fn roles(&self) -> RoleSet {
        self.snapshot().map(|s| s.roles.clone()).unwrap_or_default()
    }

    /// Replace the current session (login).
    pub fn install(&self, session: Session) -> Arc<Session> {
        let session = Arc::new(session);
        let mut guard = self.write();
        self.persist(&session, true);
        *guard = Some(session.clone());
        self.generation.fetch_add(1, Ordering::SeqCst);
        session
    }

    /// Apply renewed token material, provided the session has not changed
    /// since `expected_generation` was read.
    pub fn apply_grant(
        &self,
        expected_generation: u64,
        grant: TokenGrant,
    ) -> Result<Arc<Session>, SessionExpiredError> {
        let mut guard = self.write();
        if self.generation() != expected_generation {
            return Err(SessionExpiredError);
        }
        let current = guard.as_ref().filter(|s| s.is_active()).ok_or(SessionExpiredError)?;

        let renewed = Arc::new(current.renewed(grant));
        self.persist(&renewed, false);
        // Single assignment: readers see either the old or the new session.
        *guard = Some(renewed.clone());
        Ok(renewed)
    }

    /// Drop the session and every persisted session key. Idempotent.
    pub fn clear(&self) {
        let mut guard = self.write();
        for key in keys::SESSION {
            if let Err(e) = self.store.remove(key) {
                tracing::warn!(key, error = %e, "failed to remove persisted session key");
            }
        }
        *guard = None;
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Arc<Session>>> {
        self.current.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, session: &Session, with_identity: bool) {
        let mut writes: Vec<(&str, Value)> = vec![
            (keys::ACCESS_TOKEN, Value::String(session.token.clone())),
            (keys::REFRESH_TOKEN, Value::String(session.refresh_token.clone())),
        ];
        match session.expires_at {
            Some(at) => writes.push((keys::ACCESS_TOKEN_EXPIRES_AT, Value::from(at))),
            None => {
                if let Err(e) = self.store.remove(keys::ACCESS_TOKEN_EXPIRES_AT) {
                    tracing::warn!(error = %e, "failed to remove persisted expiry");
                }
            }
        }
        if with_identity {
            writes.push((keys::ROLE, session.roles.to_stored()));
            writes.push((keys::USER_INFO, session.user_info.clone()));
        }

        for (key, value) in writes {
            if let Err(e) = self.store.set(key, value) {
                tracing::warn!(key, error = %e, "failed to persist session key");
            }
        }
    }
}

impl core::fmt::Debug for SessionCell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionCell")
            .field("logged_in", &self.is_logged_in())
            .field("generation", &self.generation())
            .finish()
    }
}

fn read_persisted(store: &dyn KeyValueStore) -> Option<Session> {
    let read = |key: &str| match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read persisted session key");
            None
        }
    };

    let token = read(keys::ACCESS_TOKEN)
        .and_then(|v| v.as_str().map(str::to_string))
        .filter(|t| !t.is_empty())?;

    let refresh_token = read(keys::REFRESH_TOKEN)
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    let expires_at = read(keys::ACCESS_TOKEN_EXPIRES_AT).and_then(|v| v.as_i64());
    let mut roles = RoleSet::from_stored(read(keys::ROLE).as_ref());
    if roles.is_empty() {
        roles = RoleSet::single(crate::Role::USER);
    }
    let user_info = read(keys::USER_INFO).unwrap_or(Value::Null);

    Some(Session {
        token,
        refresh_token,
        expires_at,
        roles,
        user_info,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use navgate_core::MemoryStore;
    use serde_json::json;

    use crate::Role;

    fn session(token: &str, role: Role) -> Session {
        Session {
            token: token.into(),
            refresh_token: "r".into(),
            expires_at: Some(1_000),
            roles: RoleSet::single(role),
            user_info: json!({"id": 1}),
        }
    }

    #[test]
    fn install_persists_every_key() {
        let store = Arc::new(MemoryStore::new());
        let cell = SessionCell::restore(store.clone());
        assert!(!cell.is_logged_in());

        cell.install(session("t", Role::ADMIN));

        assert!(cell.is_logged_in());
        assert_eq!(store.get(keys::ACCESS_TOKEN).unwrap(), Some(json!("t")));
        assert_eq!(store.get(keys::ROLE).unwrap(), Some(json!(["admin"])));
        assert_eq!(store.get(keys::ACCESS_TOKEN_EXPIRES_AT).unwrap(), Some(json!(1_000)));
        assert_eq!(store.get(keys::USER_INFO).unwrap(), Some(json!({"id": 1})));
    }

    #[test]
    fn restore_accepts_scalar_role() {
        let store = Arc::new(MemoryStore::with_entries([
            (keys::ACCESS_TOKEN, json!("t")),
            (keys::ROLE, json!("admin")),
        ]));
        let cell = SessionCell::restore(store);
        assert!(cell.is_logged_in());
        assert!(cell.roles().is_admin());
    }

    #[test]
    fn restore_ignores_empty_token() {
        let store = Arc::new(MemoryStore::with_entries([
            (keys::ACCESS_TOKEN, json!("")),
            (keys::ROLE, json!(["admin"])),
        ]));
        let cell = SessionCell::restore(store);
        assert!(!cell.is_logged_in());
        assert!(cell.roles().is_empty());
    }

    #[test]
    fn clear_is_idempotent_and_wipes_storage() {
        let store = Arc::new(MemoryStore::new());
        let cell = SessionCell::restore(store.clone());
        cell.install(session("t", Role::USER));

        cell.clear();
        cell.clear();

        assert!(!cell.is_logged_in());
        assert!(store.is_empty());
    }

    #[test]
    fn grant_is_applied_only_to_the_same_generation() {
        let store = Arc::new(MemoryStore::new());
        let cell = SessionCell::restore(store.clone());
        cell.install(session("t", Role::USER));
        let generation = cell.generation();

        let grant = TokenGrant {
            access_token: "t2".into(),
            refresh_token: "r2".into(),
            expires_at: Some(2_000),
        };
        let renewed = cell.apply_grant(generation, grant.clone()).unwrap();
        assert_eq!(renewed.token, "t2");
        assert_eq!(store.get(keys::ACCESS_TOKEN).unwrap(), Some(json!("t2")));
        assert_eq!(store.get(keys::ACCESS_TOKEN_EXPIRES_AT).unwrap(), Some(json!(2_000)));

        cell.clear();
        assert_eq!(cell.apply_grant(generation, grant), Err(SessionExpiredError));
        assert!(!cell.is_logged_in());
        assert!(store.get(keys::ACCESS_TOKEN).unwrap().is_none());
    }
}
