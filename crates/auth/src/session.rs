//! Session model and the payloads exchanged with the auth backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Role, RoleSet};

/// Authenticated identity and credential material for the current user.
///
/// # Invariants
/// - A non-empty `token` implies `roles` is non-empty.
/// - An empty `token` means "not logged in" regardless of other fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub refresh_token: String,
    /// Access token expiry, epoch seconds.
    pub expires_at: Option<i64>,
    pub roles: RoleSet,
    pub user_info: Value,
}

impl Session {
    pub fn is_active(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn is_admin(&self) -> bool {
        self.roles.is_admin()
    }

    /// User id from the profile blob (`id`, numeric or string).
    pub fn user_id(&self) -> Option<String> {
        match self.user_info.get("id")? {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    pub fn from_login(grant: LoginGrant) -> Self {
        let roles = if grant.role.is_empty() {
            RoleSet::single(Role::USER)
        } else {
            grant.role
        };
        Self {
            token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at: grant.expires_at,
            roles,
            user_info: grant.user_info,
        }
    }

    /// Copy of this session with renewed token material.
    pub fn renewed(&self, grant: TokenGrant) -> Self {
        Self {
            token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at: grant.expires_at.or(self.expires_at),
            roles: self.roles.clone(),
            user_info: self.user_info.clone(),
        }
    }
}

/// Login form payload.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub user_name: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("user_name", &self.user_name)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login response.
///
/// The whole payload is kept as `user_info` (it is the profile blob).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginGrant {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub role: RoleSet,
    #[serde(skip)]
    pub user_info: Value,
}

impl LoginGrant {
    /// Decode a login payload, keeping the raw payload as profile data.
    pub fn from_payload(payload: Value) -> Result<Self, serde_json::Error> {
        let mut grant: LoginGrant = serde_json::from_value(payload.clone())?;
        grant.user_info = payload;
        Ok(grant)
    }
}

/// Successful refresh response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
}
