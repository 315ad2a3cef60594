use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role identifier used for route gating.
///
/// Roles are opaque strings; only [`Role::ADMIN`] carries meaning inside the
/// navigation core.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const USER: Role = Role(Cow::Borrowed("user"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized set of roles held by a session.
///
/// The backend and older persisted sessions store the role either as a single
/// string or as a list of strings. Both shapes are normalized into a set at
/// the storage boundary so every membership test is `contains`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Vec<Role>")]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(role: Role) -> Self {
        Self(BTreeSet::from([role]))
    }

    /// Normalize a stored role value (scalar, list or absent).
    ///
    /// Non-string list entries and empty strings are ignored.
    pub fn from_stored(value: Option<&Value>) -> Self {
        let mut roles = BTreeSet::new();
        match value {
            Some(Value::String(s)) if !s.is_empty() => {
                roles.insert(Role::new(s.clone()));
            }
            Some(Value::Array(items)) => {
                roles.extend(
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(|s| Role::new(s.to_string())),
                );
            }
            _ => {}
        }
        Self(roles)
    }

    /// Canonical persisted shape: always a list.
    pub fn to_stored(&self) -> Value {
        Value::Array(
            self.0
                .iter()
                .map(|r| Value::String(r.as_str().to_string()))
                .collect(),
        )
    }

    pub fn contains(&self, role: &Role) -> bool {
        self.0.contains(role)
    }

    pub fn is_admin(&self) -> bool {
        self.contains(&Role::ADMIN)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.0.iter()
    }
}

impl From<Value> for RoleSet {
    fn from(value: Value) -> Self {
        Self::from_stored(Some(&value))
    }
}

impl From<RoleSet> for Vec<Role> {
    fn from(value: RoleSet) -> Self {
        value.0.into_iter().collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl core::fmt::Display for RoleSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Role::as_str).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
