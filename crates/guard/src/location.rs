//! Navigation targets: path, query and hash.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// A concrete navigation target such as `/login?redirect=/admin/users#top`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct RouteLocation {
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub hash: Option<String>,
}

impl RouteLocation {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            path: if path.starts_with('/') { path } else { format!("/{path}") },
            query: BTreeMap::new(),
            hash: None,
        }
    }

    /// Parse a full path. Query values are percent-decoded.
    pub fn parse(raw: &str) -> Self {
        let (rest, hash) = match raw.split_once('#') {
            Some((rest, hash)) => (rest, Some(hash.to_string())),
            None => (raw, None),
        };
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));

        let mut location = Self::new(if path.is_empty() { "/" } else { path });
        location.hash = hash.filter(|h| !h.is_empty());
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            location.query.insert(decode(k), decode(v));
        }
        location
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Path plus encoded query and hash.
    ///
    /// Slashes in query values are left readable, so a login redirect reads
    /// `/login?redirect=/admin/users`.
    pub fn full_path(&self) -> String {
        let mut out = self.path.clone();
        if !self.query.is_empty() {
            let query: Vec<String> = self
                .query
                .iter()
                .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
                .collect();
            out.push('?');
            out.push_str(&query.join("&"));
        }
        if let Some(hash) = &self.hash {
            out.push('#');
            out.push_str(hash);
        }
        out
    }
}

fn encode(raw: &str) -> String {
    urlencoding::encode(raw).replace("%2F", "/")
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

impl fmt::Display for RouteLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path())
    }
}

impl From<&str> for RouteLocation {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for RouteLocation {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}
