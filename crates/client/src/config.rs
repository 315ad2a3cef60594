use std::path::PathBuf;

use navgate_core::NavConfig;

use crate::error::AppError;
use crate::file_store::default_session_path;

pub const ENV_API_URL: &str = "NAVGATE_API_URL";
pub const ENV_SESSION_FILE: &str = "NAVGATE_SESSION_FILE";
/// JSON array of route descriptors used in static mode.
pub const ENV_ROUTES_FILE: &str = "NAVGATE_ROUTES_FILE";

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";

/// Everything the `navgate` shell reads at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub nav: NavConfig,
    pub api_url: String,
    pub session_file: PathBuf,
    pub routes_file: Option<PathBuf>,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let nav = NavConfig::from_lookup(&lookup)?;
        let api_url = lookup(ENV_API_URL)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let session_file = match lookup(ENV_SESSION_FILE).filter(|v| !v.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_session_path().ok_or(AppError::NoDataDir)?,
        };
        let routes_file = lookup(ENV_ROUTES_FILE)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            nav,
            api_url,
            session_file,
            routes_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navgate_core::RouteLoadMode;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn explicit_values_win() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_API_URL, "https://api.example.test"),
            (ENV_SESSION_FILE, "/tmp/navgate-session.json"),
            (ENV_ROUTES_FILE, "/etc/navgate/routes.json"),
            ("NAVGATE_ROUTE_LOAD_MODE", "dynamic"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "https://api.example.test");
        assert_eq!(config.session_file, PathBuf::from("/tmp/navgate-session.json"));
        assert_eq!(config.routes_file, Some(PathBuf::from("/etc/navgate/routes.json")));
        assert_eq!(config.nav.route_load_mode, RouteLoadMode::Dynamic);
    }

    #[test]
    fn api_url_defaults_to_localhost() {
        let config =
            ClientConfig::from_lookup(lookup(&[(ENV_SESSION_FILE, "/tmp/navgate-session.json")])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.routes_file.is_none());
    }

    #[test]
    fn invalid_nav_values_are_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[
            (ENV_SESSION_FILE, "/tmp/navgate-session.json"),
            ("NAVGATE_ROUTE_LOAD_MODE", "sometimes"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
