//! Process configuration.
//!
//! Values are read once at startup (usually from the environment) and treated
//! as immutable inputs afterwards.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_ADMIN_BASE_PATH: &str = "NAVGATE_ADMIN_BASE_PATH";
pub const ENV_HOME_PATH: &str = "NAVGATE_HOME_PATH";
pub const ENV_ROUTE_LOAD_MODE: &str = "NAVGATE_ROUTE_LOAD_MODE";
pub const ENV_AUTO_REFRESH_TOKEN: &str = "NAVGATE_AUTO_REFRESH_TOKEN";
pub const ENV_TOKEN_REFRESH_AHEAD: &str = "NAVGATE_TOKEN_REFRESH_AHEAD";
pub const ENV_SHOW_PROGRESS: &str = "NAVGATE_SHOW_PROGRESS";
pub const ENV_APP_TITLE: &str = "NAVGATE_APP_TITLE";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

impl ConfigError {
    fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }
}

/// Where the authorized route list comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteLoadMode {
    /// Routes compiled into the client.
    #[default]
    Static,
    /// Routes fetched from the backend per user.
    Dynamic,
}

impl core::str::FromStr for RouteLoadMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "dynamic" => Ok(Self::Dynamic),
            other => Err(ConfigError::invalid(
                ENV_ROUTE_LOAD_MODE,
                format!("expected 'static' or 'dynamic', got '{other}'"),
            )),
        }
    }
}

/// Immutable navigation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavConfig {
    /// Path prefix of the admin area (leading `/`, no trailing `/`).
    pub admin_base_path: String,
    /// Where logged-in non-admin users land when leaving the login page.
    pub home_path: String,
    pub route_load_mode: RouteLoadMode,
    pub auto_refresh_token: bool,
    /// Lead time before expiry at which the session is renewed.
    pub refresh_ahead_secs: i64,
    pub show_progress: bool,
    pub app_title: String,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            admin_base_path: "/admin".to_string(),
            home_path: "/".to_string(),
            route_load_mode: RouteLoadMode::Static,
            auto_refresh_token: false,
            refresh_ahead_secs: 60,
            show_progress: true,
            app_title: "navgate".to_string(),
        }
    }
}

impl NavConfig {
    /// Build the configuration from `NAVGATE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Missing keys fall back to [`NavConfig::default`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let admin_base_path = match lookup(ENV_ADMIN_BASE_PATH) {
            Some(raw) => normalize_base_path(&raw)
                .ok_or_else(|| ConfigError::invalid(ENV_ADMIN_BASE_PATH, "must not be '/'"))?,
            None => defaults.admin_base_path,
        };

        let home_path = lookup(ENV_HOME_PATH)
            .map(|p| if p.starts_with('/') { p } else { format!("/{p}") })
            .unwrap_or(defaults.home_path);

        let route_load_mode = match lookup(ENV_ROUTE_LOAD_MODE) {
            Some(raw) => raw.parse()?,
            None => defaults.route_load_mode,
        };

        let auto_refresh_token = match lookup(ENV_AUTO_REFRESH_TOKEN) {
            Some(raw) => parse_bool(ENV_AUTO_REFRESH_TOKEN, &raw)?,
            None => defaults.auto_refresh_token,
        };

        let refresh_ahead_secs = match lookup(ENV_TOKEN_REFRESH_AHEAD) {
            Some(raw) => raw.trim().parse::<i64>().map_err(|e| {
                ConfigError::invalid(ENV_TOKEN_REFRESH_AHEAD, e.to_string())
            })?,
            None => defaults.refresh_ahead_secs,
        };
        if refresh_ahead_secs < 0 {
            return Err(ConfigError::invalid(
                ENV_TOKEN_REFRESH_AHEAD,
                "must not be negative",
            ));
        }

        let show_progress = match lookup(ENV_SHOW_PROGRESS) {
            Some(raw) => parse_bool(ENV_SHOW_PROGRESS, &raw)?,
            None => defaults.show_progress,
        };

        let app_title = lookup(ENV_APP_TITLE).unwrap_or(defaults.app_title);

        Ok(Self {
            admin_base_path,
            home_path,
            route_load_mode,
            auto_refresh_token,
            refresh_ahead_secs,
            show_progress,
            app_title,
        })
    }

    /// Whether `path` falls under the admin prefix.
    ///
    /// Plain prefix test: `/administrator` counts as admin when the base is
    /// `/admin`.
    pub fn is_admin_path(&self, path: &str) -> bool {
        path.starts_with(&self.admin_base_path)
    }
}

fn normalize_base_path(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('/') {
        Some(trimmed.to_string())
    } else {
        Some(format!("/{trimmed}"))
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::invalid(key, format!("expected a boolean, got '{other}'"))),
    }
}
