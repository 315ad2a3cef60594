//! Admin-area endpoints, materialized on first use.
//!
//! Nothing admin-specific exists until an admin session calls one of these
//! methods. Every call re-checks the role, so a session downgraded after the
//! surface was built is still refused.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::OnceCell;

use crate::error::HttpError;
use crate::http::{HttpApi, NO_QUERY};

/// Filters of the admin user list.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Filters of the operation log list. Times are epoch seconds.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LogQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
}

/// Resolved endpoint prefixes of the admin API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSurface {
    pub users: String,
    pub logs: String,
}

impl AdminSurface {
    fn new(admin_base: &str) -> Self {
        Self {
            users: format!("/api/v1{admin_base}/users"),
            logs: format!("/api/v1{admin_base}/logs"),
        }
    }
}

#[derive(Debug)]
pub struct LazyAdminApi {
    http: Arc<HttpApi>,
    admin_base: String,
    surface: OnceCell<AdminSurface>,
}

impl LazyAdminApi {
    pub fn new(http: Arc<HttpApi>, admin_base: impl Into<String>) -> Self {
        Self {
            http,
            admin_base: admin_base.into(),
            surface: OnceCell::new(),
        }
    }

    pub fn is_materialized(&self) -> bool {
        self.surface.initialized()
    }

    async fn surface(&self) -> Result<&AdminSurface, HttpError> {
        let is_admin = self
            .http
            .session()
            .and_then(|cell| cell.snapshot())
            .is_some_and(|s| s.is_active() && s.is_admin());
        if !is_admin {
            tracing::warn!("admin api refused for non-admin session");
            return Err(HttpError::AdminRequired);
        }

        let surface = self
            .surface
            .get_or_init(|| async {
                tracing::info!(base = %self.admin_base, "materializing admin api");
                AdminSurface::new(&self.admin_base)
            })
            .await;
        Ok(surface)
    }

    pub async fn list_users(&self, query: &UserQuery) -> Result<Value, HttpError> {
        let surface = self.surface().await?;
        self.http.get(&surface.users, query).await
    }

    pub async fn user_detail(&self, id: i64) -> Result<Value, HttpError> {
        let surface = self.surface().await?;
        self.http.get(&format!("{}/{id}", surface.users), NO_QUERY).await
    }

    pub async fn list_logs(&self, query: &LogQuery) -> Result<Value, HttpError> {
        let surface = self.surface().await?;
        self.http.get(&surface.logs, query).await
    }

    pub async fn log_stats(&self) -> Result<Value, HttpError> {
        let surface = self.surface().await?;
        self.http.get(&format!("{}/stats", surface.logs), NO_QUERY).await
    }

    /// Delete operation logs older than `before_time` (epoch seconds).
    pub async fn clean_logs(&self, before_time: i64) -> Result<Value, HttpError> {
        let surface = self.surface().await?;
        self.http
            .post(&format!("{}/clean", surface.logs), &json!({ "before_time": before_time }))
            .await
    }
}
