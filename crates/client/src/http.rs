//! reqwest-backed backend collaborator.
//!
//! Every endpoint answers with an envelope `{ code, message, data }`; only
//! `code == 200` is a success. [`HttpApi`] implements both [`AuthApi`] and
//! [`RouteSource`], so one client serves login, silent refresh and the
//! per-user route list.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use navgate_auth::{AuthApi, AuthApiError, Credentials, LoginGrant, SessionCell, TokenGrant};
use navgate_routing::{RouteDescriptor, RouteSource, RouteSourceError};

use crate::error::HttpError;

pub const LOGIN_ENDPOINT: &str = "/api/v1/login";
pub const REFRESH_ENDPOINT: &str = "/api/v1/updateToken";
pub const USER_ROUTES_ENDPOINT: &str = "/api/v1/getUserRoutes";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const SUCCESS_CODE: i64 = 200;
const UNAUTHORIZED_CODE: i64 = 401;
pub(crate) const NO_QUERY: &[(&str, &str)] = &[];

#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Value,
}

pub struct HttpApi {
    client: Client,
    base_url: String,
    session: OnceLock<Arc<SessionCell>>,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, HttpError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            session: OnceLock::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Attach the session whose access token authenticates requests.
    /// Only the first call takes effect.
    pub fn bind_session(&self, cell: Arc<SessionCell>) {
        if self.session.set(cell).is_err() {
            tracing::debug!("http client already bound to a session");
        }
    }

    pub(crate) fn session(&self) -> Option<&Arc<SessionCell>> {
        self.session.get()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn access_token(&self) -> Option<String> {
        self.session
            .get()
            .and_then(|cell| cell.snapshot())
            .filter(|s| s.is_active())
            .map(|s| s.token.clone())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub(crate) async fn get<T, Q>(&self, path: &str, query: &Q) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.authorized(self.client.get(self.url(path)).query(query));
        self.send(request, path).await
    }

    pub(crate) async fn post<T>(&self, path: &str, body: &Value) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let request = self.authorized(self.client.post(self.url(path)).json(body));
        self.send(request, path).await
    }

    async fn send<T>(&self, request: RequestBuilder, path: &str) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpError::Unauthorized(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(path, status = status.as_u16(), "backend returned an error status");
            return Err(HttpError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope = response.json().await?;
        open_envelope(envelope)
    }
}

fn open_envelope<T: DeserializeOwned>(envelope: Envelope) -> Result<T, HttpError> {
    match envelope.code {
        SUCCESS_CODE => Ok(serde_json::from_value(envelope.data)?),
        UNAUTHORIZED_CODE => Err(HttpError::Unauthorized(envelope.message)),
        code => Err(HttpError::Api {
            code,
            message: envelope.message,
        }),
    }
}

#[async_trait]
impl AuthApi for HttpApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, AuthApiError> {
        let body = serde_json::to_value(credentials).map_err(|e| AuthApiError::Decode(e.to_string()))?;
        // Login never carries a previous session's token.
        let request = self.client.post(self.url(LOGIN_ENDPOINT)).json(&body);
        let payload: Value = self.send(request, LOGIN_ENDPOINT).await?;
        LoginGrant::from_payload(payload).map_err(|e| AuthApiError::Decode(e.to_string()))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, AuthApiError> {
        let request = self
            .client
            .post(self.url(REFRESH_ENDPOINT))
            .bearer_auth(refresh_token)
            .json(&json!({ "refreshToken": refresh_token }));
        Ok(self.send(request, REFRESH_ENDPOINT).await?)
    }
}

#[async_trait]
impl RouteSource for HttpApi {
    async fn fetch_user_routes(&self, user_id: Option<&str>) -> Result<Vec<RouteDescriptor>, RouteSourceError> {
        let query: Vec<(&str, &str)> = user_id.map(|id| ("id", id)).into_iter().collect();
        Ok(self.get(USER_ROUTES_ENDPOINT, &query).await?)
    }
}

impl core::fmt::Debug for HttpApi {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HttpApi")
            .field("base_url", &self.base_url)
            .field("bound", &self.session.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(value: Value) -> Envelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn success_envelope_yields_data() {
        let routes: Vec<RouteDescriptor> = open_envelope(envelope(json!({
            "code": 200,
            "message": "ok",
            "data": [{ "name": "dashboard", "path": "/dashboard" }]
        })))
        .unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].name, "dashboard");
    }

    #[test]
    fn null_data_is_a_decode_error_for_lists() {
        let result: Result<Vec<RouteDescriptor>, _> =
            open_envelope(envelope(json!({ "code": 200, "data": null })));
        assert!(matches!(result, Err(HttpError::Decode(_))));
    }

    #[test]
    fn envelope_error_codes() {
        let unauthorized: Result<Value, _> =
            open_envelope(envelope(json!({ "code": 401, "message": "expired" })));
        assert!(matches!(unauthorized, Err(HttpError::Unauthorized(m)) if m == "expired"));

        let rejected: Result<Value, _> =
            open_envelope(envelope(json!({ "code": 10001, "message": "bad password" })));
        assert!(matches!(rejected, Err(HttpError::Api { code: 10001, .. })));
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let api = HttpApi::with_client(Client::new(), "http://localhost:8080/");
        assert_eq!(api.url(LOGIN_ENDPOINT), "http://localhost:8080/api/v1/login");
    }
}
