//! Backend collaborator for credential exchange and silent renewal.

use async_trait::async_trait;

use crate::{AuthApiError, Credentials, LoginGrant, TokenGrant};

#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a session.
    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, AuthApiError>;

    /// Exchange a refresh token for renewed token material.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, AuthApiError>;
}
