use anyhow::Context;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::navigation::NavigationSink;
use super::refresh;
use super::store::TokenStore;
use super::types::{token_preview, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use crate::error::ApiError;

/// Authentication manager
/// Owns the token lifecycle: storage, single-flight refresh and purge-on-failure
pub struct AuthManager {
    /// Persistent credential storage
    store: Arc<dyn TokenStore>,

    /// Where to send the user when credentials are unrecoverable
    navigation: Arc<dyn NavigationSink>,

    /// HTTP client for refresh requests
    client: Client,

    /// API base URL (e.g. http://localhost:8000/api/v1)
    base_url: String,

    /// Serializes refresh attempts so concurrent 401s share one refresh
    refresh_gate: Mutex<()>,
}

impl AuthManager {
    pub fn new(
        store: Arc<dyn TokenStore>,
        navigation: Arc<dyn NavigationSink>,
        client: Client,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            navigation,
            client,
            base_url: base_url.into(),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Current access token, if any
    pub fn access_token(&self) -> Result<Option<String>, ApiError> {
        Ok(self.store.get(ACCESS_TOKEN_KEY)?)
    }

    /// Current refresh token, if any
    pub fn refresh_token(&self) -> Result<Option<String>, ApiError> {
        Ok(self.store.get(REFRESH_TOKEN_KEY)?)
    }

    /// Whether an access token is stored
    pub fn is_authenticated(&self) -> bool {
        matches!(self.store.get(ACCESS_TOKEN_KEY), Ok(Some(_)))
    }

    /// Persist the credentials returned by a successful login.
    /// A login without a refresh token drops any stale one.
    pub fn store_login(&self, access_token: &str, refresh_token: Option<&str>) -> Result<(), ApiError> {
        self.store
            .set(ACCESS_TOKEN_KEY, access_token)
            .context("Failed to store access token")?;

        match refresh_token {
            Some(token) => self
                .store
                .set(REFRESH_TOKEN_KEY, token)
                .context("Failed to store refresh token")?,
            None => self
                .store
                .remove(REFRESH_TOKEN_KEY)
                .context("Failed to remove stale refresh token")?,
        }

        tracing::info!(
            access_token = %token_preview(access_token),
            has_refresh_token = refresh_token.is_some(),
            "Stored login credentials"
        );
        Ok(())
    }

    /// Remove both tokens
    pub fn logout(&self) -> Result<(), ApiError> {
        self.store.purge().context("Failed to clear credentials")?;
        tracing::info!("Credentials cleared");
        Ok(())
    }

    /// Recover from a 401 on a request that was sent with `rejected`.
    ///
    /// Returns the access token to retry with. If another task already
    /// replaced the rejected token while we waited on the gate, that token is
    /// reused and the refresh endpoint is not called again.
    pub async fn recover_from_unauthorized(&self, rejected: Option<&str>) -> Result<String, ApiError> {
        let _guard = self.refresh_gate.lock().await;

        match self.access_token()? {
            Some(current) if Some(current.as_str()) != rejected => {
                tracing::debug!(
                    access_token = %token_preview(&current),
                    "Access token already refreshed by a concurrent request"
                );
                return Ok(current);
            }
            // A concurrent refresh failed and already sent the user to login
            None if rejected.is_some() => {
                tracing::debug!("Credentials already purged by a concurrent request");
                return Err(ApiError::RefreshFailed(
                    "credentials were cleared by a failed refresh".to_string(),
                ));
            }
            _ => {}
        }

        let Some(refresh_token) = self.refresh_token()? else {
            tracing::warn!("Received 401 but no refresh token is stored");
            self.force_login();
            return Err(ApiError::AuthError("no refresh token".to_string()));
        };

        match refresh::refresh_access_token(&self.client, &self.base_url, &refresh_token).await {
            Ok(data) => {
                self.store
                    .set(ACCESS_TOKEN_KEY, &data.access_token)
                    .context("Failed to store refreshed access token")?;
                Ok(data.access_token)
            }
            Err(e) => {
                tracing::error!("Token refresh failed: {:#}", e);
                self.force_login();
                Err(ApiError::RefreshFailed(format!("{:#}", e)))
            }
        }
    }

    /// Purge credentials and hand the user back to the login flow
    fn force_login(&self) {
        if let Err(e) = self.store.purge() {
            tracing::error!("Failed to purge credentials: {:#}", e);
        }
        self.navigation.redirect_to_login();
    }
}
