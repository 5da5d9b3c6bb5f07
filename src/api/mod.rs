// Typed operations over the UniBro API

mod chat;
mod sop;

use std::sync::Arc;

use crate::auth::types::LoginResponse;
use crate::auth::{AuthManager, NavigationSink, TokenStore};
use crate::cache::SessionCache;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::http_client::AuthenticatedClient;
use crate::models::request::ApiRequest;
use crate::models::user::{RegisterRequest, RegisterResponse, User};

/// High level client used by the CLI
pub struct UniBroApi {
    http: AuthenticatedClient,
    sessions: SessionCache,
}

impl UniBroApi {
    pub fn new(http: AuthenticatedClient, session_cache_ttl: u64) -> Self {
        Self {
            http,
            sessions: SessionCache::new(session_cache_ttl),
        }
    }

    /// Wire up transport, auth manager and cache from configuration
    pub fn from_config(
        config: &Config,
        store: Arc<dyn TokenStore>,
        navigation: Arc<dyn NavigationSink>,
    ) -> anyhow::Result<Self> {
        let transport = AuthenticatedClient::build_transport(
            config.http_connect_timeout,
            config.http_request_timeout,
        )?;
        let base_url = config.api_base_url();

        let auth_manager = Arc::new(AuthManager::new(
            store,
            navigation,
            transport.clone(),
            base_url.clone(),
        ));
        let http = AuthenticatedClient::new(transport, auth_manager, base_url);

        Ok(Self::new(http, config.session_cache_ttl))
    }

    pub fn http(&self) -> &AuthenticatedClient {
        &self.http
    }

    pub fn auth(&self) -> &Arc<AuthManager> {
        self.http.auth_manager()
    }

    pub fn session_cache(&self) -> &SessionCache {
        &self.sessions
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth().is_authenticated()
    }

    /// Exchange username/password for tokens and store them
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ApiError::ValidationError(
                "Username and password are required".to_string(),
            ));
        }

        let request = ApiRequest::post("/auth/login/access-token")
            .with_form(&[("username", username.trim()), ("password", password)]);
        let tokens: LoginResponse = self.http.send_anonymous_json(&request).await?;

        self.auth()
            .store_login(&tokens.access_token, tokens.refresh_token.as_deref())?;
        self.sessions.clear();
        tracing::info!(username = username.trim(), "Logged in");
        Ok(())
    }

    pub async fn register(&self, form: &RegisterRequest) -> Result<RegisterResponse> {
        form.validate().map_err(ApiError::ValidationError)?;

        let request = ApiRequest::post("/auth/register").with_json(form).map_err(|e| {
            ApiError::Internal(anyhow::anyhow!("Failed to encode registration: {}", e))
        })?;
        let response: RegisterResponse = self.http.send_anonymous_json(&request).await?;

        tracing::info!(username = %form.username, "Registered new account");
        Ok(response)
    }

    /// Forget the stored credentials and cached sessions
    pub fn logout(&self) -> Result<()> {
        self.sessions.clear();
        self.auth().logout()
    }

    pub async fn fetch_user(&self) -> Result<User> {
        self.http
            .send_json(&ApiRequest::get("/auth/users/me"))
            .await
    }
}
