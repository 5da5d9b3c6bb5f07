use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::AuthManager;
use crate::error::ApiError;
use crate::models::request::{ApiRequest, Attempt, RequestBody};

/// HTTP client for the UniBro API with bearer injection and 401 recovery
pub struct AuthenticatedClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// Authentication manager
    auth_manager: Arc<AuthManager>,

    /// API base URL, e.g. http://localhost:8000/api/v1
    base_url: String,
}

impl AuthenticatedClient {
    /// Build a transport with the given timeouts (seconds)
    pub fn build_transport(connect_timeout: u64, request_timeout: u64) -> Result<Client> {
        Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .build()
            .context("Failed to create HTTP client")
    }

    pub fn new(client: Client, auth_manager: Arc<AuthManager>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            auth_manager,
            base_url: base_url.into(),
        }
    }

    /// Send a request.
    ///
    /// Attaches the stored access token when there is one. A 401 on the first
    /// attempt of a non-refresh request triggers one token refresh followed by
    /// exactly one resend; every other failure is returned as-is.
    pub async fn send(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        let mut attempt = Attempt::Initial;
        let mut token = self.auth_manager.access_token()?;

        tracing::debug!(
            request_id = request.id(),
            method = %request.method(),
            path = request.path(),
            authenticated = token.is_some(),
            "Sending API request"
        );

        loop {
            let response = self.execute(request, token.as_deref(), attempt).await?;
            let status = response.status();

            if status.is_success() {
                tracing::debug!(
                    request_id = request.id(),
                    status = %status,
                    retried = attempt.is_retry(),
                    "Request successful"
                );
                return Ok(response);
            }

            if status == StatusCode::UNAUTHORIZED
                && !attempt.is_retry()
                && !request.is_refresh_endpoint()
            {
                tracing::warn!(
                    request_id = request.id(),
                    path = request.path(),
                    "Received 401, refreshing token and retrying..."
                );

                let refreshed = self
                    .auth_manager
                    .recover_from_unauthorized(token.as_deref())
                    .await?;
                token = Some(refreshed);
                attempt = Attempt::Retry;
                continue;
            }

            return Err(self.error_from_response(request, response, attempt).await);
        }
    }

    /// Send a request that carries its own credentials (login, register).
    ///
    /// No bearer token is attached and a 401 is returned to the caller
    /// directly: a wrong password must not trigger a token refresh.
    pub async fn send_anonymous(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        tracing::debug!(
            request_id = request.id(),
            method = %request.method(),
            path = request.path(),
            "Sending anonymous API request"
        );

        let response = self.execute(request, None, Attempt::Initial).await?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(self.error_from_response(request, response, Attempt::Initial).await)
    }

    /// Send a request and decode its JSON body
    pub async fn send_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        decode_json(request, response).await
    }

    /// Anonymous variant of [`send_json`](Self::send_json)
    pub async fn send_anonymous_json<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<T, ApiError> {
        let response = self.send_anonymous(request).await?;
        decode_json(request, response).await
    }

    /// Perform one attempt on the wire
    async fn execute(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
        attempt: Attempt,
    ) -> Result<Response, ApiError> {
        let url = request.url(&self.base_url);
        let mut builder = self.client.request(request.method().clone(), &url);

        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        builder = match request.body() {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.form(fields),
            RequestBody::File {
                field,
                file_name,
                mime,
                bytes,
            } => {
                let part = Part::bytes(bytes.clone())
                    .file_name(file_name.clone())
                    .mime_str(mime)
                    .map_err(|e| ApiError::ValidationError(format!("Invalid MIME type: {}", e)))?;
                builder.multipart(Form::new().part(field.clone(), part))
            }
        };

        tracing::debug!(
            request_id = request.id(),
            attempt = ?attempt,
            url = %url,
            "Executing request attempt"
        );

        builder.send().await.map_err(|e| {
            let err = ApiError::from_transport(&e);
            tracing::warn!(
                request_id = request.id(),
                url = %url,
                attempt = ?attempt,
                error = %err,
                "HTTP request error"
            );
            err
        })
    }

    async fn error_from_response(
        &self,
        request: &ApiRequest,
        response: Response,
        attempt: Attempt,
    ) -> ApiError {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();

        tracing::error!(
            request_id = request.id(),
            status = status.as_u16(),
            path = request.path(),
            attempt = ?attempt,
            response_body = %error_text,
            "HTTP request failed with error response"
        );

        ApiError::from_status(status, &error_text)
    }

    pub fn auth_manager(&self) -> &Arc<AuthManager> {
        &self.auth_manager
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

async fn decode_json<T: DeserializeOwned>(
    request: &ApiRequest,
    response: Response,
) -> Result<T, ApiError> {
    response.json::<T>().await.map_err(|e| {
        ApiError::Internal(anyhow::anyhow!(
            "Failed to parse response from {}: {}",
            request.path(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemoryTokenStore, RecordingNavigation};

    #[tokio::test]
    async fn test_transport_error_is_not_retried() {
        let nav = Arc::new(RecordingNavigation::new());
        let transport = AuthenticatedClient::build_transport(1, 2).unwrap();
        let auth = Arc::new(AuthManager::new(
            Arc::new(MemoryTokenStore::with_tokens(Some("A1"), Some("R1"))),
            nav.clone(),
            transport.clone(),
            "http://127.0.0.1:9/api/v1",
        ));
        let client = AuthenticatedClient::new(transport, auth.clone(), "http://127.0.0.1:9/api/v1");

        let err = client.send(&ApiRequest::get("/sessions")).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert_eq!(nav.redirects(), 0);
        assert_eq!(auth.access_token().unwrap().as_deref(), Some("A1"));
    }
}
