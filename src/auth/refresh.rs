// Token refresh logic

use anyhow::{Context, Result};
use reqwest::Client;

use super::types::{token_preview, RefreshRequest, RefreshResponse, REFRESH_PATH};
use crate::models::request::join_url;

/// Exchange a refresh token for a new access token.
///
/// Goes straight to the transport: the refresh call never passes through the
/// 401 retry policy, so a rejected refresh token cannot recurse.
pub async fn refresh_access_token(
    client: &Client,
    base_url: &str,
    refresh_token: &str,
) -> Result<RefreshResponse> {
    let url = join_url(base_url, REFRESH_PATH);

    tracing::debug!(
        url = %url,
        refresh_token = %token_preview(refresh_token),
        "Refreshing access token"
    );

    let request = RefreshRequest {
        refresh_token: refresh_token.to_string(),
    };

    let response = client
        .post(&url)
        .json(&request)
        .send()
        .await
        .context("Failed to send refresh request")?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        tracing::error!(
            status = status.as_u16(),
            body = %error_text,
            "Refresh endpoint rejected the refresh token"
        );
        anyhow::bail!("{} - {}", status, crate::error::extract_detail(&error_text));
    }

    let data: RefreshResponse = response
        .json()
        .await
        .context("Failed to parse refresh response")?;

    if data.access_token.is_empty() {
        anyhow::bail!("Refresh response does not contain access_token");
    }

    if data.refresh_token.is_some() {
        tracing::debug!("Refresh response carried a refresh_token; keeping the stored one");
    }

    tracing::info!("Access token refreshed");

    Ok(data)
}
