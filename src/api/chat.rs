use super::UniBroApi;
use crate::error::{ApiError, Result};
use crate::models::chat::{
    CreateSessionResponse, Message, MessageHistory, QueryRequest, SendMessageResponse, Session,
    SessionList, NEW_SESSION_GREETING,
};
use crate::models::request::ApiRequest;

impl UniBroApi {
    /// Fetch the session list from the server and refresh the local cache
    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        let list: SessionList = self.http.send_json(&ApiRequest::get("/sessions")).await?;
        self.sessions.update(list.sessions.clone());
        Ok(list.sessions)
    }

    /// Session list, served from cache while it is fresh
    pub async fn sessions(&self) -> Result<Vec<Session>> {
        if self.sessions.is_stale() {
            return self.list_sessions().await;
        }
        Ok(self.sessions.sessions())
    }

    /// Most recent session, if the user has any
    pub async fn latest_session(&self) -> Result<Option<Session>> {
        if self.sessions.is_stale() {
            self.list_sessions().await?;
        }
        Ok(self.sessions.latest())
    }

    /// Open a new session and return its id
    pub async fn create_session(&self) -> Result<String> {
        let request = json_request(
            ApiRequest::post("/sessions"),
            &QueryRequest {
                query: NEW_SESSION_GREETING,
            },
        )?;
        let created: CreateSessionResponse = self.http.send_json(&request).await?;

        let session_id = created.session_id.ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!("Create session response has no session_id"))
        })?;

        tracing::info!(session_id = %session_id, "Created chat session");
        self.list_sessions().await?;
        Ok(session_id)
    }

    pub async fn get_messages(&self, session_id: &str) -> Result<Vec<Message>> {
        let session_id = require_session_id(session_id)?;
        let history: MessageHistory = self
            .http
            .send_json(&ApiRequest::get(format!("/sessions/{}", session_id)))
            .await?;
        Ok(history.messages)
    }

    /// Send a user message; returns the assistant reply when there is one
    pub async fn send_message(&self, session_id: &str, query: &str) -> Result<Option<String>> {
        let session_id = require_session_id(session_id)?;
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::ValidationError("Message is empty".to_string()));
        }

        let request = json_request(
            ApiRequest::post(format!("/sessions/{}/messages", session_id)),
            &QueryRequest { query },
        )?;
        let reply: SendMessageResponse = self.http.send_json(&request).await?;
        Ok(reply.response)
    }
}

fn require_session_id(session_id: &str) -> Result<&str> {
    let session_id = session_id.trim();
    if session_id.is_empty() || session_id.contains('/') {
        return Err(ApiError::ValidationError(format!(
            "Invalid session id: {:?}",
            session_id
        )));
    }
    Ok(session_id)
}

fn json_request(request: ApiRequest, body: &QueryRequest<'_>) -> Result<ApiRequest> {
    request
        .with_json(body)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to encode request: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_session_id() {
        assert_eq!(require_session_id(" abc ").unwrap(), "abc");
        assert!(require_session_id("").is_err());
        assert!(require_session_id("a/b").is_err());
    }
}
