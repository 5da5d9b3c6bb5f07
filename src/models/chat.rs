// Chat session and message models

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Query sent when opening a new session
pub const NEW_SESSION_GREETING: &str = "Hello";

/// Session summary as listed by GET /sessions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub session_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => "New Chat",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SessionList {
    #[serde(default)]
    pub sessions: Vec<Session>,
}

/// Body of POST /sessions and POST /sessions/{id}/messages
#[derive(Debug, Serialize)]
pub struct QueryRequest<'a> {
    pub query: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionResponse {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct MessageHistory {
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageResponse {
    #[serde(default)]
    pub response: Option<String>,
}

/// Parse a server timestamp.
///
/// Accepts RFC 3339 (with `Z` or an offset) and naive ISO 8601, which is read
/// as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = "2025-01-12T10:30:00+00:00";

        let dt = parse_timestamp("2025-01-12T10:30:00Z").unwrap();
        assert_eq!(dt.to_rfc3339(), expected);

        let dt = parse_timestamp("2025-01-12T10:30:00").unwrap();
        assert_eq!(dt.to_rfc3339(), expected);

        let dt = parse_timestamp("2025-01-12 10:30:00.000").unwrap();
        assert_eq!(dt.to_rfc3339(), expected);

        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_session_list_parsing() {
        let list: SessionList = serde_json::from_str(
            r#"{"sessions":[
                {"session_id":"s1","title":"Admissions","created_at":"2025-01-12T10:30:00"},
                {"session_id":"s2","title":null,"created_at":"not a date"},
                {"session_id":"s3"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(list.sessions.len(), 3);
        assert_eq!(list.sessions[0].display_title(), "Admissions");
        assert!(list.sessions[0].created_at.is_some());
        assert_eq!(list.sessions[1].display_title(), "New Chat");
        assert!(list.sessions[1].created_at.is_none());
        assert!(list.sessions[2].created_at.is_none());
    }

    #[test]
    fn test_missing_sessions_field_is_empty() {
        let list: SessionList = serde_json::from_str("{}").unwrap();
        assert!(list.sessions.is_empty());
    }

    #[test]
    fn test_message_roles() {
        let history: MessageHistory = serde_json::from_str(
            r#"{"messages":[
                {"role":"user","content":"hi"},
                {"role":"assistant","content":"hello","timestamp":"2025-01-12T10:30:00Z"},
                {"role":"system","content":"x"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(history.messages[0].role, Role::User);
        assert_eq!(history.messages[1].role, Role::Assistant);
        assert!(history.messages[1].timestamp.is_some());
        assert_eq!(history.messages[2].role, Role::Other);
    }
}
