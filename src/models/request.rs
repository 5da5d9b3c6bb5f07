// Outbound request descriptor

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::auth::REFRESH_PATH;

/// Request payload
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// application/x-www-form-urlencoded
    Form(Vec<(String, String)>),
    /// Single-file multipart upload
    File {
        field: String,
        file_name: String,
        mime: String,
        bytes: Vec<u8>,
    },
}

/// Immutable description of an API call.
///
/// The descriptor can be sent any number of times; which attempt is being
/// made is tracked separately by [`Attempt`].
#[derive(Debug, Clone)]
pub struct ApiRequest {
    id: String,
    method: Method,
    path: String,
    body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string()[..8].to_string(),
            method,
            path: path.into(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn with_json<T: Serialize>(self, body: &T) -> serde_json::Result<Self> {
        Ok(Self {
            body: RequestBody::Json(serde_json::to_value(body)?),
            ..self
        })
    }

    pub fn with_form(self, fields: &[(&str, &str)]) -> Self {
        let fields = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            body: RequestBody::Form(fields),
            ..self
        }
    }

    pub fn with_file(
        self,
        field: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            body: RequestBody::File {
                field: field.into(),
                file_name: file_name.into(),
                mime: mime.into(),
                bytes,
            },
            ..self
        }
    }

    /// Short identifier used to correlate log lines
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Whether this request targets the token refresh endpoint
    pub fn is_refresh_endpoint(&self) -> bool {
        let path = self
            .path
            .split('?')
            .next()
            .unwrap_or_default()
            .trim_matches('/');
        let refresh = REFRESH_PATH.trim_start_matches('/');

        path == refresh || path.ends_with(REFRESH_PATH)
    }

    pub fn url(&self, base_url: &str) -> String {
        join_url(base_url, &self.path)
    }
}

/// Which send of a request is being made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Initial,
    /// The one resend allowed after a token refresh
    Retry,
}

impl Attempt {
    pub fn is_retry(self) -> bool {
        self == Attempt::Retry
    }
}

/// Join a base URL and an endpoint path with exactly one slash between them
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
