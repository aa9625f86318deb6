//! Remote service gateway
//!
//! The gateway is the only place that performs network IO. It turns every
//! non-success response into a classified [`HostError`] so the layers above
//! never look at raw status codes.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use tracing::debug;

use gantry_core::{HostError, HostResult};

/// Header GitLab uses to advertise the next page of a listing
pub const NEXT_PAGE_HEADER: &str = "x-next-page";

/// Body of an API request
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    /// No body
    #[default]
    Empty,
    /// JSON document
    Json(serde_json::Value),
    /// Raw bytes sent as `application/octet-stream`
    Bytes(Bytes),
    /// Single-file multipart form under the `file` field
    Multipart { file_name: String, content: Bytes },
}

/// A request relative to the API base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Path below the API base URL, already percent-encoded
    pub path: String,
    /// Query parameters
    pub query: Vec<(String, String)>,
    /// Request body
    pub body: RequestBody,
}

impl ApiRequest {
    /// Create a request with no query and no body
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    /// GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// POST request
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// PUT request
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// DELETE request
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a query parameter
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set a JSON body
    pub fn with_json(mut self, value: serde_json::Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    /// Set a raw byte body
    pub fn with_bytes(mut self, content: Bytes) -> Self {
        self.body = RequestBody::Bytes(content);
        self
    }

    /// Set a single-file multipart body
    pub fn with_file(mut self, file_name: impl Into<String>, content: Bytes) -> Self {
        self.body = RequestBody::Multipart {
            file_name: file_name.into(),
            content,
        };
        self
    }

    /// Value of a query parameter, if present
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A successful (2xx) response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Next page of a paginated listing, if any
    pub next_page: Option<u32>,
    /// Raw response body
    pub body: Bytes,
}

impl ApiResponse {
    /// Create a response with no pagination cursor
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            next_page: None,
            body: body.into(),
        }
    }

    /// Set the pagination cursor
    pub fn with_next_page(mut self, page: u32) -> Self {
        self.next_page = Some(page);
        self
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> HostResult<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| HostError::InvalidResponse(format!("failed to decode response: {}", e)))
    }
}

/// Transport used by the client for every network round trip.
///
/// Implementations return `Ok` only for 2xx responses and map everything else
/// through [`HostError::from_status`] or to [`HostError::Transport`].
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Perform one request
    async fn send(&self, request: &ApiRequest) -> HostResult<ApiResponse>;
}

/// Gateway backed by `reqwest`
pub struct HttpGateway {
    base_url: String,
    token: String,
    client: Client,
}

impl HttpGateway {
    /// Create a new HTTP gateway.
    ///
    /// `base_url` is the fully resolved API root (e.g. `https://gitlab.com/api/v4`).
    /// `token` is attached as a bearer credential on every request.
    pub fn new(base_url: &str, token: impl Into<String>, timeout: Duration) -> HostResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HostError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn send(&self, request: &ApiRequest) -> HostResult<ApiResponse> {
        let url = self.url(&request.path);
        debug!(method = %request.method, url = %url, "GitLab API request");

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .bearer_auth(&self.token);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Bytes(content) => builder
                .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                .body(content.clone()),
            RequestBody::Multipart { file_name, content } => {
                let part = Part::bytes(content.to_vec()).file_name(file_name.clone());
                builder.multipart(Form::new().part("file", part))
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|e| HostError::Transport(e.to_string()))?;

        let status = response.status();
        let next_page = response
            .headers()
            .get(NEXT_PAGE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|page| *page > 0);
        let body = response
            .bytes()
            .await
            .map_err(|e| HostError::Transport(e.to_string()))?;

        debug!(status = status.as_u16(), bytes = body.len(), "GitLab API response");

        if !status.is_success() {
            return Err(HostError::from_status(
                status.as_u16(),
                error_message(&body),
            ));
        }

        Ok(ApiResponse {
            status: status.as_u16(),
            next_page,
            body,
        })
    }
}

/// Extract a readable message from a GitLab error body.
///
/// GitLab reports errors as `{"message": ...}` or `{"error": ...}` where the
/// message may itself be a string, a list, or a field map.
pub fn error_message(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            match value.get(key) {
                Some(serde_json::Value::String(s)) => return s.clone(),
                Some(other) if !other.is_null() => return other.to_string(),
                _ => {}
            }
        }
    }
    String::from_utf8_lossy(body).trim().to_string()
}
