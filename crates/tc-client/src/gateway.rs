//! HTTP gateway to the triage backend.
//!
//! Every call resolves to `Ok(payload)` or a [`GatewayError`] whose display
//! text is the message shown to the operator. There is no retry and no
//! caching; callers decide what to do with a failure.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the client-chosen idempotency key on alert submission.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Errors produced by the gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The backend could not be reached.
    #[error("Connection failed: {0}")]
    Transport(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    /// A non-empty body that is not JSON.
    #[error("Invalid JSON from server ({status})")]
    MalformedBody { status: u16 },

    /// Well-formed JSON that does not match the endpoint's shape.
    #[error("Unexpected response from server ({status}): {message}")]
    Schema { status: u16, message: String },

    /// A non-2xx status. `detail` is the server's message or `HTTP <status>`.
    #[error("{detail}")]
    Status { status: u16, detail: String },

    /// The console refused to build the request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Client configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// HTTP status attached to the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::MalformedBody { status }
            | Self::Schema { status, .. }
            | Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the backend answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_builder() {
            Self::InvalidRequest(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Parses a response body and applies the status policy.
///
/// An empty body reads as `{}`. A non-empty body must be JSON regardless of
/// status. A non-2xx status fails with the body's `detail` field, or with
/// `HTTP <status>` when there is none.
pub fn decode_body(status: StatusCode, text: &str) -> GatewayResult<Value> {
    let body = if text.trim().is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_str(text).map_err(|_| GatewayError::MalformedBody {
            status: status.as_u16(),
        })?
    };

    if !status.is_success() {
        return Err(status_error(status, Some(&body)));
    }
    Ok(body)
}

/// [`decode_body`] followed by a typed decode of the payload.
pub fn decode_json<T: DeserializeOwned>(status: StatusCode, text: &str) -> GatewayResult<T> {
    let body = decode_body(status, text)?;
    serde_json::from_value(body).map_err(|e| GatewayError::Schema {
        status: status.as_u16(),
        message: e.to_string(),
    })
}

/// Status policy for non-JSON documents: the body is returned as-is on 2xx.
///
/// Error bodies are still searched for a JSON `detail` field.
pub fn decode_text(status: StatusCode, text: String) -> GatewayResult<String> {
    if status.is_success() {
        return Ok(text);
    }
    let body = serde_json::from_str::<Value>(&text).ok();
    Err(status_error(status, body.as_ref()))
}

fn status_error(status: StatusCode, body: Option<&Value>) -> GatewayError {
    let detail = match body.and_then(|b| b.get("detail")) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => format!("HTTP {}", status.as_u16()),
        Some(other) => other.to_string(),
    };
    GatewayError::Status {
        status: status.as_u16(),
        detail,
    }
}

/// Thin wrapper over a reqwest client bound to one backend.
#[derive(Debug, Clone)]
pub struct Gateway {
    client: Client,
    base_url: String,
}

impl Gateway {
    /// Creates a gateway for `base_url` with the given request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> GatewayResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(GatewayError::Config("base URL is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Gets the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds a URL from a path.
    pub fn build_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET a JSON document.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> GatewayResult<T> {
        let request = self
            .client
            .get(self.build_url(path))
            .query(query)
            .header(reqwest::header::ACCEPT, "application/json");
        let (status, text) = self.send("GET", path, request).await?;
        decode_json(status, &text).map_err(|e| {
            warn!(path = %path, error = %e, "GET failed");
            e
        })
    }

    /// POST a JSON body and decode the JSON answer.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        headers: &[(&str, &str)],
    ) -> GatewayResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self
            .client
            .post(self.build_url(path))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let (status, text) = self.send("POST", path, request).await?;
        decode_json(status, &text).map_err(|e| {
            warn!(path = %path, error = %e, "POST failed");
            e
        })
    }

    /// GET a plain-text document.
    pub async fn get_text(&self, path: &str) -> GatewayResult<String> {
        let request = self.client.get(self.build_url(path));
        let (status, text) = self.send("GET", path, request).await?;
        decode_text(status, text).map_err(|e| {
            warn!(path = %path, error = %e, "GET failed");
            e
        })
    }

    /// Issues a GET and reports only the status code.
    pub async fn probe(&self, path: &str) -> GatewayResult<StatusCode> {
        let request = self.client.get(self.build_url(path));
        let (status, _) = self.send("GET", path, request).await?;
        Ok(status)
    }

    async fn send(
        &self,
        method: &'static str,
        path: &str,
        request: RequestBuilder,
    ) -> GatewayResult<(StatusCode, String)> {
        let response = request.send().await.map_err(|e| {
            let err = GatewayError::from(e);
            warn!(method, path = %path, error = %err, "Request failed");
            err
        })?;

        let status = response.status();
        debug!(method, path = %path, status = status.as_u16(), "Backend responded");

        let text = response.text().await.map_err(GatewayError::from)?;
        Ok((status, text))
    }
}
