//! HTTP Client
//!
//! Thin JSON request/response layer over `reqwest`. Every failure is mapped
//! into the sync error taxonomy before it leaves this module.

use log::debug;
use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::domain::{SyncError, SyncResult};

/// Connection to the dashboard API
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> SyncResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SyncError::Unknown(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `alerts/read-all`
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str, authenticated: bool) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match (&self.token, authenticated) {
            (Some(token), true) => builder.bearer_auth(token),
            _ => builder,
        }
    }

    pub async fn get_json<R: DeserializeOwned>(
        &self,
        path: &str,
        authenticated: bool,
    ) -> SyncResult<R> {
        let response = self.execute(self.request(Method::GET, path, authenticated)).await?;
        decode(response).await
    }

    pub async fn send_json<B, R>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        authenticated: bool,
    ) -> SyncResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let builder = self.request(method, path, authenticated).json(body);
        let response = self.execute(builder).await?;
        decode(response).await
    }

    /// Bodiless request whose response body is ignored
    pub async fn send_empty(
        &self,
        method: Method,
        path: &str,
        authenticated: bool,
    ) -> SyncResult<()> {
        self.execute(self.request(method, path, authenticated)).await?;
        Ok(())
    }

    /// Bodiless request returning a JSON record
    pub async fn send_for_json<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        authenticated: bool,
    ) -> SyncResult<R> {
        let response = self.execute(self.request(method, path, authenticated)).await?;
        decode(response).await
    }

    pub async fn send_multipart<R: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
        authenticated: bool,
    ) -> SyncResult<R> {
        let builder = self.request(Method::POST, path, authenticated).multipart(form);
        let response = self.execute(builder).await?;
        decode(response).await
    }

    async fn execute(&self, builder: RequestBuilder) -> SyncResult<Response> {
        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        debug!("event=http_response url={} status={}", response.url(), status.as_u16());
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(map_status(status.as_u16(), &body))
    }
}

async fn decode<R: DeserializeOwned>(response: Response) -> SyncResult<R> {
    let bytes = response.bytes().await.map_err(map_transport_error)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| SyncError::Unknown(format!("undecodable response: {}", e)))
}

/// Map a `reqwest` failure that happened before a status was received
pub fn map_transport_error(err: reqwest::Error) -> SyncError {
    if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
        SyncError::NetworkFailure(err.to_string())
    } else {
        SyncError::Unknown(err.to_string())
    }
}

/// Map a non-success HTTP status (and its body) to a sync error
pub fn map_status(status: u16, body: &str) -> SyncError {
    let detail = error_detail(body);
    let text = detail.clone().unwrap_or_else(|| format!("HTTP {}", status));
    match status {
        404 => SyncError::NotFound(text),
        409 => SyncError::Conflict(text),
        400 | 422 => SyncError::ValidationFailure(text),
        _ => match detail {
            Some(detail) => SyncError::Unknown(format!("HTTP {}: {}", status, detail)),
            None => SyncError::Unknown(text),
        },
    }
}

/// Server `detail` text: a plain string, or the `msg` list of a validation error
fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}
