//! HTTP environment abstraction for testability.
//!
//! The pipeline never touches `reqwest` directly; it asks a
//! [`RoutesEnvironment`] to POST a request body and hand back the raw status
//! and body text. Tests swap in a scripted implementation.

use std::future::Future;
use std::pin::Pin;

use crate::request::{COMPUTE_ROUTES_URL, FIELD_MASK};

/// Result type for a routes call.
pub type HttpResult = Result<HttpResponse, TransportError>;

/// Raw reply from the routes service.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// The request never produced a response (connect, timeout, body read).
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("{0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Request(e.to_string())
    }
}

/// Abstraction over the outbound routes call.
pub trait RoutesEnvironment: Send + Sync {
    /// POST `body` to the compute-routes endpoint with `api_key`.
    fn compute_routes(
        &self,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = HttpResult> + Send + '_>>;
}

/// Production implementation using `reqwest`.
pub struct RealRoutesEnvironment {
    client: reqwest::Client,
    endpoint: String,
}

impl RealRoutesEnvironment {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_endpoint(client, COMPUTE_ROUTES_URL)
    }

    pub fn with_endpoint(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RoutesEnvironment for RealRoutesEnvironment {
    fn compute_routes(
        &self,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = HttpResult> + Send + '_>> {
        let api_key = api_key.to_string();
        let body = body.clone();

        Box::pin(async move {
            let resp = self
                .client
                .post(self.endpoint.as_str())
                .header("X-Goog-Api-Key", api_key)
                .header("X-Goog-FieldMask", FIELD_MASK)
                .json(&body)
                .send()
                .await?;

            let status = resp.status().as_u16();
            let body = resp.text().await?;
            Ok(HttpResponse { status, body })
        })
    }
}
