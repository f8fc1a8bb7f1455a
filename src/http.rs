//! HTTP client abstraction for outbound calls.
//!
//! This module defines the `HttpClient` trait to abstract HTTP request
//! execution, enabling testability with mock implementations. Both the
//! generation service and the feed delivery channel go through it.

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// An outbound HTTP request to an external service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// The base URL of the target endpoint (e.g., <https://openrouter.ai/api/v1>)
    pub endpoint: String,
    /// HTTP method (e.g., "POST")
    pub method: String,
    /// The path portion of the URL (e.g., "/chat/completions")
    pub path: String,
    /// The request body as a JSON string
    pub body: String,
}

/// Response from an HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as a string
    pub body: String,
}

/// Trait for executing HTTP requests.
///
/// This abstraction allows for different implementations (production vs.
/// testing) and makes the pipeline logic testable without making real HTTP
/// calls.
#[async_trait]
pub trait HttpClient: Send + Sync + Clone {
    /// Execute an HTTP request.
    ///
    /// # Arguments
    /// * `request` - The request containing endpoint, method, path, and body
    /// * `api_key` - API key to include in Authorization: Bearer header
    /// * `timeout_ms` - Request timeout in milliseconds
    ///
    /// # Errors
    /// Returns an error if the request fails due to network issues, times
    /// out, or the URL is invalid. Non-2xx responses are NOT errors; callers
    /// classify them from the returned status.
    async fn execute(
        &self,
        request: &OutboundRequest,
        api_key: &str,
        timeout_ms: u64,
    ) -> Result<HttpResponse>;
}

// ============================================================================
// Production Implementation using reqwest
// ============================================================================

/// Production HTTP client using reqwest.
#[derive(Clone, Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    #[tracing::instrument(skip(self, request, api_key), fields(method = %request.method, path = %request.path))]
    async fn execute(
        &self,
        request: &OutboundRequest,
        api_key: &str,
        timeout_ms: u64,
    ) -> Result<HttpResponse> {
        let url = format!("{}{}", request.endpoint, request.path);

        tracing::debug!(url = %url, timeout_ms, "Executing HTTP request");

        let mut req = self
            .client
            .request(
                request.method.parse().map_err(|e| {
                    tracing::error!(method = %request.method, error = %e, "Invalid HTTP method");
                    anyhow::anyhow!("Invalid HTTP method '{}': {}", request.method, e)
                })?,
                &url,
            )
            .timeout(Duration::from_millis(timeout_ms));

        // Only add Authorization header if api_key is not empty
        if !api_key.is_empty() {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        if !request.body.is_empty() {
            req = req
                .header("Content-Type", "application/json")
                .body(request.body.clone());
        }

        let response = req.send().await.map_err(|e| {
            tracing::error!(url = %url, error = %e, "HTTP request failed");
            e
        })?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::debug!(status, response_len = body.len(), "HTTP request completed");

        Ok(HttpResponse { status, body })
    }
}

// ============================================================================
// Test/Mock Implementation
// ============================================================================

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Mock HTTP client for testing.
///
/// Allows configuring predetermined responses for specific requests without
/// making actual HTTP calls.
///
/// # Example
/// ```ignore
/// let mock = MockHttpClient::new();
/// mock.add_response(
///     "POST /chat/completions",
///     Ok(HttpResponse {
///         status: 200,
///         body: r#"{"choices":[...]}"#.to_string(),
///     }),
/// );
/// ```
#[derive(Clone, Default)]
pub struct MockHttpClient {
    responses: Arc<Mutex<HashMap<String, Vec<Result<HttpResponse>>>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

/// Record of a call made to the mock HTTP client.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub method: String,
    pub endpoint: String,
    pub path: String,
    pub body: String,
    pub api_key: String,
    pub timeout_ms: u64,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predetermined response for a specific method and path.
    ///
    /// The key is formatted as "{method} {path}". Multiple responses can be
    /// added for the same key - they will be returned in FIFO order.
    pub fn add_response(&self, key: &str, response: Result<HttpResponse>) {
        self.responses
            .lock()
            .entry(key.to_string())
            .or_default()
            .push(response);
    }

    /// Get all calls that have been made to this mock client.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn execute(
        &self,
        request: &OutboundRequest,
        api_key: &str,
        timeout_ms: u64,
    ) -> Result<HttpResponse> {
        self.calls.lock().push(MockCall {
            method: request.method.clone(),
            endpoint: request.endpoint.clone(),
            path: request.path.clone(),
            body: request.body.clone(),
            api_key: api_key.to_string(),
            timeout_ms,
        });

        let key = format!("{} {}", request.method, request.path);
        let response = {
            let mut responses = self.responses.lock();
            match responses.get_mut(&key) {
                Some(queue) if !queue.is_empty() => Some(queue.remove(0)),
                _ => None,
            }
        };

        match response {
            Some(response) => response,
            None => Err(crate::error::TidecastError::Other(anyhow::anyhow!(
                "No mock response configured for {} {}",
                request.method,
                request.path
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_request(method: &str, path: &str) -> OutboundRequest {
        OutboundRequest {
            endpoint: "https://api.example.com".to_string(),
            method: method.to_string(),
            path: path.to_string(),
            body: "{}".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_client_basic() {
        let mock = MockHttpClient::new();
        mock.add_response(
            "POST /test",
            Ok(HttpResponse {
                status: 200,
                body: "success".to_string(),
            }),
        );

        let request = test_request("POST", "/test");
        let response = mock.execute(&request, "test-key", 5000).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "success");

        // Verify call was recorded
        let calls = mock.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "POST");
        assert_eq!(calls[0].path, "/test");
        assert_eq!(calls[0].api_key, "test-key");
    }

    #[tokio::test]
    async fn test_mock_client_multiple_responses() {
        let mock = MockHttpClient::new();
        mock.add_response(
            "GET /status",
            Ok(HttpResponse {
                status: 200,
                body: "first".to_string(),
            }),
        );
        mock.add_response(
            "GET /status",
            Ok(HttpResponse {
                status: 200,
                body: "second".to_string(),
            }),
        );

        let request = test_request("GET", "/status");
        let response1 = mock.execute(&request, "key", 5000).await.unwrap();
        assert_eq!(response1.body, "first");

        let response2 = mock.execute(&request, "key", 5000).await.unwrap();
        assert_eq!(response2.body, "second");

        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_client_no_response() {
        let mock = MockHttpClient::new();

        let request = test_request("POST", "/unknown");
        let result = mock.execute(&request, "key", 5000).await;
        assert!(result.is_err());
    }
}
