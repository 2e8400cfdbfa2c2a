//! Transport boundary for HTTP I/O.
//!
//! Everything the wizard fetches goes through [`HttpTransport`], so the
//! GitLab client can be exercised in tests without sockets. The wizard
//! only ever issues GET requests.

use async_trait::async_trait;
use thiserror::Error;

/// A minimal HTTP response: status plus raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("http transport error: {0}")]
    Transport(String),

    #[error("no mock response registered for {0}")]
    NoMockResponse(String),
}

/// Transport boundary for all HTTP I/O.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse, HttpError>;
}

/// Real transport backed by reqwest.
///
/// No timeout, retry, or redirect policy is applied locally beyond what
/// the builder configures; everything else is the client default.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn with_timeout(timeout: std::time::Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HttpError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse, HttpError> {
        let mut builder = self.client.get(url);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?
            .to_vec();

        Ok(HttpResponse { status, body })
    }
}

// ---------- Test-only mock transport ----------

/// A GET request as the mock transport observed it.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MockRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// In-memory transport for unit tests: canned responses per URL,
/// returned FIFO when several are queued, with request recording.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    inner: std::sync::Arc<std::sync::Mutex<MockInner>>,
}

#[cfg(test)]
#[derive(Default)]
struct MockInner {
    routes: std::collections::HashMap<String, std::collections::VecDeque<HttpResponse>>,
    requests: Vec<MockRequest>,
}

#[cfg(test)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) {
        let mut inner = self.inner.lock().expect("mock transport lock");
        inner.routes.entry(url.into()).or_default().push_back(HttpResponse {
            status,
            body: body.into(),
        });
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        self.inner.lock().expect("mock transport lock").requests.clone()
    }
}

#[cfg(test)]
#[async_trait]
impl HttpTransport for MockTransport {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse, HttpError> {
        let mut inner = self.inner.lock().expect("mock transport lock");
        inner.requests.push(MockRequest {
            url: url.to_string(),
            headers: headers.to_vec(),
        });
        match inner.routes.get_mut(url).and_then(|queue| queue.pop_front()) {
            Some(resp) => Ok(resp),
            None => Err(HttpError::NoMockResponse(url.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn mock_transport_returns_queued_responses_in_order() {
        let transport = MockTransport::new();
        let url = "https://gitlab.example.com/api/v4/groups";

        transport.push_response(url, 200, b"[]".to_vec());
        transport.push_response(url, 500, b"oops".to_vec());

        let first = transport.get(url, &[]).await.expect("first response");
        assert_eq!(first.status, 200);
        assert_eq!(first.body, b"[]".to_vec());

        let second = transport.get(url, &[]).await.expect("second response");
        assert_eq!(second.status, 500);
    }

    #[tokio::test]
    async fn mock_transport_records_requests() {
        let transport = MockTransport::new();
        let url = "https://gitlab.example.com/api/v4/groups";
        transport.push_response(url, 200, b"[]".to_vec());

        let headers = vec![("Authorization".to_string(), "bearer k".to_string())];
        transport.get(url, &headers).await.expect("response");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, url);
        assert_eq!(requests[0].headers, headers);
    }

    #[tokio::test]
    async fn mock_transport_errors_without_a_registered_response() {
        let transport = MockTransport::new();
        let err = transport
            .get("https://gitlab.example.com/missing", &[])
            .await
            .expect_err("missing mock should error");
        assert!(matches!(err, HttpError::NoMockResponse(_)));
    }

    #[test]
    fn reqwest_transport_with_timeout_builds() {
        let transport =
            ReqwestTransport::with_timeout(Duration::from_secs(1)).expect("client should build");
        let _ = transport;
    }
}
