//! Fetch client applying the storefront's background-request conventions.

use std::rc::Rc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::{HttpRequest, HttpResponse, Transport};

/// Header marking a request as AJAX for the backend.
pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";

/// Error type for fetch operations.
///
/// `Display` renders the text shown to shoppers after the action prefix,
/// so the HTTP variant keeps the storefront's wording.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Erreur HTTP {status}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Connection(String),

    #[error("Invalid JSON response: {0}")]
    Deserialization(String),
}

impl FetchError {
    /// HTTP status, for HTTP errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Per-client request policy.
#[derive(Debug, Clone, Default)]
pub struct FetchPolicy {
    /// Overall deadline. `None` relies on the transport's own behaviour.
    pub timeout: Option<Duration>,
}

impl FetchPolicy {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

/// Background request client.
///
/// Adds the AJAX marker header to every request, applies the policy
/// deadline and turns non-2xx responses into [`FetchError::Http`].
#[derive(Clone)]
pub struct FetchClient {
    transport: Rc<dyn Transport>,
    default_headers: Vec<(String, String)>,
    policy: FetchPolicy,
}

impl FetchClient {
    /// Create a client over a transport.
    pub fn new(transport: Rc<dyn Transport>) -> Self {
        Self {
            transport,
            default_headers: vec![(
                REQUESTED_WITH_HEADER.to_string(),
                "XMLHttpRequest".to_string(),
            )],
            policy: FetchPolicy::default(),
        }
    }

    /// Set the request policy.
    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Add a header sent with every request (unless the request sets it).
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Send a request and return the raw response, whatever its status.
    pub async fn send(&self, mut request: HttpRequest) -> Result<HttpResponse, FetchError> {
        for (name, value) in &self.default_headers {
            if request.header(name).is_none() {
                request.set_header(name.clone(), value.clone());
            }
        }

        let method = request.method;
        let url = request.url.clone();
        tracing::debug!(%method, url = %url, "Sending background request");

        let result = match self.policy.timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.send(request))
                .await
                .unwrap_or(Err(FetchError::Timeout(limit))),
            None => self.transport.send(request).await,
        };

        match &result {
            Ok(resp) => {
                tracing::debug!(%method, url = %url, status = resp.status, "Response received")
            }
            Err(e) => tracing::warn!(%method, url = %url, error = %e, "Background request failed"),
        }
        result
    }

    /// Send a request and decode a JSON body.
    ///
    /// Non-2xx responses become [`FetchError::Http`] carrying the body text.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
    ) -> Result<T, FetchError> {
        let url = request.url.clone();
        let resp = self.send(request).await?;

        if !resp.is_ok() {
            return Err(FetchError::Http {
                status: resp.status,
                url,
                body: resp.text(),
            });
        }

        resp.json_body()
            .map_err(|e| FetchError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Method, MockTransport, Reply};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Ack {
        success: bool,
    }

    #[tokio::test]
    async fn test_adds_ajax_header() {
        let mock = Rc::new(MockTransport::new());
        mock.respond_json(Method::Post, "/x/", 200, json!({"success": true}));
        let client = FetchClient::new(mock.clone());

        let ack: Ack = client.send_json(HttpRequest::post("/x/")).await.unwrap();
        assert!(ack.success);
        assert_eq!(
            mock.requests()[0].header("X-Requested-With"),
            Some("XMLHttpRequest")
        );
    }

    #[tokio::test]
    async fn test_http_error_carries_status_and_body() {
        let mock = Rc::new(MockTransport::new());
        mock.respond_text(Method::Post, "/x/", 500, "Server Error");
        let client = FetchClient::new(mock);

        let err = client
            .send_json::<Ack>(HttpRequest::post("/x/"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "Erreur HTTP 500: Server Error");
    }

    #[tokio::test]
    async fn test_bad_json_is_deserialization_error() {
        let mock = Rc::new(MockTransport::new());
        mock.respond_text(Method::Post, "/x/", 200, "<html>");
        let client = FetchClient::new(mock);

        let err = client
            .send_json::<Ack>(HttpRequest::post("/x/"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Deserialization(_)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let mock = Rc::new(MockTransport::new());
        mock.push(Method::Post, "/slow/", Reply::Pending);
        let client = FetchClient::new(mock)
            .with_policy(FetchPolicy::new(Some(Duration::from_millis(10))));

        let err = client.send(HttpRequest::post("/slow/")).await.unwrap_err();
        assert_eq!(err, FetchError::Timeout(Duration::from_millis(10)));
    }

    #[tokio::test]
    async fn test_network_failure() {
        let mock = Rc::new(MockTransport::new());
        mock.push(Method::Post, "/x/", Reply::Fail("Failed to fetch".into()));
        let client = FetchClient::new(mock);

        let err = client.send(HttpRequest::post("/x/")).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch");
    }
}
