//! Transport seam between the controller and whatever actually sends bytes.

use async_trait::async_trait;

use crate::{FetchError, HttpRequest, HttpResponse};

/// Sends a background request and yields the raw response.
///
/// Page scripting is single-threaded, so implementations are not required
/// to be `Send`. A non-2xx status is a successful send; only failures to
/// obtain a response are errors.
#[async_trait(?Send)]
pub trait Transport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError>;
}

/// Transport backed by the Spin host's outbound HTTP.
///
/// Relative URLs are resolved against `origin`.
#[cfg(feature = "spin")]
#[derive(Debug, Clone)]
pub struct SpinTransport {
    origin: String,
}

#[cfg(feature = "spin")]
impl SpinTransport {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }

    fn resolve(&self, url: &str) -> String {
        if url.contains("://") {
            url.to_string()
        } else {
            format!("{}{}", self.origin, url)
        }
    }
}

#[cfg(feature = "spin")]
#[async_trait(?Send)]
impl Transport for SpinTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let method = match request.method {
            crate::Method::Get => spin_sdk::http::Method::Get,
            crate::Method::Post => spin_sdk::http::Method::Post,
        };

        let mut builder = spin_sdk::http::Request::builder();
        builder.method(method).uri(self.resolve(&request.url));
        for (name, value) in &request.headers {
            builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder.body(body);
        }

        let resp: spin_sdk::http::Response = spin_sdk::http::send(builder.build())
            .await
            .map_err(|e| FetchError::Connection(e.to_string()))?;

        Ok(HttpResponse::new(*resp.status(), resp.body().to_vec()))
    }
}
