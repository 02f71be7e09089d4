//! Request and response values.

use std::fmt;

use serde::de::DeserializeOwned;
use storefront_dom::percent_encode;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials mode (`fetch` `credentials` option).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Credentials {
    Omit,
    #[default]
    SameOrigin,
    Include,
}

/// Content type of URL-encoded form bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Encode key/value pairs as `application/x-www-form-urlencoded`.
pub fn encode_form(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// An outbound background request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    /// Path (same-origin) or absolute URL.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub credentials: Credentials,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            credentials: Credentials::default(),
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    /// Builder: add a header, replacing any header of the same name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Builder: URL-encoded form body, sets the content type.
    pub fn with_form(mut self, pairs: &[(&str, &str)]) -> Self {
        self.body = Some(encode_form(pairs).into_bytes());
        self.with_header("Content-Type", FORM_CONTENT_TYPE)
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set a header (case-insensitive replace).
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name, value)),
        }
    }

    /// Header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body as UTF-8 text, if any.
    pub fn body_text(&self) -> Option<&str> {
        self.body
            .as_deref()
            .and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Path component of the URL (query and origin stripped).
    pub fn path(&self) -> &str {
        let without_origin = match self.url.find("://") {
            Some(scheme_end) => {
                let rest = &self.url[scheme_end + 3..];
                rest.find('/').map(|i| &rest[i..]).unwrap_or("/")
            }
            None => self.url.as_str(),
        };
        without_origin
            .split(['?', '#'])
            .next()
            .unwrap_or(without_origin)
    }
}

/// A response to a background request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// JSON response with the matching content type.
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: value.to_string().into_bytes(),
        }
    }

    /// `response.ok`: status in 200..=299.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body decoded as JSON.
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_body() {
        let req = HttpRequest::post("/cart/add/7/").with_form(&[("quantity", "2")]);
        assert_eq!(req.body_text(), Some("quantity=2"));
        assert_eq!(
            req.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn test_form_body_encodes() {
        assert_eq!(encode_form(&[("q", "a b&c")]), "q=a%20b%26c");
    }

    #[test]
    fn test_header_replace_case_insensitive() {
        let req = HttpRequest::post("/x")
            .with_header("X-CSRFToken", "a")
            .with_header("x-csrftoken", "b");
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header("X-CSRFToken"), Some("b"));
    }

    #[test]
    fn test_path() {
        assert_eq!(HttpRequest::post("/cart/add/7/?x=1").path(), "/cart/add/7/");
        assert_eq!(
            HttpRequest::post("https://shop.example/products/7/toggle-favorite/").path(),
            "/products/7/toggle-favorite/"
        );
        assert_eq!(HttpRequest::post("https://shop.example").path(), "/");
    }

    #[test]
    fn test_response_ok_range() {
        assert!(HttpResponse::new(204, "").is_ok());
        assert!(!HttpResponse::new(302, "").is_ok());
        assert!(!HttpResponse::new(500, "boom").is_ok());
    }
}
