//! Scripted shopper sessions.
//!
//! ```toml
//! cookies = "csrftoken=abc"
//!
//! [[responses]]
//! path = "/cart/add/42/"
//! json = { success = true, message = "Produit ajouté au panier", cart_count = 3 }
//!
//! [[steps]]
//! action = "set-value"
//! selector = "input[name=quantity]"
//! value = "3"
//!
//! [[steps]]
//! action = "submit"
//! selector = ".add-to-cart-form"
//! ```

use std::fmt;
use std::path::Path;

use anyhow::{bail, Context as _, Result};
use product_detail::storefront_fetch::{HttpResponse, Method, Reply};
use serde::Deserialize;

/// A scenario file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Product id; detected from the page when absent.
    #[serde(default)]
    pub product_id: Option<String>,

    /// `document.cookie` at page load.
    #[serde(default)]
    pub cookies: String,

    /// Whether a toast surface is present.
    #[serde(default = "default_true")]
    pub toast: bool,

    #[serde(default)]
    pub responses: Vec<CannedResponse>,

    #[serde(default)]
    pub steps: Vec<Step>,

    /// Elements whose markup is printed after the run.
    #[serde(default)]
    pub show: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid scenario: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// A canned backend reply. Replies for the same route are served in order,
/// the last one repeating.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CannedResponse {
    #[serde(default = "default_method")]
    pub method: String,
    pub path: String,
    #[serde(default = "default_status")]
    pub status: u16,
    /// JSON body.
    #[serde(default)]
    pub json: Option<serde_json::Value>,
    /// Plain-text body.
    #[serde(default)]
    pub body: Option<String>,
    /// Simulate a network failure with this message.
    #[serde(default)]
    pub fail: Option<String>,
    /// Never answer.
    #[serde(default)]
    pub hang: bool,
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_status() -> u16 {
    200
}

impl CannedResponse {
    pub fn method(&self) -> Result<Method> {
        match self.method.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            other => bail!("Unsupported method {other} for {}", self.path),
        }
    }

    pub fn reply(&self) -> Result<Reply> {
        let reply = match (&self.fail, &self.json, &self.body, self.hang) {
            (_, _, _, true) => Reply::Pending,
            (Some(message), None, None, false) => Reply::Fail(message.clone()),
            (None, Some(json), None, false) => {
                Reply::Respond(HttpResponse::json(self.status, json))
            }
            (None, None, body, false) => {
                Reply::Respond(HttpResponse::new(self.status, body.clone().unwrap_or_default()))
            }
            _ => bail!("Response for {} sets more than one of json, body, fail", self.path),
        };
        Ok(reply)
    }
}

/// One shopper action or the passage of time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    /// Set a form control's value.
    SetValue { selector: String, value: String },
    /// Check a radio/checkbox and fire `change`.
    Check { selector: String },
    Click { selector: String },
    Submit { selector: String },
    /// Pointer enters (or leaves) a carousel.
    Hover {
        selector: String,
        #[serde(default = "default_true")]
        on: bool,
    },
    /// Let time pass: carousels cycle, deferred callbacks run.
    Advance { ms: u64 },
    /// Dismiss a modal.
    ModalHidden {
        #[serde(default = "default_modal")]
        selector: String,
    },
}

fn default_modal() -> String {
    "#imageModal".to_string()
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetValue { selector, value } => write!(f, "set {selector} = {value:?}"),
            Self::Check { selector } => write!(f, "check {selector}"),
            Self::Click { selector } => write!(f, "click {selector}"),
            Self::Submit { selector } => write!(f, "submit {selector}"),
            Self::Hover { selector, on: true } => write!(f, "hover {selector}"),
            Self::Hover { selector, on: false } => write!(f, "leave {selector}"),
            Self::Advance { ms } => write!(f, "wait {ms} ms"),
            Self::ModalHidden { selector } => write!(f, "dismiss {selector}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::parse(
            r#"
            cookies = "csrftoken=abc"

            [[responses]]
            path = "/cart/add/42/"
            json = { success = true, message = "ok", cart_count = 3 }

            [[responses]]
            path = "/products/42/toggle-favorite/"
            status = 500
            body = "boom"

            [[steps]]
            action = "set-value"
            selector = "input[name=quantity]"
            value = "3"

            [[steps]]
            action = "advance"
            ms = 2000

            [[steps]]
            action = "modal-hidden"
            "#,
        )
        .unwrap();

        assert!(scenario.toast);
        assert_eq!(scenario.responses.len(), 2);
        assert_eq!(scenario.responses[0].method().unwrap(), Method::Post);
        assert!(matches!(
            scenario.responses[1].reply().unwrap(),
            Reply::Respond(r) if r.status == 500
        ));
        assert_eq!(
            scenario.steps,
            vec![
                Step::SetValue {
                    selector: "input[name=quantity]".to_string(),
                    value: "3".to_string()
                },
                Step::Advance { ms: 2000 },
                Step::ModalHidden {
                    selector: "#imageModal".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_conflicting_bodies_rejected() {
        let scenario = Scenario::parse(
            r#"
            [[responses]]
            path = "/x/"
            body = "a"
            fail = "b"
            "#,
        )
        .unwrap();
        assert!(scenario.responses[0].reply().is_err());
    }

    #[test]
    fn test_unknown_action_rejected() {
        assert!(Scenario::parse("[[steps]]\naction = \"scroll\"\n").is_err());
    }
}
