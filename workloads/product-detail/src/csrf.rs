//! Anti-forgery token lookup.

use std::fmt;

use storefront_dom::{NodeId, Page};

use crate::config::CsrfConfig;
use crate::error::{ActionError, ActionResult};

/// Where a token may be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsrfSource {
    /// A named input inside the triggering form.
    FormField(String),
    /// A cookie on the document.
    Cookie(String),
}

/// A non-empty anti-forgery token.
#[derive(Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens stay out of logs.
impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CsrfToken(..)")
    }
}

/// Sources tried for a cart form: the hidden field, then the cookie.
pub fn cart_sources(config: &CsrfConfig) -> Vec<CsrfSource> {
    vec![
        CsrfSource::FormField(config.form_field.clone()),
        CsrfSource::Cookie(config.cookie.clone()),
    ]
}

/// Sources tried for the favorite button: the cookie only.
pub fn favorite_sources(config: &CsrfConfig) -> Vec<CsrfSource> {
    vec![CsrfSource::Cookie(config.cookie.clone())]
}

/// First non-empty token among `sources`, in order. `scope` is the
/// triggering form or control.
pub fn find_token(page: &Page, scope: NodeId, sources: &[CsrfSource]) -> ActionResult<CsrfToken> {
    for source in sources {
        let value = match source {
            CsrfSource::FormField(name) => page
                .query_in(scope, &format!("input[name=\"{name}\"]"))?
                .and_then(|input| page.value(input))
                .map(str::to_string),
            CsrfSource::Cookie(name) => page.cookies().get(name),
        };
        if let Some(token) = value.filter(|v| !v.trim().is_empty()) {
            return Ok(CsrfToken(token));
        }
    }
    Err(ActionError::MissingCsrfToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = r#"<body><form id="f">
        <input type="hidden" name="csrfmiddlewaretoken" value="from-field">
    </form><form id="empty"><input type="hidden" name="csrfmiddlewaretoken" value=""></form></body>"#;

    #[test]
    fn test_field_wins_over_cookie() {
        let page = Page::from_html(FORM).unwrap().with_cookies("csrftoken=from-cookie");
        let form = page.get_element_by_id("f").unwrap();
        let token = find_token(&page, form, &cart_sources(&CsrfConfig::default())).unwrap();
        assert_eq!(token.as_str(), "from-field");
    }

    #[test]
    fn test_empty_field_falls_back_to_cookie() {
        let page = Page::from_html(FORM).unwrap().with_cookies("a=1; csrftoken=from%20cookie");
        let form = page.get_element_by_id("empty").unwrap();
        let token = find_token(&page, form, &cart_sources(&CsrfConfig::default())).unwrap();
        assert_eq!(token.as_str(), "from cookie");
    }

    #[test]
    fn test_missing_everywhere() {
        let page = Page::from_html(FORM).unwrap();
        let form = page.get_element_by_id("empty").unwrap();
        let err = find_token(&page, form, &favorite_sources(&CsrfConfig::default())).unwrap_err();
        assert_eq!(err, ActionError::MissingCsrfToken);
    }

    #[test]
    fn test_debug_hides_value() {
        let page = Page::new().with_cookies("csrftoken=secret");
        let sources = favorite_sources(&CsrfConfig::default());
        let token = find_token(&page, page.body(), &sources).unwrap();
        assert!(!format!("{token:?}").contains("secret"));
    }
}
