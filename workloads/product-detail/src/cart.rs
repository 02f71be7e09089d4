//! Add-to-cart form submission.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::Deserialize;
use storefront_dom::{Fragment, FragmentNode, NodeId, Page, Selector, SharedPage};
use storefront_fetch::{Credentials, HttpRequest, FORM_CONTENT_TYPE};

use crate::config::PdpConfig;
use crate::controller::{Outcome, PageController};
use crate::csrf::{self, CsrfToken};
use crate::error::{ActionError, ActionResult};
use crate::guard::InFlight;
use crate::ids::ProductId;

pub const FORM_CLASS: &str = "add-to-cart-form";
pub const BUTTON_CLASS: &str = "add-to-cart-detail";
pub const CART_COUNT_CLASS: &str = "cart-count";

const RESTING_CLASS: &str = "btn-primary";
const ADDED_CLASS: &str = "btn-success";

/// Saved button markup, keyed by button, while it shows its added state.
pub(crate) type SavedLabels = Rc<RefCell<HashMap<NodeId, Fragment>>>;

/// A positive item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(n: u32) -> Option<Self> {
        (n > 0).then_some(Self(n))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl FromStr for Quantity {
    type Err = ActionError;

    /// Empty, non-numeric and non-positive values are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| ActionError::validation(format!("invalid quantity {s:?}")))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Body of the cart endpoint's reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CartResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub cart_count: Option<serde_json::Value>,
}

/// Text shown for a count field; `null` and absent counts show nothing.
pub(crate) fn count_text(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// A server message worth showing; blank messages fall back to defaults.
pub(crate) fn server_message(message: Option<String>) -> Option<String> {
    message.filter(|m| !m.trim().is_empty())
}

/// Everything read from the form before sending.
#[derive(Debug)]
pub(crate) struct CartSubmission {
    pub button: NodeId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub token: CsrfToken,
}

/// Read and validate a cart form. The quantity is checked before the token.
pub(crate) fn read_submission(
    page: &Page,
    form: NodeId,
    config: &PdpConfig,
) -> ActionResult<CartSubmission> {
    let button = page
        .select(form, &Selector::class(BUTTON_CLASS))
        .ok_or_else(|| ActionError::missing(format!(".{BUTTON_CLASS}")))?;
    let product_id = page
        .attr(button, "data-product-id")
        .filter(|id| !id.trim().is_empty())
        .map(ProductId::from)
        .ok_or_else(|| ActionError::missing("data-product-id"))?;

    let raw_quantity = page
        .query_in(form, "input[name=\"quantity\"]")?
        .and_then(|input| page.value(input))
        .unwrap_or_default();
    let quantity = raw_quantity.parse::<Quantity>()?;

    let token = csrf::find_token(page, form, &csrf::cart_sources(&config.csrf))?;

    Ok(CartSubmission {
        button,
        product_id,
        quantity,
        token,
    })
}

/// `POST {cart_add}` with a form-encoded quantity.
pub(crate) fn build_request(submission: &CartSubmission, config: &PdpConfig) -> HttpRequest {
    let quantity = submission.quantity.to_string();
    HttpRequest::post(config.endpoints.cart_add_url(&submission.product_id))
        .with_credentials(Credentials::SameOrigin)
        .with_header("Content-Type", FORM_CONTENT_TYPE)
        .with_header(config.csrf.header.as_str(), submission.token.as_str())
        .with_form(&[("quantity", quantity.as_str())])
}

/// Markup the button shows once the item is in the cart.
pub fn added_label(text: &str) -> Fragment {
    Fragment::new()
        .with(FragmentNode::element("i").with_attr("class", "fas fa-check me-2"))
        .with(FragmentNode::text(text))
}

/// Put `button` in its added state. The resting markup is saved the first
/// time only, so overlapping successes restore the original label.
pub(crate) fn show_added(page: &mut Page, saved: &SavedLabels, button: NodeId, label: &str) {
    saved
        .borrow_mut()
        .entry(button)
        .or_insert_with(|| page.fragment(button));
    page.replace_children(button, &added_label(label));
    page.remove_class(button, RESTING_CLASS);
    page.add_class(button, ADDED_CLASS);
}

/// Return `button` to its resting state. Safe to run more than once.
pub(crate) fn restore(page: &mut Page, saved: &SavedLabels, button: NodeId) {
    if let Some(original) = saved.borrow_mut().remove(&button) {
        page.replace_children(button, &original);
    }
    page.remove_class(button, ADDED_CLASS);
    page.add_class(button, RESTING_CLASS);
}

fn schedule_restore(controller: &PageController, page: &SharedPage, button: NodeId) {
    let page = page.clone();
    let saved = controller.saved_labels.clone();
    controller.scheduler.set_timeout(
        controller.config.cart.revert_after(),
        Box::new(move || match page.try_borrow_mut() {
            Ok(mut page) => restore(&mut page, &saved, button),
            Err(_) => tracing::warn!(button = %button, "Page busy; cart button not restored"),
        }),
    );
}

impl PageController {
    /// Submit an add-to-cart form in the background.
    ///
    /// Ignored while a previous submission of the same form is in flight.
    pub async fn submit_cart(&self, form: NodeId) -> Outcome {
        let page = self.ctx.page().clone();
        let Some(mut guard) = InFlight::acquire(&self.in_flight, &page, form) else {
            tracing::debug!(form = %form, "Cart submission already in flight");
            return Outcome::Ignored;
        };

        let submission = read_submission(&page.borrow(), form, &self.config);
        let submission = match submission {
            Ok(submission) => submission,
            Err(e) => return self.cart_failed(e),
        };

        guard.disable(submission.button);
        tracing::info!(
            product_id = %submission.product_id,
            quantity = submission.quantity.get(),
            "Adding to cart"
        );

        let request = build_request(&submission, &self.config);
        let result = self.client.send_json::<CartResponse>(request).await;
        drop(guard);

        let response = match result {
            Ok(response) => response,
            Err(e) => return self.cart_failed(e.into()),
        };
        if !response.success {
            return self.cart_failed(ActionError::Rejected {
                message: response.message,
            });
        }

        let cart_count = count_text(response.cart_count.as_ref());
        {
            let mut page = page.borrow_mut();
            show_added(
                &mut page,
                &self.saved_labels,
                submission.button,
                &self.config.messages.cart_added_label,
            );
            let counter = page.select(page.document(), &Selector::class(CART_COUNT_CLASS));
            if let (Some(count), Some(node)) = (&cart_count, counter) {
                page.set_text_content(node, count.as_str());
            }
        }
        schedule_restore(self, &page, submission.button);

        tracing::info!(
            product_id = %submission.product_id,
            cart_count = cart_count.as_deref().unwrap_or(""),
            "Added to cart"
        );
        let message = server_message(response.message)
            .unwrap_or_else(|| self.config.messages.cart_success_default.clone());
        self.notify_success(message);

        Outcome::AddedToCart {
            product_id: submission.product_id,
            cart_count,
        }
    }

    fn cart_failed(&self, error: ActionError) -> Outcome {
        let messages = &self.config.messages;
        let text = match &error {
            ActionError::Validation(_) => messages.invalid_quantity.clone(),
            ActionError::MissingCsrfToken => messages.csrf_missing.clone(),
            ActionError::Rejected { message } => server_message(message.clone())
                .unwrap_or_else(|| messages.cart_failure_default.clone()),
            ActionError::Fetch(e) => format!("{}: {}", messages.cart_error_prefix, e),
            other => format!("{}: {}", messages.cart_error_prefix, other),
        };
        match &error {
            ActionError::Validation(_) | ActionError::Rejected { .. } => {
                tracing::warn!(kind = error.kind(), error = %error, "Add to cart refused")
            }
            _ => tracing::error!(kind = error.kind(), error = %error, "Add to cart failed"),
        }
        self.notify_error(text);
        Outcome::Failed(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = r#"<body><form class="add-to-cart-form" id="f">
        <input type="hidden" name="csrfmiddlewaretoken" value="tok">
        <input type="number" name="quantity" value="2">
        <button type="submit" class="btn btn-primary add-to-cart-detail" data-product-id="42"><i class="fas fa-cart-plus"></i>Ajouter au panier</button>
    </form></body>"#;

    #[test]
    fn test_quantity_parse() {
        assert_eq!("3".parse::<Quantity>().unwrap().get(), 3);
        assert_eq!(" 7 ".parse::<Quantity>().unwrap().get(), 7);
        for bad in ["", "0", "-1", "abc", "2.5"] {
            assert!(bad.parse::<Quantity>().is_err(), "{bad:?} accepted");
        }
    }

    #[test]
    fn test_read_and_build() {
        let page = Page::from_html(FORM).unwrap();
        let form = page.get_element_by_id("f").unwrap();
        let config = PdpConfig::default();

        let submission = read_submission(&page, form, &config).unwrap();
        assert_eq!(submission.product_id.as_str(), "42");
        assert_eq!(submission.quantity.get(), 2);

        let request = build_request(&submission, &config);
        assert_eq!(request.url, "/cart/add/42/");
        assert_eq!(request.body_text(), Some("quantity=2"));
        assert_eq!(request.header("x-csrftoken"), Some("tok"));
        assert_eq!(request.header("content-type"), Some(FORM_CONTENT_TYPE));
    }

    #[test]
    fn test_quantity_checked_before_token() {
        let mut page = Page::from_html(FORM).unwrap();
        let form = page.get_element_by_id("f").unwrap();
        let token = page.query("input[name=\"csrfmiddlewaretoken\"]").unwrap().unwrap();
        let quantity = page.query("input[name=\"quantity\"]").unwrap().unwrap();
        page.set_value(token, "");
        page.set_value(quantity, "0");

        let err = read_submission(&page, form, &PdpConfig::default()).unwrap_err();
        assert!(matches!(err, ActionError::Validation(_)));
    }

    #[test]
    fn test_added_state_restores_first_label() {
        let mut page = Page::from_html(FORM).unwrap();
        let button = page.query(".add-to-cart-detail").unwrap().unwrap();
        let original = page.inner_html(button);
        let saved = SavedLabels::default();

        show_added(&mut page, &saved, button, "Ajouté !");
        show_added(&mut page, &saved, button, "Ajouté !");
        assert_eq!(page.inner_html(button), r#"<i class="fas fa-check me-2"></i>Ajouté !"#);
        assert!(page.has_class(button, ADDED_CLASS));

        restore(&mut page, &saved, button);
        restore(&mut page, &saved, button);
        assert_eq!(page.inner_html(button), original);
        assert!(page.has_class(button, RESTING_CLASS));
        assert!(!page.has_class(button, ADDED_CLASS));
    }

    #[test]
    fn test_server_message_skips_blank() {
        let kept = server_message(Some("Stock épuisé".into()));
        assert_eq!(kept.as_deref(), Some("Stock épuisé"));
        assert_eq!(server_message(Some("  ".into())), None);
        assert_eq!(server_message(None), None);
    }

    #[test]
    fn test_count_text() {
        assert_eq!(count_text(Some(&serde_json::json!(3))), Some("3".to_string()));
        assert_eq!(count_text(Some(&serde_json::json!("12"))), Some("12".to_string()));
        assert_eq!(count_text(Some(&serde_json::Value::Null)), None);
        assert_eq!(count_text(None), None);
    }
}
