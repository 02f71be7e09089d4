//! Favorite toggle.

use serde::Deserialize;
use storefront_dom::{NodeId, Page, Selector};
use storefront_fetch::{Credentials, HttpRequest, FORM_CONTENT_TYPE};
use storefront_widgets::{Notification, NotificationKind};

use crate::cart::{count_text, server_message};
use crate::controller::{Outcome, PageController};
use crate::csrf;
use crate::error::{ActionError, ActionResult};
use crate::guard::InFlight;
use crate::ids::ProductId;

pub const BUTTON_CLASS: &str = "toggle-favorite";
pub const FAVORITE_COUNT_CLASS: &str = "favorite-count";

const FAVORITE_ICON_CLASS: &str = "text-danger";

/// What the backend did to the favorite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteAction {
    Added,
    Removed,
}

impl FavoriteAction {
    /// `"added"` is an addition; anything else counts as a removal.
    pub fn from_wire(action: Option<&str>) -> Self {
        match action {
            Some("added") => Self::Added,
            _ => Self::Removed,
        }
    }

    pub fn is_favorite(self) -> bool {
        self == Self::Added
    }
}

/// Body of the favorite endpoint's reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FavoriteResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub favorite_count: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl FavoriteResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    pub fn action(&self) -> FavoriteAction {
        FavoriteAction::from_wire(self.action.as_deref())
    }
}

/// Whether the button currently shows the product as a favorite.
pub fn is_marked_favorite(page: &Page, button: NodeId) -> bool {
    page.attr(button, "data-is-favorite") == Some("true")
}

/// Mirror `action` onto the button: icon color, label and flag.
pub(crate) fn apply_action(
    page: &mut Page,
    button: NodeId,
    action: FavoriteAction,
    add_label: &str,
    remove_label: &str,
) {
    if let Some(icon) = page.select(button, &Selector::tag("i")) {
        page.toggle_class(icon, FAVORITE_ICON_CLASS, action.is_favorite());
    }
    if let Some(label) = page.select(button, &Selector::tag("span")) {
        let text = if action.is_favorite() { remove_label } else { add_label };
        page.set_text_content(label, text);
    }
    let flag = if action.is_favorite() { "true" } else { "false" };
    page.set_attr(button, "data-is-favorite", flag);
}

fn read_product_id(page: &Page, button: NodeId) -> ActionResult<ProductId> {
    page.attr(button, "data-product-id")
        .filter(|id| !id.trim().is_empty())
        .map(ProductId::from)
        .ok_or_else(|| ActionError::missing("data-product-id"))
}

impl PageController {
    /// Toggle the favorite flag of the product behind `button`.
    ///
    /// The backend decides the new state. Ignored while a previous toggle
    /// of the same button is in flight.
    pub async fn toggle_favorite(&self, button: NodeId) -> Outcome {
        let page = self.ctx.page().clone();
        let Some(mut guard) = InFlight::acquire(&self.in_flight, &page, button) else {
            tracing::debug!(button = %button, "Favorite toggle already in flight");
            return Outcome::Ignored;
        };

        let prepared = {
            let page = page.borrow();
            read_product_id(&page, button).and_then(|product_id| {
                let sources = csrf::favorite_sources(&self.config.csrf);
                let token = csrf::find_token(&page, button, &sources)?;
                Ok((product_id, token, is_marked_favorite(&page, button)))
            })
        };
        let (product_id, token, was_favorite) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => return self.favorite_failed(e),
        };

        guard.disable(button);
        tracing::info!(product_id = %product_id, was_favorite, "Toggling favorite");

        let request = HttpRequest::post(self.config.endpoints.toggle_favorite_url(&product_id))
            .with_credentials(Credentials::SameOrigin)
            .with_header("Content-Type", FORM_CONTENT_TYPE)
            .with_header(self.config.csrf.header.as_str(), token.as_str());
        let result = self.client.send_json::<FavoriteResponse>(request).await;
        drop(guard);

        let response = match result {
            Ok(response) => response,
            Err(e) => return self.favorite_failed(e.into()),
        };
        if !response.is_success() {
            return self.favorite_failed(ActionError::Rejected {
                message: response.message,
            });
        }

        let action = response.action();
        let favorite_count = count_text(response.favorite_count.as_ref());
        {
            let mut page = page.borrow_mut();
            let messages = &self.config.messages;
            apply_action(
                &mut page,
                button,
                action,
                &messages.favorite_add_label,
                &messages.favorite_remove_label,
            );
            let counter = page.select(page.document(), &Selector::class(FAVORITE_COUNT_CLASS));
            if let (Some(count), Some(node)) = (&favorite_count, counter) {
                page.set_text_content(node, count.as_str());
            }
        }

        tracing::info!(product_id = %product_id, ?action, "Favorite updated");
        match action {
            FavoriteAction::Added => {
                self.notify_success(self.config.messages.favorite_added.clone())
            }
            // Removal is announced in the error color.
            FavoriteAction::Removed => self.notifier.notify(&Notification {
                message: self.config.messages.favorite_removed.clone(),
                kind: NotificationKind::Success,
                style: self.config.toast.error.clone(),
            }),
        }

        Outcome::FavoriteToggled {
            product_id,
            action,
            favorite_count,
        }
    }

    fn favorite_failed(&self, error: ActionError) -> Outcome {
        let messages = &self.config.messages;
        let text = match &error {
            ActionError::MissingCsrfToken => messages.csrf_missing.clone(),
            ActionError::Rejected { message } => server_message(message.clone())
                .unwrap_or_else(|| messages.favorite_failure_default.clone()),
            ActionError::Fetch(e) => format!("{}: {}", messages.favorite_error_prefix, e),
            other => format!("{}: {}", messages.favorite_error_prefix, other),
        };
        match &error {
            ActionError::Rejected { .. } => {
                tracing::warn!(kind = error.kind(), error = %error, "Favorite toggle refused")
            }
            _ => tracing::error!(kind = error.kind(), error = %error, "Favorite toggle failed"),
        }
        self.notify_error(text);
        Outcome::Failed(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUTTON: &str = r#"<body><button class="toggle-favorite" id="fav" data-product-id="42" data-is-favorite="false">
        <i class="fas fa-heart"></i><span>Ajouter</span></button></body>"#;

    #[test]
    fn test_action_from_wire() {
        assert_eq!(FavoriteAction::from_wire(Some("added")), FavoriteAction::Added);
        assert_eq!(FavoriteAction::from_wire(Some("removed")), FavoriteAction::Removed);
        assert_eq!(FavoriteAction::from_wire(None), FavoriteAction::Removed);
    }

    #[test]
    fn test_apply_added_then_removed() {
        let mut page = Page::from_html(BUTTON).unwrap();
        let button = page.get_element_by_id("fav").unwrap();
        let icon = page.query("#fav i").unwrap().unwrap();
        let label = page.query("#fav span").unwrap().unwrap();

        apply_action(&mut page, button, FavoriteAction::Added, "Ajouter", "Retirer");
        assert!(page.has_class(icon, FAVORITE_ICON_CLASS));
        assert_eq!(page.text_content(label), "Retirer");
        assert!(is_marked_favorite(&page, button));

        apply_action(&mut page, button, FavoriteAction::Removed, "Ajouter", "Retirer");
        assert!(!page.has_class(icon, FAVORITE_ICON_CLASS));
        assert_eq!(page.text_content(label), "Ajouter");
        assert_eq!(page.attr(button, "data-is-favorite"), Some("false"));
    }

    #[test]
    fn test_response_decoding() {
        let response: FavoriteResponse =
            serde_json::from_str(r#"{"status":"success","action":"added","favorite_count":4}"#)
                .unwrap();
        assert!(response.is_success());
        assert_eq!(response.action(), FavoriteAction::Added);

        let response: FavoriteResponse = serde_json::from_str(r#"{"status":"error"}"#).unwrap();
        assert!(!response.is_success());
    }
}
