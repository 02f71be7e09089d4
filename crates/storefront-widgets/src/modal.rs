//! Modal show/hide side effects on the page.

use storefront_dom::{NodeId, Page};

/// Class the modal layer puts on `<body>` while a modal is open.
pub const BODY_OPEN_CLASS: &str = "modal-open";

/// Class of the overlay element appended behind an open modal.
pub const BACKDROP_CLASS: &str = "modal-backdrop";

/// Show a modal: mark it visible, lock the body and add a backdrop.
pub fn show_modal(page: &mut Page, modal: NodeId) {
    page.add_class(modal, "show");
    page.set_attr(modal, "style", "display: block;");
    page.set_attr(modal, "aria-modal", "true");
    page.remove_attr(modal, "aria-hidden");

    let body = page.body();
    page.add_class(body, BODY_OPEN_CLASS);

    let backdrop = page.create_element("div");
    page.set_attr(backdrop, "class", "modal-backdrop fade show");
    page.append_child(body, backdrop);
}

/// Hide a modal. Returns `false` if it was not shown.
///
/// Only the modal element itself is reset; the body class and backdrop are
/// left for the `hidden` listener to clear.
pub fn hide_modal(page: &mut Page, modal: NodeId) -> bool {
    if !page.has_class(modal, "show") {
        return false;
    }
    page.remove_class(modal, "show");
    page.set_attr(modal, "style", "display: none;");
    page.set_attr(modal, "aria-hidden", "true");
    page.remove_attr(modal, "aria-modal");
    true
}

/// Whether a modal is currently shown.
pub fn is_shown(page: &Page, modal: NodeId) -> bool {
    page.has_class(modal, "show")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_then_hide() {
        let mut page =
            Page::from_html(r#"<body><div id="imageModal" class="modal fade"></div></body>"#)
                .unwrap();
        let modal = page.get_element_by_id("imageModal").unwrap();

        show_modal(&mut page, modal);
        assert!(is_shown(&page, modal));
        assert!(page.has_class(page.body(), BODY_OPEN_CLASS));
        assert_eq!(page.query_all(".modal-backdrop").unwrap().len(), 1);

        assert!(hide_modal(&mut page, modal));
        assert!(!is_shown(&page, modal));
        assert!(!hide_modal(&mut page, modal));
        // Left for the hidden listener.
        assert!(page.has_class(page.body(), BODY_OPEN_CLASS));
    }
}
