//! Image carousels and the zoom modal.

use storefront_dom::{EventKind, ListenerRegistry, NodeId, Page, Selector};
use storefront_widgets::{ACTIVE_CLASS, BACKDROP_CLASS, BODY_OPEN_CLASS};

use crate::controller::{Handler, MountReport, Outcome, PageController};
use crate::ids::ProductId;

pub const THUMBNAIL_CLASS: &str = "thumbnail";
pub const ZOOM_SRC_ATTR: &str = "data-zoom-src";
pub const SLIDE_TO_ATTR: &str = "data-slide-to";

/// Mark the thumbnail at `index` active and clear the others.
pub fn sync_thumbnails(page: &mut Page, root: NodeId, index: usize) {
    let thumbnails = page.select_all(root, &Selector::class(THUMBNAIL_CLASS));
    for (position, thumbnail) in thumbnails.into_iter().enumerate() {
        page.toggle_class(thumbnail, ACTIVE_CLASS, position == index);
    }
}

impl PageController {
    pub(crate) fn mount_gallery(
        &self,
        page: &mut Page,
        listeners: &mut ListenerRegistry<Handler>,
        report: &mut MountReport,
    ) {
        let carousel = &self.config.carousel;
        let product_id = self.ctx.product_id();

        match self.main_carousel(page) {
            Some(root) => {
                self.toolkit.mount_carousel(page, root, carousel.main_options());
                report.main_carousel = true;

                let thumbnails = page.select_all(root, &Selector::class(THUMBNAIL_CLASS));
                for thumbnail in thumbnails {
                    let Some(index) = page
                        .attr(thumbnail, SLIDE_TO_ATTR)
                        .and_then(|v| v.trim().parse::<usize>().ok())
                    else {
                        continue;
                    };
                    listeners.add(thumbnail, EventKind::Click, Handler::SwitchImage(index));
                    report.thumbnails += 1;
                }
            }
            None => tracing::warn!(
                product_id = %product_id,
                element = %carousel.main_id(product_id),
                "Main carousel not found"
            ),
        }

        if let Some(root) = page.get_element_by_id(&carousel.recommended_id) {
            self.toolkit.mount_carousel(page, root, carousel.recommended_options());
            report.recommended_carousel = true;
        }

        let zoom = Selector::parse(&format!("[{ZOOM_SRC_ATTR}]"));
        match zoom {
            Ok(zoom) => {
                for trigger in page.select_all(page.document(), &zoom) {
                    listeners.add(trigger, EventKind::Click, Handler::ZoomImage);
                    report.zoom_triggers += 1;
                }
            }
            Err(e) => tracing::error!(error = %e, "Zoom trigger selector rejected"),
        }
    }

    /// The product's main carousel element.
    pub(crate) fn main_carousel(&self, page: &Page) -> Option<NodeId> {
        page.get_element_by_id(&self.config.carousel.main_id(self.ctx.product_id()))
    }

    /// Show slide `index` of `product_id`'s carousel and highlight its
    /// thumbnail. An out-of-range index leaves no thumbnail active.
    pub fn switch_image(&self, index: usize, product_id: &ProductId) -> Outcome {
        let mut page = self.ctx.page().borrow_mut();
        let Some(root) = page.get_element_by_id(&self.config.carousel.main_id(product_id)) else {
            tracing::debug!(product_id = %product_id, index, "No carousel to switch");
            return Outcome::Ignored;
        };

        self.toolkit.advance_to(&mut page, root, index);
        sync_thumbnails(&mut page, root, index);
        tracing::debug!(product_id = %product_id, index, "Image switched");
        Outcome::ImageSwitched { index }
    }

    /// Open `src` in the zoom modal and pause the main carousel until the
    /// modal is hidden.
    pub fn show_image(&self, src: &str) -> Outcome {
        let mut page = self.ctx.page().borrow_mut();
        let carousel = &self.config.carousel;
        let Some(modal) = page.get_element_by_id(&carousel.modal_id) else {
            tracing::warn!(element = %carousel.modal_id, "Zoom modal not found");
            return Outcome::Ignored;
        };

        if let Some(image) = page.get_element_by_id(&carousel.modal_image_id) {
            page.set_attr(image, "src", src);
        }
        self.toolkit.show_modal(&mut page, modal);
        if let Some(root) = self.main_carousel(&page) {
            self.toolkit.pause(root);
        }
        self.listeners
            .borrow_mut()
            .add_once(modal, EventKind::ModalHidden, Handler::ModalHidden);

        tracing::debug!(src, "Zoom modal shown");
        Outcome::ModalShown { src: src.to_string() }
    }

    /// Modal hidden: resume cycling and clear what the modal layer left.
    pub(crate) fn on_modal_hidden(&self) -> Outcome {
        let mut page = self.ctx.page().borrow_mut();
        if let Some(root) = self.main_carousel(&page) {
            self.toolkit.resume(root);
        }

        let body = page.body();
        page.remove_class(body, BODY_OPEN_CLASS);
        let document = page.document();
        if let Some(backdrop) = page.select(document, &Selector::class(BACKDROP_CLASS)) {
            page.remove(backdrop);
        }

        tracing::debug!("Zoom modal hidden");
        Outcome::ModalClosed
    }

    pub(crate) fn zoom_from(&self, trigger: NodeId) -> Outcome {
        let src = self
            .ctx
            .page()
            .borrow()
            .attr(trigger, ZOOM_SRC_ATTR)
            .map(str::to_string);
        match src {
            Some(src) => self.show_image(&src),
            None => Outcome::Ignored,
        }
    }
}
