//! Carousel and modal capability.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::time::Duration;

use storefront_dom::{NodeId, Page};

use crate::carousel::{CarouselOptions, CarouselState};
use crate::modal;

/// Carousel and modal operations a page controller may command.
///
/// Implementations keep their own per-carousel state; `&self` methods use
/// interior mutability so one toolkit can be shared by every handler.
pub trait Toolkit {
    /// Instantiate a carousel on `root`.
    fn mount_carousel(&self, page: &mut Page, root: NodeId, options: CarouselOptions);

    /// Show slide `index` (`carousel.to(index)`). Mounts the carousel with
    /// default options if needed.
    fn advance_to(&self, page: &mut Page, root: NodeId, index: usize);

    /// Stop auto-cycling.
    fn pause(&self, root: NodeId);

    /// Resume auto-cycling (`carousel.cycle()`).
    fn resume(&self, root: NodeId);

    /// Show a modal.
    fn show_modal(&self, page: &mut Page, modal: NodeId);
}

/// Toolkit that drives carousels and modals directly on the page model.
///
/// Time is external: call [`DomToolkit::tick`] to let auto-cycling run.
#[derive(Debug, Default)]
pub struct DomToolkit {
    carousels: RefCell<BTreeMap<NodeId, CarouselState>>,
}

impl DomToolkit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a carousel is mounted on `root`.
    pub fn is_mounted(&self, root: NodeId) -> bool {
        self.carousels.borrow().contains_key(&root)
    }

    /// Snapshot of a carousel's state.
    pub fn carousel(&self, root: NodeId) -> Option<CarouselState> {
        self.carousels.borrow().get(&root).cloned()
    }

    /// Number of mounted carousels.
    pub fn carousel_count(&self) -> usize {
        self.carousels.borrow().len()
    }

    /// Pointer entered or left a carousel.
    pub fn set_hovered(&self, root: NodeId, hovered: bool) {
        if let Some(state) = self.carousels.borrow_mut().get_mut(&root) {
            state.hovered = hovered;
        }
    }

    /// Advance every cycling carousel by `dt`. Returns the transitions made.
    pub fn tick(&self, page: &mut Page, dt: Duration) -> usize {
        self.carousels
            .borrow_mut()
            .iter_mut()
            .map(|(&root, state)| state.tick(page, root, dt))
            .sum()
    }

    /// Hide a modal the way a dismiss click would. The caller dispatches
    /// the hidden event afterwards.
    pub fn hide_modal(&self, page: &mut Page, modal: NodeId) -> bool {
        modal::hide_modal(page, modal)
    }
}

impl Toolkit for DomToolkit {
    fn mount_carousel(&self, page: &mut Page, root: NodeId, options: CarouselOptions) {
        let state = CarouselState::from_page(page, root, options);
        tracing::debug!(
            root = %root,
            slides = state.slide_count,
            interval_ms = options.interval.map(|i| i.as_millis() as u64),
            "Carousel mounted"
        );
        self.carousels.borrow_mut().insert(root, state);
    }

    fn advance_to(&self, page: &mut Page, root: NodeId, index: usize) {
        let mut carousels = self.carousels.borrow_mut();
        let state = carousels
            .entry(root)
            .or_insert_with(|| CarouselState::from_page(page, root, CarouselOptions::default()));
        if !state.go_to(page, root, index) {
            tracing::debug!(root = %root, index, "Slide index out of range");
        }
    }

    fn pause(&self, root: NodeId) {
        if let Some(state) = self.carousels.borrow_mut().get_mut(&root) {
            state.paused = true;
        }
    }

    fn resume(&self, root: NodeId) {
        if let Some(state) = self.carousels.borrow_mut().get_mut(&root) {
            state.cycle();
        }
    }

    fn show_modal(&self, page: &mut Page, modal: NodeId) {
        modal::show_modal(page, modal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PauseOn;

    const PAGE: &str = r#"<body>
        <div id="main"><div class="carousel-item active"></div><div class="carousel-item"></div></div>
        <div id="other"><div class="carousel-item active"></div><div class="carousel-item"></div></div>
    </body>"#;

    #[test]
    fn test_pause_resume_and_tick() {
        let mut page = Page::from_html(PAGE).unwrap();
        let main = page.get_element_by_id("main").unwrap();
        let other = page.get_element_by_id("other").unwrap();
        let toolkit = DomToolkit::new();

        toolkit.mount_carousel(
            &mut page,
            main,
            CarouselOptions::new(Duration::from_millis(3000), PauseOn::Hover, true),
        );
        toolkit.mount_carousel(
            &mut page,
            other,
            CarouselOptions::new(Duration::from_millis(5000), PauseOn::Never, true),
        );

        toolkit.pause(main);
        assert_eq!(toolkit.tick(&mut page, Duration::from_millis(5000)), 1);
        assert_eq!(toolkit.carousel(main).unwrap().index, 0);
        assert_eq!(toolkit.carousel(other).unwrap().index, 1);

        toolkit.resume(main);
        assert_eq!(toolkit.tick(&mut page, Duration::from_millis(3000)), 1);
        assert_eq!(toolkit.carousel(main).unwrap().index, 1);
    }

    #[test]
    fn test_advance_to_mounts_lazily() {
        let mut page = Page::from_html(PAGE).unwrap();
        let main = page.get_element_by_id("main").unwrap();
        let toolkit = DomToolkit::new();

        toolkit.advance_to(&mut page, main, 1);
        assert!(toolkit.is_mounted(main));
        assert_eq!(toolkit.carousel(main).unwrap().index, 1);
    }

    #[test]
    fn test_hover_pauses_main() {
        let mut page = Page::from_html(PAGE).unwrap();
        let main = page.get_element_by_id("main").unwrap();
        let toolkit = DomToolkit::new();
        toolkit.mount_carousel(
            &mut page,
            main,
            CarouselOptions::new(Duration::from_millis(3000), PauseOn::Hover, true),
        );

        toolkit.set_hovered(main, true);
        assert_eq!(toolkit.tick(&mut page, Duration::from_millis(9000)), 0);
        toolkit.set_hovered(main, false);
        assert_eq!(toolkit.tick(&mut page, Duration::from_millis(3000)), 1);
    }
}
