//! Carousel options and slide state.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use storefront_dom::{NodeId, Page, Selector};

/// Class marking a slide inside a carousel.
pub const SLIDE_CLASS: &str = "carousel-item";

/// Class marking the visible slide.
pub const ACTIVE_CLASS: &str = "active";

/// When auto-cycling pauses on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PauseOn {
    /// Pause while the pointer is over the carousel.
    #[default]
    Hover,
    /// Never pause on pointer activity.
    Never,
}

/// Options a carousel is mounted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarouselOptions {
    /// Auto-advance interval. `None` disables auto-cycling.
    pub interval: Option<Duration>,
    pub pause: PauseOn,
    /// Wrap from the last slide to the first.
    pub wrap: bool,
}

impl Default for CarouselOptions {
    /// Library defaults: 5 s, pause on hover, wrap.
    fn default() -> Self {
        Self {
            interval: Some(Duration::from_millis(5000)),
            pause: PauseOn::Hover,
            wrap: true,
        }
    }
}

impl CarouselOptions {
    pub fn new(interval: Duration, pause: PauseOn, wrap: bool) -> Self {
        Self {
            interval: Some(interval),
            pause,
            wrap,
        }
    }
}

/// Runtime state of a mounted carousel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarouselState {
    pub options: CarouselOptions,
    pub index: usize,
    pub slide_count: usize,
    pub paused: bool,
    pub hovered: bool,
    elapsed: Duration,
}

/// Slides of a carousel, in document order.
pub fn slides(page: &Page, root: NodeId) -> Vec<NodeId> {
    page.select_all(root, &Selector::class(SLIDE_CLASS))
}

impl CarouselState {
    /// Read the initial state from the page.
    pub fn from_page(page: &Page, root: NodeId, options: CarouselOptions) -> Self {
        let slides = slides(page, root);
        let index = slides
            .iter()
            .position(|&s| page.has_class(s, ACTIVE_CLASS))
            .unwrap_or(0);
        Self {
            options,
            index,
            slide_count: slides.len(),
            paused: false,
            hovered: false,
            elapsed: Duration::ZERO,
        }
    }

    /// Whether auto-cycling currently runs.
    pub fn is_cycling(&self) -> bool {
        self.options.interval.is_some()
            && !self.paused
            && !(self.hovered && self.options.pause == PauseOn::Hover)
    }

    /// Show slide `index`. Out-of-range indices are ignored.
    pub fn go_to(&mut self, page: &mut Page, root: NodeId, index: usize) -> bool {
        let slides = slides(page, root);
        self.slide_count = slides.len();
        if index >= slides.len() {
            return false;
        }
        for (i, &slide) in slides.iter().enumerate() {
            page.toggle_class(slide, ACTIVE_CLASS, i == index);
        }
        self.index = index;
        self.elapsed = Duration::ZERO;
        true
    }

    /// Index of the slide after the current one, honouring `wrap`.
    pub fn next_index(&self) -> Option<usize> {
        if self.slide_count == 0 {
            return None;
        }
        if self.index + 1 < self.slide_count {
            Some(self.index + 1)
        } else if self.options.wrap {
            Some(0)
        } else {
            None
        }
    }

    /// Restart cycling from a clean interval.
    pub fn cycle(&mut self) {
        self.paused = false;
        self.elapsed = Duration::ZERO;
    }

    /// Let `dt` pass; advances as many slides as whole intervals elapsed.
    /// Returns the number of transitions made.
    pub fn tick(&mut self, page: &mut Page, root: NodeId, dt: Duration) -> usize {
        let Some(interval) = self.options.interval.filter(|i| !i.is_zero()) else {
            return 0;
        };
        if !self.is_cycling() {
            return 0;
        }

        self.elapsed += dt;
        let mut transitions = 0;
        while self.elapsed >= interval {
            let carry = self.elapsed - interval;
            let Some(next) = self.next_index() else {
                self.elapsed = Duration::ZERO;
                break;
            };
            self.go_to(page, root, next);
            self.elapsed = carry;
            transitions += 1;
        }
        transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carousel(active: usize) -> (Page, NodeId) {
        let items: String = (0..3)
            .map(|i| {
                let class = if i == active {
                    "carousel-item active"
                } else {
                    "carousel-item"
                };
                format!(r#"<div class="{}"><img src="{}.jpg"></div>"#, class, i)
            })
            .collect();
        let page = Page::from_html(&format!(r#"<div id="c">{}</div>"#, items)).unwrap();
        let root = page.get_element_by_id("c").unwrap();
        (page, root)
    }

    fn active_index(page: &Page, root: NodeId) -> Vec<usize> {
        slides(page, root)
            .iter()
            .enumerate()
            .filter(|(_, s)| page.has_class(**s, ACTIVE_CLASS))
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_initial_index_from_active_class() {
        let (page, root) = carousel(1);
        let state = CarouselState::from_page(&page, root, CarouselOptions::default());
        assert_eq!(state.index, 1);
        assert_eq!(state.slide_count, 3);
    }

    #[test]
    fn test_go_to_moves_active_class() {
        let (mut page, root) = carousel(0);
        let mut state = CarouselState::from_page(&page, root, CarouselOptions::default());
        assert!(state.go_to(&mut page, root, 2));
        assert_eq!(active_index(&page, root), vec![2]);
        assert!(!state.go_to(&mut page, root, 3));
        assert_eq!(active_index(&page, root), vec![2]);
    }

    #[test]
    fn test_tick_wraps() {
        let (mut page, root) = carousel(0);
        let options = CarouselOptions::new(Duration::from_millis(3000), PauseOn::Hover, true);
        let mut state = CarouselState::from_page(&page, root, options);

        assert_eq!(state.tick(&mut page, root, Duration::from_millis(2999)), 0);
        assert_eq!(state.tick(&mut page, root, Duration::from_millis(1)), 1);
        assert_eq!(state.tick(&mut page, root, Duration::from_millis(6000)), 2);
        assert_eq!(active_index(&page, root), vec![0]);
    }

    #[test]
    fn test_tick_without_wrap_stops_at_last() {
        let (mut page, root) = carousel(1);
        let options = CarouselOptions::new(Duration::from_millis(100), PauseOn::Never, false);
        let mut state = CarouselState::from_page(&page, root, options);

        assert_eq!(state.tick(&mut page, root, Duration::from_millis(1000)), 1);
        assert_eq!(state.index, 2);
    }

    #[test]
    fn test_hover_pauses_only_with_hover_option() {
        let (mut page, root) = carousel(0);
        let mut hover = CarouselState::from_page(
            &page,
            root,
            CarouselOptions::new(Duration::from_millis(100), PauseOn::Hover, true),
        );
        hover.hovered = true;
        assert_eq!(hover.tick(&mut page, root, Duration::from_millis(500)), 0);

        let mut never = CarouselState::from_page(
            &page,
            root,
            CarouselOptions::new(Duration::from_millis(100), PauseOn::Never, true),
        );
        never.hovered = true;
        assert_eq!(never.tick(&mut page, root, Duration::from_millis(100)), 1);
    }

    #[test]
    fn test_paused_does_not_advance() {
        let (mut page, root) = carousel(0);
        let mut state = CarouselState::from_page(&page, root, CarouselOptions::default());
        state.paused = true;
        assert_eq!(state.tick(&mut page, root, Duration::from_secs(60)), 0);
        state.cycle();
        assert_eq!(state.tick(&mut page, root, Duration::from_secs(5)), 1);
    }
}
