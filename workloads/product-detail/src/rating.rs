//! Star rating display.

use std::fmt;
use std::str::FromStr;

use storefront_dom::{NodeId, Page, Selector};

use crate::error::ActionError;

/// Number of stars in the widget.
pub const STAR_COUNT: u8 = 5;

const FILLED: &str = "fas";
const OUTLINED: &str = "far";

/// A rating between 1 and 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: u8) -> Option<Self> {
        (1..=STAR_COUNT).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Whether the star at `position` is drawn filled.
    ///
    /// Labels are laid out highest rating first, so the filled stars are
    /// the last `rating` positions.
    pub fn fills(self, position: usize) -> bool {
        position >= usize::from(STAR_COUNT - self.0)
    }
}

impl FromStr for Rating {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| ActionError::validation(format!("invalid rating {s:?}")))
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, STAR_COUNT)
    }
}

/// Star labels in document order.
pub fn star_labels(page: &Page) -> Vec<NodeId> {
    page.select_all(page.document(), &Selector::class("rating-star"))
}

/// Mirror `rating` onto the star icons. Labels without an icon are skipped.
pub fn sync_rating_stars(page: &mut Page, rating: Rating) {
    let icon = Selector::tag("i");
    for (position, label) in star_labels(page).into_iter().enumerate() {
        let Some(icon) = page.select(label, &icon) else {
            continue;
        };
        let filled = rating.fills(position);
        page.toggle_class(icon, FILLED, filled);
        page.toggle_class(icon, OUTLINED, !filled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const STARS: &str = r#"<body><div class="rating-input">
        <input type="radio" name="rating" value="5"><label class="rating-star"><i class="far fa-star"></i></label>
        <input type="radio" name="rating" value="4"><label class="rating-star"><i class="far fa-star"></i></label>
        <input type="radio" name="rating" value="3"><label class="rating-star"><i class="far fa-star"></i></label>
        <input type="radio" name="rating" value="2"><label class="rating-star"><i class="far fa-star"></i></label>
        <input type="radio" name="rating" value="1"><label class="rating-star"><i class="far fa-star"></i></label>
    </div></body>"#;

    fn filled(page: &Page) -> Vec<bool> {
        page.query_all(".rating-star i")
            .unwrap()
            .into_iter()
            .map(|i| page.has_class(i, FILLED) && !page.has_class(i, OUTLINED))
            .collect()
    }

    #[test]
    fn test_parse() {
        assert_eq!("3".parse::<Rating>().unwrap().value(), 3);
        assert!("0".parse::<Rating>().is_err());
        assert!("6".parse::<Rating>().is_err());
        assert!("abc".parse::<Rating>().is_err());
    }

    #[test]
    fn test_three_stars() {
        let mut page = Page::from_html(STARS).unwrap();
        sync_rating_stars(&mut page, Rating::new(3).unwrap());
        assert_eq!(filled(&page), vec![false, false, true, true, true]);
    }

    proptest! {
        #[test]
        fn prop_exactly_rating_stars_filled(first in 1u8..=5, second in 1u8..=5) {
            let mut page = Page::from_html(STARS).unwrap();
            sync_rating_stars(&mut page, Rating::new(first).unwrap());
            let rating = Rating::new(second).unwrap();
            sync_rating_stars(&mut page, rating);
            sync_rating_stars(&mut page, rating);

            let stars = filled(&page);
            prop_assert_eq!(stars.iter().filter(|f| **f).count(), usize::from(second));
            let expected: Vec<bool> = (0..5).map(|i| i >= usize::from(5 - second)).collect();
            prop_assert_eq!(stars, expected);
        }
    }
}
