//! Product detail page controller.
//!
//! Wires the interactive surfaces of a rendered product page:
//! - Main image carousel with thumbnail sync, and the recommended-products
//!   carousel
//! - Zoom modal that pauses the main carousel while open
//! - Star rating display
//! - Add-to-cart and toggle-favorite background requests
//!
//! The page, HTTP transport, carousel/modal toolkit, notification surface
//! and timer are all injected, so the same controller runs against a
//! browser host, a Spin component or the in-memory doubles used in tests.

mod cart;
mod config;
mod context;
mod controller;
mod csrf;
mod error;
mod favorite;
mod gallery;
mod guard;
mod ids;
mod rating;

pub use cart::{
    added_label, CartResponse, Quantity, BUTTON_CLASS as CART_BUTTON_CLASS, CART_COUNT_CLASS,
    FORM_CLASS as CART_FORM_CLASS,
};
pub use config::*;
pub use context::*;
pub use controller::{
    Dispatch, MountReport, Outcome, PageController, Services, RATING_INPUT_SELECTOR,
};
pub use csrf::{cart_sources, favorite_sources, find_token, CsrfSource, CsrfToken};
pub use error::*;
pub use favorite::{
    is_marked_favorite, FavoriteAction, FavoriteResponse, BUTTON_CLASS as FAVORITE_BUTTON_CLASS,
    FAVORITE_COUNT_CLASS,
};
pub use gallery::{sync_thumbnails, SLIDE_TO_ATTR, THUMBNAIL_CLASS, ZOOM_SRC_ATTR};
pub use ids::ProductId;
pub use rating::{star_labels, sync_rating_stars, Rating, STAR_COUNT};

/// Re-export the building blocks so hosts need only this crate.
pub use storefront_dom;
pub use storefront_fetch;
pub use storefront_widgets;
