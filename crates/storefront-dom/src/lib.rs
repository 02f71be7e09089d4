//! In-memory page model for storefront page controllers.
//!
//! This crate provides:
//! - `Page` - Element arena with class, attribute and text manipulation
//! - `Selector` - The selector subset page controllers query with
//! - `Fragment` - Detached markup snapshots (inner HTML save/restore)
//! - `CookieJar` - `document.cookie` style cookie storage
//! - `ListenerRegistry` - Event listeners with bubbling and `once` semantics

mod cookie;
mod error;
mod event;
mod fragment;
mod html;
mod node;
mod page;
mod selector;

pub use cookie::*;
pub use error::*;
pub use event::*;
pub use fragment::*;
pub use node::*;
pub use page::*;
pub use selector::*;

use std::cell::RefCell;
use std::rc::Rc;

/// Page shared between the controller and its deferred callbacks.
///
/// Page scripting is single-threaded, so shared ownership is `Rc<RefCell<_>>`.
pub type SharedPage = Rc<RefCell<Page>>;

/// Wrap a page for shared use.
pub fn share(page: Page) -> SharedPage {
    Rc::new(RefCell::new(page))
}
