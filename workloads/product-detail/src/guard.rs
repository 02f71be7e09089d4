//! One request in flight per control.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use storefront_dom::{NodeId, SharedPage};

/// Controls with a request outstanding.
pub(crate) type InFlightSet = Rc<RefCell<HashSet<NodeId>>>;

/// Held while a control's request is outstanding.
///
/// While held, the control carries `disabled`. Dropping the guard clears
/// both, whichever way the action ended.
pub(crate) struct InFlight {
    set: InFlightSet,
    page: SharedPage,
    key: NodeId,
    disabled: Option<NodeId>,
}

impl InFlight {
    /// Claim `key`; `None` if it already has a request outstanding.
    pub(crate) fn acquire(set: &InFlightSet, page: &SharedPage, key: NodeId) -> Option<Self> {
        if !set.borrow_mut().insert(key) {
            return None;
        }
        Some(Self {
            set: set.clone(),
            page: page.clone(),
            key,
            disabled: None,
        })
    }

    /// Disable `control` until the guard drops.
    pub(crate) fn disable(&mut self, control: NodeId) {
        if let Ok(mut page) = self.page.try_borrow_mut() {
            // Leave controls the page already disabled alone on release.
            if !page.has_attr(control, "disabled") {
                page.set_attr(control, "disabled", "");
                self.disabled = Some(control);
            }
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.set.borrow_mut().remove(&self.key);
        if let Some(control) = self.disabled {
            match self.page.try_borrow_mut() {
                Ok(mut page) => {
                    page.remove_attr(control, "disabled");
                }
                Err(_) => tracing::warn!(control = %control, "Page busy; control left disabled"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_dom::{share, Page};

    #[test]
    fn test_second_acquire_refused_until_drop() {
        let page = share(Page::from_html(r#"<body><button id="b"></button></body>"#).unwrap());
        let button = page.borrow().get_element_by_id("b").unwrap();
        let set = InFlightSet::default();

        let mut guard = InFlight::acquire(&set, &page, button).unwrap();
        guard.disable(button);
        assert!(page.borrow().has_attr(button, "disabled"));
        assert!(InFlight::acquire(&set, &page, button).is_none());

        drop(guard);
        assert!(!page.borrow().has_attr(button, "disabled"));
        assert!(InFlight::acquire(&set, &page, button).is_some());
    }
}
