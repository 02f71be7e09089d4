//! Events and listener registration.

use std::fmt;

use crate::{NodeId, Page};

/// Event types page controllers listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Change,
    Submit,
    MouseEnter,
    MouseLeave,
    /// The modal capability finished hiding a modal.
    ModalHidden,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Click => "click",
            Self::Change => "change",
            Self::Submit => "submit",
            Self::MouseEnter => "mouseenter",
            Self::MouseLeave => "mouseleave",
            Self::ModalHidden => "hidden.bs.modal",
        };
        f.write_str(name)
    }
}

impl EventKind {
    /// Whether the event propagates to ancestors of its target.
    pub fn bubbles(self) -> bool {
        !matches!(self, Self::MouseEnter | Self::MouseLeave)
    }
}

/// An event dispatched at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub target: NodeId,
}

impl Event {
    pub fn new(kind: EventKind, target: NodeId) -> Self {
        Self { kind, target }
    }

    pub fn click(target: NodeId) -> Self {
        Self::new(EventKind::Click, target)
    }

    pub fn change(target: NodeId) -> Self {
        Self::new(EventKind::Change, target)
    }

    pub fn submit(target: NodeId) -> Self {
        Self::new(EventKind::Submit, target)
    }
}

#[derive(Debug, Clone)]
struct Listener<H> {
    node: NodeId,
    kind: EventKind,
    handler: H,
    once: bool,
}

/// A handler matched during dispatch, with the node it was registered on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matched<H> {
    pub current_target: NodeId,
    pub handler: H,
}

/// Listener table keyed by node and event type.
///
/// Handlers are plain values (typically an enum naming the surface to run);
/// the controller owning the registry decides how to execute them.
#[derive(Debug, Clone)]
pub struct ListenerRegistry<H> {
    listeners: Vec<Listener<H>>,
}

impl<H> Default for ListenerRegistry<H> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }
}

impl<H: Clone> ListenerRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a persistent listener.
    pub fn add(&mut self, node: NodeId, kind: EventKind, handler: H) {
        self.listeners.push(Listener {
            node,
            kind,
            handler,
            once: false,
        });
    }

    /// Register a listener that removes itself after its first run.
    pub fn add_once(&mut self, node: NodeId, kind: EventKind, handler: H) {
        self.listeners.push(Listener {
            node,
            kind,
            handler,
            once: true,
        });
    }

    /// Number of listeners registered on `node` for `kind`.
    pub fn count(&self, node: NodeId, kind: EventKind) -> usize {
        self.listeners
            .iter()
            .filter(|l| l.node == node && l.kind == kind)
            .count()
    }

    /// Total number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Collect the handlers an event reaches, target first then ancestors
    /// for bubbling events, in registration order per node. `once`
    /// listeners are removed as they are collected.
    pub fn dispatch(&mut self, page: &Page, event: Event) -> Vec<Matched<H>> {
        let mut path = vec![event.target];
        if event.kind.bubbles() {
            path.extend(page.ancestors(event.target));
        }

        let mut matched = Vec::new();
        for node in path {
            let mut i = 0;
            while i < self.listeners.len() {
                let listener = &self.listeners[i];
                if listener.node == node && listener.kind == event.kind {
                    matched.push(Matched {
                        current_target: node,
                        handler: listener.handler.clone(),
                    });
                    if listener.once {
                        self.listeners.remove(i);
                        continue;
                    }
                }
                i += 1;
            }
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bubbles_to_ancestors() {
        let page = Page::from_html(
            r#"<button class="toggle-favorite"><i class="far fa-heart"></i><span>Ajouter</span></button>"#,
        )
        .unwrap();
        let button = page.query(".toggle-favorite").unwrap().unwrap();
        let icon = page.query(".toggle-favorite i").unwrap().unwrap();

        let mut registry = ListenerRegistry::new();
        registry.add(button, EventKind::Click, "favorite");

        let matched = registry.dispatch(&page, Event::click(icon));
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].current_target, button);
        assert_eq!(matched[0].handler, "favorite");
    }

    #[test]
    fn test_once_listener_fires_once() {
        let page = Page::from_html(r#"<div id="imageModal"></div>"#).unwrap();
        let modal = page.get_element_by_id("imageModal").unwrap();

        let mut registry = ListenerRegistry::new();
        registry.add_once(modal, EventKind::ModalHidden, 1);

        assert_eq!(registry.dispatch(&page, Event::new(EventKind::ModalHidden, modal)).len(), 1);
        assert!(registry.dispatch(&page, Event::new(EventKind::ModalHidden, modal)).is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_mouseenter_does_not_bubble() {
        let page = Page::from_html(r#"<div id="c"><img></div>"#).unwrap();
        let carousel = page.get_element_by_id("c").unwrap();
        let img = page.query("#c img").unwrap().unwrap();

        let mut registry = ListenerRegistry::new();
        registry.add(carousel, EventKind::MouseEnter, ());
        assert!(registry.dispatch(&page, Event::new(EventKind::MouseEnter, img)).is_empty());
        assert_eq!(
            registry.dispatch(&page, Event::new(EventKind::MouseEnter, carousel)).len(),
            1
        );
    }
}
