//! The page controller: listener wiring and event dispatch.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use storefront_dom::{Event, EventKind, ListenerRegistry, Matched, NodeId, Page, Selector};
use storefront_fetch::{FetchClient, FetchPolicy, Transport};
use storefront_widgets::{Notification, Notifier, Scheduler, Toolkit};

use crate::cart::{self, SavedLabels};
use crate::config::PdpConfig;
use crate::context::PageContext;
use crate::error::ActionError;
use crate::favorite::{self, FavoriteAction};
use crate::guard::InFlightSet;
use crate::ids::ProductId;
use crate::rating::{sync_rating_stars, Rating};

/// Selector for the rating radio inputs.
pub const RATING_INPUT_SELECTOR: &str = ".rating-input input";

/// Host capabilities the controller drives.
#[derive(Clone)]
pub struct Services {
    pub transport: Rc<dyn Transport>,
    pub toolkit: Rc<dyn Toolkit>,
    pub notifier: Rc<dyn Notifier>,
    pub scheduler: Rc<dyn Scheduler>,
}

impl Services {
    pub fn new(
        transport: Rc<dyn Transport>,
        toolkit: Rc<dyn Toolkit>,
        notifier: Rc<dyn Notifier>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        Self {
            transport,
            toolkit,
            notifier,
            scheduler,
        }
    }
}

/// What a registered listener does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Handler {
    SwitchImage(usize),
    ZoomImage,
    ModalHidden,
    RatingChange,
    CartSubmit,
    FavoriteClick,
}

/// Result of one handler run.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    ImageSwitched {
        index: usize,
    },
    ModalShown {
        src: String,
    },
    ModalClosed,
    RatingSynced(Rating),
    AddedToCart {
        product_id: ProductId,
        cart_count: Option<String>,
    },
    FavoriteToggled {
        product_id: ProductId,
        action: FavoriteAction,
        favorite_count: Option<String>,
    },
    /// Nothing to do: a request was already in flight or the target is gone.
    Ignored,
    Failed(ActionError),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn error(&self) -> Option<&ActionError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Everything one event triggered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dispatch {
    /// A handler suppressed the browser's default action.
    pub default_prevented: bool,
    pub outcomes: Vec<Outcome>,
}

impl Dispatch {
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// The outcome when exactly one handler ran.
    pub fn single(&self) -> Option<&Outcome> {
        match self.outcomes.as_slice() {
            [outcome] => Some(outcome),
            _ => None,
        }
    }
}

/// Which surfaces `mount` wired.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MountReport {
    pub product_id: String,
    pub main_carousel: bool,
    pub recommended_carousel: bool,
    pub thumbnails: usize,
    pub zoom_triggers: usize,
    pub rating_inputs: usize,
    pub cart_forms: usize,
    pub favorite_buttons: usize,
}

/// Interactive behavior of one product detail page.
pub struct PageController {
    pub(crate) ctx: PageContext,
    pub(crate) config: PdpConfig,
    pub(crate) client: FetchClient,
    pub(crate) toolkit: Rc<dyn Toolkit>,
    pub(crate) notifier: Rc<dyn Notifier>,
    pub(crate) scheduler: Rc<dyn Scheduler>,
    pub(crate) listeners: RefCell<ListenerRegistry<Handler>>,
    pub(crate) in_flight: InFlightSet,
    pub(crate) saved_labels: SavedLabels,
    mounted: RefCell<Option<MountReport>>,
}

impl PageController {
    pub fn new(ctx: PageContext, config: PdpConfig, services: Services) -> Self {
        let client = FetchClient::new(services.transport)
            .with_policy(FetchPolicy::new(config.fetch.timeout()));
        Self {
            ctx,
            config,
            client,
            toolkit: services.toolkit,
            notifier: services.notifier,
            scheduler: services.scheduler,
            listeners: RefCell::new(ListenerRegistry::new()),
            in_flight: InFlightSet::default(),
            saved_labels: SavedLabels::default(),
            mounted: RefCell::new(None),
        }
    }

    pub fn context(&self) -> &PageContext {
        &self.ctx
    }

    pub fn config(&self) -> &PdpConfig {
        &self.config
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Wire every surface present on the page. Calling it again returns
    /// the first report without wiring twice.
    pub fn mount(&self) -> MountReport {
        if let Some(report) = self.mounted.borrow().as_ref() {
            tracing::debug!("Controller already mounted");
            return report.clone();
        }

        let mut report = MountReport {
            product_id: self.ctx.product_id().to_string(),
            ..Default::default()
        };
        {
            let mut page = self.ctx.page().borrow_mut();
            let mut listeners = self.listeners.borrow_mut();

            self.mount_gallery(&mut page, &mut listeners, &mut report);

            for input in query_all(&page, RATING_INPUT_SELECTOR) {
                listeners.add(input, EventKind::Change, Handler::RatingChange);
                report.rating_inputs += 1;
            }

            let document = page.document();
            for form in page.select_all(document, &Selector::class(cart::FORM_CLASS)) {
                listeners.add(form, EventKind::Submit, Handler::CartSubmit);
                report.cart_forms += 1;
            }

            for button in page.select_all(document, &Selector::class(favorite::BUTTON_CLASS)) {
                listeners.add(button, EventKind::Click, Handler::FavoriteClick);
                report.favorite_buttons += 1;
            }
        }

        tracing::info!(
            product_id = %report.product_id,
            main_carousel = report.main_carousel,
            recommended_carousel = report.recommended_carousel,
            thumbnails = report.thumbnails,
            rating_inputs = report.rating_inputs,
            cart_forms = report.cart_forms,
            favorite_buttons = report.favorite_buttons,
            "Product page mounted"
        );
        *self.mounted.borrow_mut() = Some(report.clone());
        report
    }

    /// Run every listener `event` reaches, target first then ancestors.
    ///
    /// Background requests are awaited here; no page borrow is held across
    /// them, so several dispatches may be in progress at once.
    pub async fn dispatch(&self, event: Event) -> Dispatch {
        let matched = {
            let page = self.ctx.page().borrow();
            self.listeners.borrow_mut().dispatch(&page, event)
        };

        let mut dispatch = Dispatch::default();
        for Matched {
            current_target,
            handler,
        } in matched
        {
            let outcome = match handler {
                Handler::SwitchImage(index) => self.switch_image(index, self.ctx.product_id()),
                Handler::ZoomImage => self.zoom_from(current_target),
                Handler::ModalHidden => self.on_modal_hidden(),
                Handler::RatingChange => self.on_rating_change(current_target),
                Handler::CartSubmit => {
                    dispatch.default_prevented = true;
                    self.submit_cart(current_target).await
                }
                Handler::FavoriteClick => {
                    dispatch.default_prevented = true;
                    self.toggle_favorite(current_target).await
                }
            };
            dispatch.outcomes.push(outcome);
        }
        dispatch
    }

    /// Show `rating` on the star icons.
    pub fn sync_rating(&self, rating: Rating) {
        sync_rating_stars(&mut self.ctx.page().borrow_mut(), rating);
    }

    fn on_rating_change(&self, input: NodeId) -> Outcome {
        let mut page = self.ctx.page().borrow_mut();
        let raw = page.value(input).unwrap_or_default().to_string();
        match raw.parse::<Rating>() {
            Ok(rating) => {
                sync_rating_stars(&mut page, rating);
                tracing::debug!(rating = rating.value(), "Rating stars synced");
                Outcome::RatingSynced(rating)
            }
            Err(e) => {
                tracing::warn!(value = %raw, "Ignoring rating input");
                Outcome::Failed(e)
            }
        }
    }

    pub(crate) fn notify_success(&self, message: String) {
        self.notifier
            .notify(&Notification::success(message).with_style(self.config.toast.success.clone()));
    }

    pub(crate) fn notify_error(&self, message: String) {
        self.notifier
            .notify(&Notification::error(message).with_style(self.config.toast.error.clone()));
    }
}

/// `query_all` for selectors fixed at compile time; a rejected selector is
/// logged and matches nothing.
fn query_all(page: &Page, selector: &str) -> Vec<NodeId> {
    page.query_all(selector).unwrap_or_else(|e| {
        tracing::error!(selector, error = %e, "Selector rejected");
        Vec::new()
    })
}
