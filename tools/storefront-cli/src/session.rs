//! A mounted page with in-memory collaborators.

use std::rc::Rc;

use anyhow::{anyhow, Context as _, Result};
use product_detail::storefront_dom::{share, NodeId, Page, SharedPage};
use product_detail::storefront_fetch::MockTransport;
use product_detail::storefront_widgets::{
    AlertNotifier, DomToolkit, ManualScheduler, NotificationCenter, NotificationLog,
};
use product_detail::{
    detect_product_id, MountReport, PageContext, PageController, PdpConfig, Services,
};
use serde::Serialize;

/// A notification as the shopper would have seen it.
#[derive(Debug, Clone, Serialize)]
pub struct Shown {
    pub kind: String,
    pub message: String,
}

/// Controller plus the doubles standing in for the browser.
pub struct Session {
    pub controller: PageController,
    pub transport: Rc<MockTransport>,
    pub toolkit: Rc<DomToolkit>,
    pub scheduler: Rc<ManualScheduler>,
    pub mount: MountReport,
    toasts: NotificationLog,
    alert: Rc<AlertNotifier>,
    toast: bool,
}

/// How to build a session.
pub struct SessionOptions<'a> {
    pub cookies: &'a str,
    pub product_id: Option<String>,
    /// Whether a toast surface is present; alerts are used otherwise.
    pub toast: bool,
}

impl Session {
    /// Parse `markup`, mount a controller on it and return the session.
    pub fn open(markup: &str, config: &PdpConfig, options: SessionOptions<'_>) -> Result<Self> {
        let page = Page::from_html(markup)
            .context("Failed to parse page")?
            .with_cookies(options.cookies);

        let product_id = match options.product_id {
            Some(id) => id.into(),
            None => detect_product_id(&page, &config.carousel.main_id_prefix)
                .ok_or_else(|| anyhow!("No product id on the page; pass one explicitly"))?,
        };

        let transport = Rc::new(MockTransport::new());
        let toolkit = Rc::new(DomToolkit::new());
        let scheduler = Rc::new(ManualScheduler::new());
        let toasts = NotificationLog::new();
        let alert = Rc::new(AlertNotifier::new());
        let center = if options.toast {
            NotificationCenter::with_toast(Rc::new(toasts.clone()), alert.clone())
        } else {
            NotificationCenter::alert_only(alert.clone())
        };

        let services = Services::new(
            transport.clone(),
            toolkit.clone(),
            Rc::new(center),
            scheduler.clone(),
        );
        let controller = PageController::new(
            PageContext::new(share(page), product_id),
            config.clone(),
            services,
        );
        let mount = controller.mount();

        Ok(Self {
            controller,
            transport,
            toolkit,
            scheduler,
            mount,
            toasts,
            alert,
            toast: options.toast,
        })
    }

    pub fn page(&self) -> &SharedPage {
        self.controller.context().page()
    }

    /// First element matching `selector`.
    pub fn node(&self, selector: &str) -> Result<NodeId> {
        self.page()
            .borrow()
            .query(selector)?
            .ok_or_else(|| anyhow!("No element matches {selector}"))
    }

    /// Every notification shown so far.
    pub fn notifications(&self) -> Vec<Shown> {
        if self.toast {
            self.toasts
                .entries()
                .into_iter()
                .map(|n| Shown {
                    kind: n.kind.to_string(),
                    message: n.message,
                })
                .collect()
        } else {
            self.alert
                .alerts()
                .into_iter()
                .map(|message| Shown {
                    kind: "alert".to_string(),
                    message,
                })
                .collect()
        }
    }
}
