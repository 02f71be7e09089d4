//! Transient notifications.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Outcome a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Vertical placement of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gravity {
    #[default]
    Top,
    Bottom,
}

/// Horizontal placement of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    Center,
    #[default]
    Right,
}

/// Presentation of a toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastStyle {
    pub duration_ms: u64,
    pub close: bool,
    pub gravity: Gravity,
    pub position: Position,
    pub background: String,
}

impl ToastStyle {
    pub fn success() -> Self {
        Self::with_background("#28a745")
    }

    pub fn error() -> Self {
        Self::with_background("#dc3545")
    }

    fn with_background(background: &str) -> Self {
        Self {
            duration_ms: 3000,
            close: true,
            gravity: Gravity::Top,
            position: Position::Right,
            background: background.to_string(),
        }
    }
}

/// A message for the shopper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    pub style: ToastStyle,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Success,
            style: ToastStyle::success(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Error,
            style: ToastStyle::error(),
        }
    }

    pub fn with_style(mut self, style: ToastStyle) -> Self {
        self.style = style;
        self
    }
}

/// A surface that shows notifications.
pub trait Notifier {
    fn notify(&self, notification: &Notification);
}

/// Fallback surface when no toast library is present: a blocking alert.
///
/// Outside a browser the dialog is a log line; the texts are kept so hosts
/// and tests can inspect what would have been shown.
#[derive(Debug, Default)]
pub struct AlertNotifier {
    alerts: RefCell<Vec<String>>,
}

impl AlertNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alert texts shown so far.
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }
}

impl Notifier for AlertNotifier {
    fn notify(&self, notification: &Notification) {
        match notification.kind {
            NotificationKind::Success => tracing::info!(message = %notification.message, "alert"),
            NotificationKind::Error => tracing::warn!(message = %notification.message, "alert"),
        }
        self.alerts.borrow_mut().push(notification.message.clone());
    }
}

/// Toast surface that records every notification it shows.
#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    entries: Rc<RefCell<Vec<Notification>>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Notification> {
        self.entries.borrow().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .map(|n| n.message.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn last(&self) -> Option<Notification> {
        self.entries.borrow().last().cloned()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: &Notification) {
        tracing::debug!(kind = %notification.kind, message = %notification.message, "toast");
        self.entries.borrow_mut().push(notification.clone());
    }
}

/// Routes notifications to the toast surface when one is available and to
/// the alert fallback otherwise.
#[derive(Clone)]
pub struct NotificationCenter {
    toast: Option<Rc<dyn Notifier>>,
    alert: Rc<dyn Notifier>,
}

impl NotificationCenter {
    /// Center with a toast surface.
    pub fn with_toast(toast: Rc<dyn Notifier>, alert: Rc<dyn Notifier>) -> Self {
        Self {
            toast: Some(toast),
            alert,
        }
    }

    /// Center that only has the alert fallback.
    pub fn alert_only(alert: Rc<dyn Notifier>) -> Self {
        Self { toast: None, alert }
    }

    pub fn has_toast(&self) -> bool {
        self.toast.is_some()
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, notification: &Notification) {
        match &self.toast {
            Some(toast) => toast.notify(notification),
            None => self.alert.notify(notification),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_prefers_toast() {
        let toast = NotificationLog::new();
        let alert = Rc::new(AlertNotifier::new());
        let center = NotificationCenter::with_toast(Rc::new(toast.clone()), alert.clone());

        center.notify(&Notification::success("OK"));
        assert_eq!(toast.messages(), vec!["OK"]);
        assert!(alert.alerts().is_empty());
    }

    #[test]
    fn test_center_falls_back_to_alert() {
        let alert = Rc::new(AlertNotifier::new());
        let center = NotificationCenter::alert_only(alert.clone());

        center.notify(&Notification::error("Erreur: Jeton CSRF manquant."));
        assert_eq!(alert.alerts(), vec!["Erreur: Jeton CSRF manquant."]);
    }

    #[test]
    fn test_default_styles() {
        assert_eq!(Notification::success("x").style.background, "#28a745");
        let error = Notification::error("x");
        assert_eq!(error.style.background, "#dc3545");
        assert_eq!(error.style.duration_ms, 3000);
        assert_eq!(error.style.gravity, Gravity::Top);
        assert_eq!(error.style.position, Position::Right);
    }
}
