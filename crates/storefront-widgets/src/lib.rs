//! Injected UI capabilities for storefront page controllers.
//!
//! Page controllers never talk to a concrete carousel, modal or toast
//! library. They are handed:
//! - `Toolkit` - carousel mount/advance/pause/resume and modal show
//! - `Notifier` - transient notifications, with an alert fallback
//! - `Scheduler` - deferred callbacks (`setTimeout`)
//!
//! `DomToolkit`, `AlertNotifier`, `NotificationLog`, `ManualScheduler` and
//! `TokioScheduler` are the in-crate implementations.

mod carousel;
mod modal;
mod notify;
mod scheduler;
mod toolkit;

pub use carousel::*;
pub use modal::*;
pub use notify::*;
pub use scheduler::*;
pub use toolkit::*;
