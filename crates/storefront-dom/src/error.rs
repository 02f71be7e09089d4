//! Page model error types.

use thiserror::Error;

/// Errors raised by the page model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// Selector could not be parsed.
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// Markup could not be parsed.
    #[error("HTML parse error at byte {offset}: {reason}")]
    Parse { offset: usize, reason: String },
}
