//! Error types for page actions.

use storefront_dom::DomError;
use storefront_fetch::FetchError;
use thiserror::Error;

/// Why a page action did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Input rejected before any request.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("CSRF token missing")]
    MissingCsrfToken,

    /// Transport failure, non-2xx status, timeout or undecodable body.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The backend answered 2xx but reported a logical failure.
    #[error("Rejected by server: {}", message.as_deref().unwrap_or("no message"))]
    Rejected { message: Option<String> },

    /// The page lacks an element the action needs.
    #[error("Missing element: {0}")]
    MissingElement(String),

    #[error(transparent)]
    Dom(#[from] DomError),
}

impl ActionError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingElement(what.into())
    }

    /// Short kind label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::MissingCsrfToken => "missing_csrf_token",
            Self::Fetch(_) => "fetch",
            Self::Rejected { .. } => "rejected",
            Self::MissingElement(_) => "missing_element",
            Self::Dom(_) => "dom",
        }
    }
}

pub type ActionResult<T> = std::result::Result<T, ActionError>;
