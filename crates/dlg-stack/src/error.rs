//! Error types for the dialog protocol.

use thiserror::Error;

use crate::event::DialogId;

pub type Result<T> = std::result::Result<T, DialogError>;

/// Failure reported by a user hook (loader, pre-open, resolver, pre-close).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HookError {
    message: String,
}

impl HookError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for HookError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for HookError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// A focus-return target could not take focus. Never escapes destroy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FocusError {
    #[error("focus target is detached")]
    Detached,

    #[error("focus rejected: {0}")]
    Rejected(String),
}

/// Errors surfaced by `open()` and close attempts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialogError {
    #[error("{id} has no content: set component() or load_component() before open()")]
    MissingContent { id: DialogId },

    #[error("{id} cannot open: no anchor is registered")]
    NoAnchor { id: DialogId },

    #[error("{id} was already opened")]
    AlreadyOpened { id: DialogId },

    #[error("content loader failed: {0}")]
    Loader(#[source] HookError),

    #[error("pre-open hook failed: {0}")]
    PreOpen(#[source] HookError),

    #[error("resolver failed: {0}")]
    Resolver(#[source] HookError),

    #[error("pre-close hook failed: {0}")]
    PreClose(#[source] HookError),

    #[error("{id} was torn down before it settled")]
    Cancelled { id: DialogId },

    #[error("dialog no longer exists")]
    Detached,

    #[error("task queue rejected dialog work: {0}")]
    Spawn(String),
}

impl DialogError {
    /// The hook failure behind this error, if any.
    #[must_use]
    pub fn hook_error(&self) -> Option<&HookError> {
        match self {
            Self::Loader(e) | Self::PreOpen(e) | Self::Resolver(e) | Self::PreClose(e) => Some(e),
            _ => None,
        }
    }
}
