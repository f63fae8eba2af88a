//! Identity, completion and lifecycle event types.

use std::fmt;

use serde_json::Value;

/// Per-collection dialog identity. Ids increase monotonically in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DialogId(u64);

impl DialogId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DialogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dialog-{}", self.0)
    }
}

/// How a dialog finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalEventType {
    /// Dismissed without a result.
    Cancel,
    /// Accepted, usually with data.
    Confirm,
    /// Never shown: the pre-open hook declined.
    Reject,
}

impl ModalEventType {
    /// Stable numeric code (`0`, `1`, `2`).
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Cancel => 0,
            Self::Confirm => 1,
            Self::Reject => 2,
        }
    }
}

/// The value a dialog's completion settles with.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalEvent {
    pub kind: ModalEventType,
    pub data: Option<Value>,
}

impl ModalEvent {
    #[must_use]
    pub fn new(kind: ModalEventType, data: Option<Value>) -> Self {
        Self { kind, data }
    }

    #[must_use]
    pub fn cancel() -> Self {
        Self::new(ModalEventType::Cancel, None)
    }

    #[must_use]
    pub fn confirm(data: impl Into<Option<Value>>) -> Self {
        Self::new(ModalEventType::Confirm, data.into())
    }

    #[must_use]
    pub fn reject() -> Self {
        Self::new(ModalEventType::Reject, None)
    }
}

/// Collection lifecycle notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionEvent {
    /// The dialog's surface reported view-ready.
    Open(DialogId),
    /// The dialog was destroyed and removed.
    Close(DialogId),
}

/// Result of one close attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The completion settled and the dialog was destroyed.
    Closed,
    /// A pre-close hook declined; nothing changed.
    Vetoed,
    /// An earlier close (or destroy) already finished the dialog.
    AlreadyClosed,
}
