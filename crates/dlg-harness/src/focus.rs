//! Focus-return target double.

use std::cell::Cell;

use dlg_stack::{FocusError, FocusTarget};

/// Counts focus requests; can simulate a detached element.
#[derive(Debug, Default)]
pub struct RecordingFocus {
    calls: Cell<usize>,
    detached: Cell<bool>,
}

impl RecordingFocus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A target whose element has left the tree.
    #[must_use]
    pub fn detached() -> Self {
        let target = Self::default();
        target.detached.set(true);
        target
    }

    /// Focus attempts, failed ones included.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl FocusTarget for RecordingFocus {
    fn focus(&self) -> Result<(), FocusError> {
        self.calls.set(self.calls.get() + 1);
        if self.detached.get() {
            Err(FocusError::Detached)
        } else {
            Ok(())
        }
    }
}
