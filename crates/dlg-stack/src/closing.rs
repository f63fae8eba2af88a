//! Awaitable handles returned by `open()` and close attempts.
//!
//! Both wrap a oneshot receiver. The protocol work itself runs on the
//! task queue, so dropping one of these never cancels an open or a close.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;

use crate::error::DialogError;
use crate::event::{CloseOutcome, DialogId, ModalEvent};

pub(crate) type CompletionSender = oneshot::Sender<Result<ModalEvent, DialogError>>;

/// Settles once with the dialog's [`ModalEvent`].
///
/// Resolves to [`DialogError::Cancelled`] if the dialog is destroyed before
/// it settles.
#[derive(Debug)]
#[must_use = "a completion does nothing unless awaited"]
pub struct Completion {
    id: DialogId,
    rx: oneshot::Receiver<Result<ModalEvent, DialogError>>,
}

impl Completion {
    pub(crate) fn channel(id: DialogId) -> (CompletionSender, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { id, rx })
    }

    pub(crate) fn failed(id: DialogId, error: DialogError) -> Self {
        let (tx, completion) = Self::channel(id);
        // The receiver is alive, so the send cannot fail.
        let _ = tx.send(Err(error));
        completion
    }

    #[must_use]
    pub fn id(&self) -> DialogId {
        self.id
    }

    /// Non-blocking check. `None` while unsettled.
    pub fn try_settled(&mut self) -> Option<Result<ModalEvent, DialogError>> {
        match self.rx.try_recv() {
            Ok(Some(result)) => Some(result),
            Ok(None) => None,
            Err(oneshot::Canceled) => Some(Err(DialogError::Cancelled { id: self.id })),
        }
    }
}

impl Future for Completion {
    type Output = Result<ModalEvent, DialogError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let id = self.id;
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(DialogError::Cancelled { id })),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Outcome of one close attempt.
#[derive(Debug)]
#[must_use = "close attempts report vetoes and hook failures through this status"]
pub struct ClosingStatus {
    id: DialogId,
    rx: oneshot::Receiver<Result<CloseOutcome, DialogError>>,
}

pub(crate) type ClosingSender = oneshot::Sender<Result<CloseOutcome, DialogError>>;

impl ClosingStatus {
    pub(crate) fn channel(id: DialogId) -> (ClosingSender, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { id, rx })
    }

    pub(crate) fn failed(id: DialogId, error: DialogError) -> Self {
        let (tx, status) = Self::channel(id);
        let _ = tx.send(Err(error));
        status
    }

    pub(crate) fn detached(id: DialogId) -> Self {
        Self::failed(id, DialogError::Detached)
    }

    #[must_use]
    pub fn id(&self) -> DialogId {
        self.id
    }

    /// Non-blocking check. `None` while hooks are still deciding.
    pub fn try_outcome(&mut self) -> Option<Result<CloseOutcome, DialogError>> {
        match self.rx.try_recv() {
            Ok(Some(result)) => Some(result),
            Ok(None) => None,
            Err(oneshot::Canceled) => Some(Err(DialogError::Cancelled { id: self.id })),
        }
    }
}

impl Future for ClosingStatus {
    type Output = Result<CloseOutcome, DialogError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let id = self.id;
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(DialogError::Cancelled { id })),
            Poll::Pending => Poll::Pending,
        }
    }
}
