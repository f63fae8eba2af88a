#![forbid(unsafe_code)]

//! Normalised hook results.
//!
//! Hooks may answer synchronously, with a future, or with a stream. Each
//! shape is collapsed at the boundary into a single async result so the
//! protocol code only ever awaits one type.
//!
//! | Input                        | [`Verdict`]       | [`Resolution`]   |
//! |------------------------------|-------------------|------------------|
//! | `()`                         | allow             | n/a              |
//! | `bool` / `Value`             | as given          | as given         |
//! | future of `Result<_>`        | awaited           | awaited          |
//! | stream of `Result<_>`        | first item        | first item       |
//! | empty stream                 | allow             | `Value::Null`    |

use std::future::Future;
use std::pin::pin;

use futures::future::LocalBoxFuture;
use futures::{FutureExt, Stream, StreamExt};
use serde_json::Value;

use crate::error::HookError;

enum Pending<T> {
    Ready(Result<T, HookError>),
    Deferred(LocalBoxFuture<'static, Result<T, HookError>>),
}

impl<T: 'static> Pending<T> {
    fn from_stream<S>(stream: S, empty: T) -> Self
    where
        S: Stream<Item = Result<T, HookError>> + 'static,
    {
        Self::Deferred(
            async move {
                let mut stream = pin!(stream);
                stream.next().await.unwrap_or(Ok(empty))
            }
            .boxed_local(),
        )
    }

    fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    async fn settle(self) -> Result<T, HookError> {
        match self {
            Self::Ready(result) => result,
            Self::Deferred(future) => future.await,
        }
    }
}

/// Whether a gated transition (open or close) may proceed.
pub struct Verdict(Pending<bool>);

impl Verdict {
    #[must_use]
    pub fn allow() -> Self {
        Self(Pending::Ready(Ok(true)))
    }

    #[must_use]
    pub fn deny() -> Self {
        Self(Pending::Ready(Ok(false)))
    }

    #[must_use]
    pub fn fail(error: impl Into<HookError>) -> Self {
        Self(Pending::Ready(Err(error.into())))
    }

    /// Decide later.
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Result<bool, HookError>> + 'static,
    {
        Self(Pending::Deferred(future.boxed_local()))
    }

    /// Decide with the stream's first item; an empty stream allows.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<bool, HookError>> + 'static,
    {
        Self(Pending::from_stream(stream, true))
    }

    /// Whether the answer is already known without awaiting.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.0.is_ready()
    }

    pub async fn settle(self) -> Result<bool, HookError> {
        self.0.settle().await
    }
}

impl Default for Verdict {
    fn default() -> Self {
        Self::allow()
    }
}

impl From<bool> for Verdict {
    fn from(allowed: bool) -> Self {
        Self(Pending::Ready(Ok(allowed)))
    }
}

impl From<()> for Verdict {
    fn from((): ()) -> Self {
        Self::allow()
    }
}

impl From<Result<bool, HookError>> for Verdict {
    fn from(result: Result<bool, HookError>) -> Self {
        Self(Pending::Ready(result))
    }
}

impl std::fmt::Debug for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Pending::Ready(result) => f.debug_tuple("Verdict").field(result).finish(),
            Pending::Deferred(_) => f.write_str("Verdict(<pending>)"),
        }
    }
}

/// Data produced by a resolver.
pub struct Resolution(Pending<Value>);

impl Resolution {
    #[must_use]
    pub fn ready(value: Value) -> Self {
        Self(Pending::Ready(Ok(value)))
    }

    #[must_use]
    pub fn fail(error: impl Into<HookError>) -> Self {
        Self(Pending::Ready(Err(error.into())))
    }

    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value, HookError>> + 'static,
    {
        Self(Pending::Deferred(future.boxed_local()))
    }

    /// Resolve to the stream's first item; an empty stream yields `Null`.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Value, HookError>> + 'static,
    {
        Self(Pending::from_stream(stream, Value::Null))
    }

    pub async fn settle(self) -> Result<Value, HookError> {
        self.0.settle().await
    }
}

impl From<Value> for Resolution {
    fn from(value: Value) -> Self {
        Self::ready(value)
    }
}

impl From<Result<Value, HookError>> for Resolution {
    fn from(result: Result<Value, HookError>) -> Self {
        Self(Pending::Ready(result))
    }
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Pending::Ready(result) => f.debug_tuple("Resolution").field(result).finish(),
            Pending::Deferred(_) => f.write_str("Resolution(<pending>)"),
        }
    }
}
