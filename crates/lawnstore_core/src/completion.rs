//! Single-fire completions handed to callers.

use crate::error::{AdapterError, AdapterResult};
use futures_channel::oneshot;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// The pending outcome of an adapter operation.
///
/// The operation is issued (or parked behind the readiness gate) when the
/// method returning the completion is called, not when the completion is
/// first polled. Dropping a completion does not cancel the operation.
#[must_use = "completions carry the operation's outcome"]
#[derive(Debug)]
pub struct Completion<T> {
    rx: oneshot::Receiver<AdapterResult<T>>,
}

/// The adapter's side of a [`Completion`].
#[derive(Debug)]
pub(crate) struct Completer<T> {
    tx: oneshot::Sender<AdapterResult<T>>,
}

/// Creates a linked completer/completion pair.
pub(crate) fn completion<T>() -> (Completer<T>, Completion<T>) {
    let (tx, rx) = oneshot::channel();
    (Completer { tx }, Completion { rx })
}

impl<T> Completer<T> {
    /// Delivers the outcome. A caller that dropped its completion is not an
    /// error.
    pub(crate) fn complete(self, result: AdapterResult<T>) {
        let _ = self.tx.send(result);
    }
}

impl<T> Completion<T> {
    /// Returns the outcome if it is already available, without waiting.
    ///
    /// Returns `None` while the operation is still pending (for example when
    /// it is parked behind the readiness gate).
    pub fn try_result(&mut self) -> Option<AdapterResult<T>> {
        match self.rx.try_recv() {
            Ok(Some(result)) => Some(result),
            Ok(None) => None,
            Err(oneshot::Canceled) => Some(Err(AdapterError::Closed)),
        }
    }
}

impl<T> Future for Completion<T> {
    type Output = AdapterResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(AdapterError::Closed)),
            Poll::Pending => Poll::Pending,
        }
    }
}
