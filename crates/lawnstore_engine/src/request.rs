//! Single-fire completion of an engine request.
//!
//! Engines hand out a [`Request`] when an operation is issued and keep the
//! matching [`Responder`]. Whichever side arrives second triggers delivery:
//! a listener registered after completion runs immediately, a completion
//! arriving after registration runs the listener in place. Either way the
//! listener runs exactly once.

use crate::error::{EngineError, EngineResult};
use parking_lot::Mutex;
use std::mem;
use std::sync::Arc;

/// Callback receiving the outcome of a request.
pub type Listener<T> = Box<dyn FnOnce(EngineResult<T>) + Send>;

enum Slot<T> {
    Waiting,
    Listening(Listener<T>),
    Completed(EngineResult<T>),
    Delivered,
}

/// The caller's side of an issued engine request.
#[must_use = "a request does nothing observable until a listener is attached"]
pub struct Request<T> {
    slot: Arc<Mutex<Slot<T>>>,
}

/// The engine's side of an issued request.
///
/// Dropping a responder without completing it resolves the request with
/// [`EngineError::Aborted`].
pub struct Responder<T: Send + 'static> {
    slot: Option<Arc<Mutex<Slot<T>>>>,
}

impl<T: Send + 'static> Request<T> {
    /// Creates a pending request and the responder that completes it.
    pub fn pending() -> (Self, Responder<T>) {
        let slot = Arc::new(Mutex::new(Slot::Waiting));
        (
            Self {
                slot: Arc::clone(&slot),
            },
            Responder { slot: Some(slot) },
        )
    }

    /// Creates a request that has already completed.
    pub fn completed(result: EngineResult<T>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::Completed(result))),
        }
    }

    /// Shorthand for a request that completed with an error.
    pub fn failed(error: EngineError) -> Self {
        Self::completed(Err(error))
    }

    /// Returns true once the engine has produced a result.
    pub fn is_complete(&self) -> bool {
        matches!(*self.slot.lock(), Slot::Completed(_) | Slot::Delivered)
    }

    /// Takes the outcome if the engine has already produced it.
    ///
    /// Lets callers walk chains of synchronously completed requests in a
    /// loop instead of nesting listeners.
    ///
    /// # Errors
    ///
    /// Returns the request unchanged while it is still pending.
    pub fn try_take(self) -> Result<EngineResult<T>, Self> {
        let mut slot = self.slot.lock();
        match mem::replace(&mut *slot, Slot::Delivered) {
            Slot::Completed(result) => Ok(result),
            other => {
                *slot = other;
                drop(slot);
                Err(self)
            }
        }
    }

    /// Attaches the listener that receives the outcome.
    pub fn on_complete<F>(self, listener: F)
    where
        F: FnOnce(EngineResult<T>) + Send + 'static,
    {
        let mut slot = self.slot.lock();
        match mem::replace(&mut *slot, Slot::Delivered) {
            Slot::Completed(result) => {
                drop(slot);
                listener(result);
            }
            Slot::Waiting => *slot = Slot::Listening(Box::new(listener)),
            other => *slot = other,
        }
    }
}

impl<T: Send + 'static> Responder<T> {
    /// Completes the request, running the listener if one is attached.
    pub fn complete(mut self, result: EngineResult<T>) {
        self.deliver(result);
    }

    fn deliver(&mut self, result: EngineResult<T>) {
        let Some(slot) = self.slot.take() else {
            return;
        };
        let mut guard = slot.lock();
        match mem::replace(&mut *guard, Slot::Delivered) {
            Slot::Listening(listener) => {
                drop(guard);
                listener(result);
            }
            Slot::Waiting => *guard = Slot::Completed(result),
            other => *guard = other,
        }
    }
}

impl<T: Send + 'static> Drop for Responder<T> {
    fn drop(&mut self) {
        if self.slot.is_some() {
            self.deliver(Err(EngineError::Aborted));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn capture<T: Send + 'static>() -> (Arc<Mutex<Option<EngineResult<T>>>>, Listener<T>) {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        (seen, Box::new(move |r| *sink.lock() = Some(r)))
    }

    #[test]
    fn listener_after_completion_runs_immediately() {
        let (seen, listener) = capture::<u32>();
        let request = Request::completed(Ok(7));
        assert!(request.is_complete());
        request.on_complete(listener);
        assert_eq!(*seen.lock(), Some(Ok(7)));
    }

    #[test]
    fn completion_after_listener_runs_listener() {
        let (seen, listener) = capture::<u32>();
        let (request, responder) = Request::pending();
        request.on_complete(listener);
        assert!(seen.lock().is_none());

        responder.complete(Ok(3));
        assert_eq!(*seen.lock(), Some(Ok(3)));
    }

    #[test]
    fn dropped_responder_aborts() {
        let (seen, listener) = capture::<u32>();
        let (request, responder) = Request::pending();
        request.on_complete(listener);
        drop(responder);
        assert_eq!(*seen.lock(), Some(Err(EngineError::Aborted)));
    }

    #[test]
    fn listener_fires_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let (request, responder) = Request::<()>::pending();
        request.on_complete(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        responder.complete(Ok(()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn try_take_hands_back_pending_request() {
        let (request, responder) = Request::<u8>::pending();
        let request = request.try_take().err().unwrap();
        responder.complete(Ok(5));
        assert_eq!(request.try_take().ok(), Some(Ok(5)));
    }

    #[test]
    fn pending_request_is_not_complete() {
        let (request, responder) = Request::<()>::pending();
        assert!(!request.is_complete());
        responder.complete(Ok(()));
        assert!(request.is_complete());
    }
}
