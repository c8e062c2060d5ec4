//! Readiness gate and deferral queue.
//!
//! Operations issued before the store is open are parked here as thunks and
//! replayed in arrival order once the connection manager opens the gate.

use parking_lot::Mutex;
use std::collections::VecDeque;

/// A parked operation.
pub(crate) type Deferred = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct GateState {
    ready: bool,
    waiting: VecDeque<Deferred>,
}

/// Serializes early callers against the one-time readiness transition.
#[derive(Default)]
pub(crate) struct ReadinessGate {
    state: Mutex<GateState>,
}

impl ReadinessGate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns true once the gate has opened. Never reverts.
    pub(crate) fn is_ready(&self) -> bool {
        self.state.lock().ready
    }

    /// Number of operations waiting for readiness.
    pub(crate) fn waiting(&self) -> usize {
        self.state.lock().waiting.len()
    }

    /// Runs `op` now if the gate is open, otherwise parks it.
    pub(crate) fn run_or_defer(&self, op: Deferred) {
        let mut state = self.state.lock();
        if state.ready {
            drop(state);
            op();
        } else {
            state.waiting.push_back(op);
        }
    }

    /// Opens the gate, replaying parked operations in order.
    ///
    /// The flag only flips once the queue is empty, so operations arriving
    /// while earlier ones replay are queued behind them instead of
    /// overtaking them. The lock is never held while an operation runs.
    pub(crate) fn open(&self) {
        loop {
            let next = {
                let mut state = self.state.lock();
                match state.waiting.pop_front() {
                    Some(op) => op,
                    None => {
                        state.ready = true;
                        return;
                    }
                }
            };
            next();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) -> Deferred) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let make = move |n: u32| -> Deferred {
            let sink = Arc::clone(&sink);
            Box::new(move || sink.lock().push(n))
        };
        (log, make)
    }

    #[test]
    fn closed_gate_parks_operations() {
        let gate = ReadinessGate::new();
        let (log, op) = recorder();
        gate.run_or_defer(op(1));
        gate.run_or_defer(op(2));

        assert!(!gate.is_ready());
        assert_eq!(gate.waiting(), 2);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn open_replays_in_arrival_order() {
        let gate = ReadinessGate::new();
        let (log, op) = recorder();
        for n in 1..=5 {
            gate.run_or_defer(op(n));
        }

        gate.open();
        assert!(gate.is_ready());
        assert_eq!(gate.waiting(), 0);
        assert_eq!(*log.lock(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn open_gate_runs_immediately() {
        let gate = ReadinessGate::new();
        gate.open();
        let (log, op) = recorder();
        gate.run_or_defer(op(9));
        assert_eq!(*log.lock(), vec![9]);
    }

    #[test]
    fn arrivals_during_replay_queue_behind() {
        let gate = Arc::new(ReadinessGate::new());
        let (log, op) = recorder();
        let op = Arc::new(op);

        let inner_gate = Arc::clone(&gate);
        let inner_op = Arc::clone(&op);
        let sink = Arc::clone(&log);
        gate.run_or_defer(Box::new(move || {
            sink.lock().push(1);
            inner_gate.run_or_defer(inner_op(3));
        }));
        gate.run_or_defer(op(2));

        gate.open();
        assert_eq!(*log.lock(), vec![1, 2, 3]);
    }
}
