//! Fan-out batch executor.
//!
//! Applies a single-record operation to every element of a collection at
//! once and reports one index-aligned aggregate when the last element
//! completes.

use crate::error::AdapterError;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Per-element continuation: the element's error, if any, and its result.
pub(crate) type ItemDone<T> = Box<dyn FnOnce(Option<AdapterError>, T) + Send>;

type BatchDone<T> = Box<dyn FnOnce(BatchReport<T>) + Send>;

/// Outcome of a fan-out over N inputs.
///
/// `results[i]` always belongs to input `i`, whatever order the elements
/// completed in. A result is present for failed elements too.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport<T> {
    /// Per-element results, aligned with the inputs.
    pub results: Vec<T>,
    /// `None` when every element succeeded; otherwise per-element errors
    /// aligned with the inputs, `None` at positions that succeeded.
    pub errors: Option<Vec<Option<AdapterError>>>,
}

impl<T> BatchReport<T> {
    /// Returns true when no element failed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_none()
    }

    /// Indices of the elements that failed.
    #[must_use]
    pub fn failed_indices(&self) -> Vec<usize> {
        self.errors
            .iter()
            .flatten()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|_| i))
            .collect()
    }

    /// Converts into the results, or a failure carrying both sequences.
    ///
    /// # Errors
    ///
    /// Returns [`BatchFailure`] when at least one element failed.
    pub fn into_result(self) -> Result<Vec<T>, BatchFailure<T>> {
        match self.errors {
            None => Ok(self.results),
            Some(errors) => Err(BatchFailure {
                results: self.results,
                errors,
            }),
        }
    }
}

/// A batch in which at least one element failed.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure<T> {
    /// Per-element results, aligned with the inputs.
    pub results: Vec<T>,
    /// Per-element errors, aligned with the inputs.
    pub errors: Vec<Option<AdapterError>>,
}

impl<T> fmt::Display for BatchFailure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = self.errors.iter().flatten().count();
        write!(f, "{failed} of {} batch operations failed", self.errors.len())
    }
}

impl<T: fmt::Debug> std::error::Error for BatchFailure<T> {}

struct Accumulator<T> {
    results: Vec<Option<T>>,
    errors: Vec<Option<AdapterError>>,
    failures: usize,
    outstanding: usize,
    done: Option<BatchDone<T>>,
}

impl<T: Send + 'static> Accumulator<T> {
    fn record(acc: &Mutex<Self>, index: usize, error: Option<AdapterError>, value: T) {
        let finished = {
            let mut acc = acc.lock();
            acc.results[index] = Some(value);
            if error.is_some() {
                acc.failures += 1;
            }
            acc.errors[index] = error;
            acc.outstanding -= 1;
            if acc.outstanding == 0 {
                acc.finish()
            } else {
                None
            }
        };

        if let Some((done, report)) = finished {
            done(report);
        }
    }

    fn finish(&mut self) -> Option<(BatchDone<T>, BatchReport<T>)> {
        let done = self.done.take()?;
        // Every slot has been filled exactly once by now.
        let results = std::mem::take(&mut self.results)
            .into_iter()
            .flatten()
            .collect();
        let errors = std::mem::take(&mut self.errors);
        let errors = (self.failures > 0).then_some(errors);
        Some((done, BatchReport { results, errors }))
    }
}

/// Runs `op` on every item without waiting for earlier items, then calls
/// `done` exactly once with the index-aligned report.
///
/// An empty input completes immediately with empty sequences.
pub(crate) fn fan_out<I, T, Op, Done>(items: Vec<I>, op: Op, done: Done)
where
    T: Send + 'static,
    Op: Fn(I, ItemDone<T>),
    Done: FnOnce(BatchReport<T>) + Send + 'static,
{
    let total = items.len();
    if total == 0 {
        done(BatchReport {
            results: Vec::new(),
            errors: None,
        });
        return;
    }

    let acc = Arc::new(Mutex::new(Accumulator {
        results: (0..total).map(|_| None).collect(),
        errors: vec![None; total],
        failures: 0,
        outstanding: total,
        done: Some(Box::new(done)),
    }));

    for (index, item) in items.into_iter().enumerate() {
        let acc = Arc::clone(&acc);
        op(
            item,
            Box::new(move |error, value| Accumulator::record(&acc, index, error, value)),
        );
    }
}
