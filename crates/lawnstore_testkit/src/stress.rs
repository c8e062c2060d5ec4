//! Stress drivers for the adapter.
//!
//! These exercise the fan-out and gate paths under volume and from several
//! threads at once.

use crate::fixtures::settle;
use lawnstore_core::{Adapter, Record};
use lawnstore_engine::{Key, MemoryFactory};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Outcome counts of a stress run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressReport {
    /// Operations that completed successfully.
    pub succeeded: usize,
    /// Operations that completed with an error.
    pub failed: usize,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
}

impl StressReport {
    fn finish(succeeded: usize, failed: usize, started: Instant) -> Self {
        Self {
            succeeded,
            failed,
            elapsed: started.elapsed(),
        }
    }

    /// Operations issued.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Completed operations per second; zero for an instant run.
    #[must_use]
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total() as f64 / secs
        } else {
            0.0
        }
    }
}

/// Configuration for stress runs.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Records per batch for batch runs.
    pub batch_size: usize,
    /// Number of distinct keys touched by mixed runs.
    pub key_space: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            threads: 4,
            batch_size: 100,
            key_space: 1_000,
        }
    }
}

fn payload(i: usize) -> serde_json::Value {
    json!({ "n": i, "tag": "stress" })
}

/// Saves keyless records one at a time.
pub fn stress_sequential_saves(
    adapter: &Adapter<MemoryFactory>,
    config: &StressConfig,
) -> StressReport {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        match settle(adapter.save(Record::new(payload(i)))) {
            Ok(_) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressReport::finish(successful, failed, start)
}

/// Saves records through fan-out batches, counting per element.
pub fn stress_batch_saves(
    adapter: &Adapter<MemoryFactory>,
    config: &StressConfig,
) -> StressReport {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    let batches = config.operations / config.batch_size.max(1);
    for batch in 0..batches {
        let records = (0..config.batch_size)
            .map(|i| Record::new(payload(batch * config.batch_size + i)))
            .collect();
        match settle(adapter.batch(records)) {
            Ok(report) => {
                let errors = report.failed_indices().len();
                failed += errors;
                successful += report.results.len() - errors;
            }
            Err(_) => failed += config.batch_size,
        }
    }

    StressReport::finish(successful, failed, start)
}

/// Cycles save, get and remove over a bounded key space.
pub fn stress_mixed_operations(
    adapter: &Adapter<MemoryFactory>,
    config: &StressConfig,
) -> StressReport {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let key = Key::Int((i % config.key_space.max(1)) as i64);

        let result = match i % 3 {
            0 => settle(adapter.save(Record::with_key(key, payload(i)))).map(|_| ()),
            1 => settle(adapter.get(key)).map(|_| ()),
            _ => settle(adapter.remove(key)),
        };

        match result {
            Ok(()) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressReport::finish(successful, failed, start)
}

/// Saves from several threads sharing one adapter.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn stress_concurrent_saves(
    adapter: Arc<Adapter<MemoryFactory>>,
    config: &StressConfig,
) -> StressReport {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.threads.max(1);

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let adapter = Arc::clone(&adapter);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);

            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let key = Key::Text(format!("t{t}-{i}"));
                    match settle(adapter.save(Record::with_key(key, payload(i)))) {
                        Ok(_) => {
                            successful.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(_) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressReport::finish(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start,
    )
}
