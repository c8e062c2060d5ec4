//! Test fixtures and adapter helpers.
//!
//! Provides adapters over the in-memory engine, with the engine handle kept
//! alongside for inspection and fault injection.

use lawnstore_core::{
    Adapter, AdapterConfig, AdapterResult, Binding, Completion, Environment, KeyGenerator, Record,
    Vendor,
};
use lawnstore_engine::{Key, MemoryFactory};
use std::sync::atomic::{AtomicU64, Ordering};

/// Database name used by the fixtures.
pub const TEST_DB: &str = "lawnstore-test";

/// Takes the outcome of an operation that must already have completed.
///
/// The in-memory engine completes requests synchronously, so any operation
/// issued against a ready adapter has an outcome by the time its method
/// returns.
///
/// # Panics
///
/// Panics if the operation is still pending.
pub fn settle<T>(mut completion: Completion<T>) -> AdapterResult<T> {
    completion
        .try_result()
        .expect("operation is still pending")
}

/// Generates `key-0`, `key-1`, ... in order.
#[derive(Debug, Default)]
pub struct SequentialKeys {
    next: AtomicU64,
}

impl KeyGenerator for SequentialKeys {
    fn generate(&self) -> Key {
        Key::Text(format!("key-{}", self.next.fetch_add(1, Ordering::SeqCst)))
    }
}

/// An adapter over an in-memory engine.
pub struct TestAdapter {
    /// The adapter under test.
    pub adapter: Adapter<MemoryFactory>,
    /// Handle to the engine the adapter runs on.
    pub factory: MemoryFactory,
    opened: Option<Completion<()>>,
}

impl TestAdapter {
    /// Opens an adapter on a fresh engine with the standard binding.
    ///
    /// # Panics
    ///
    /// Panics if the store fails to open.
    pub fn memory() -> Self {
        Self::open(MemoryFactory::new(), Binding::Standard).ready()
    }

    /// Opens an adapter through a vendor binding, so keys are generated by
    /// the adapter rather than the engine.
    ///
    /// # Panics
    ///
    /// Panics if the store fails to open.
    pub fn vendor() -> Self {
        Self::open(MemoryFactory::new(), Binding::Vendor(Vendor::Webkit)).ready()
    }

    /// Opens an adapter whose engine holds the open request until
    /// [`TestAdapter::release`].
    pub fn held() -> Self {
        let factory = MemoryFactory::new();
        factory.hold_opens();
        Self::open(factory, Binding::Standard)
    }

    /// Opens an adapter on `factory`, which may already hold databases.
    ///
    /// # Panics
    ///
    /// Panics if the environment is rejected.
    pub fn open(factory: MemoryFactory, binding: Binding) -> Self {
        Self::open_with(factory, binding, AdapterConfig::new(TEST_DB))
    }

    /// Opens an adapter with an explicit configuration.
    ///
    /// # Panics
    ///
    /// Panics if the environment is rejected.
    pub fn open_with(factory: MemoryFactory, binding: Binding, config: AdapterConfig) -> Self {
        let env = Environment::new(factory.clone(), binding);
        let (adapter, opened) = Adapter::open(config, env).expect("environment has an engine");
        Self {
            adapter,
            factory,
            opened: Some(opened),
        }
    }

    /// Releases held opens and returns the open outcome.
    ///
    /// # Panics
    ///
    /// Panics if the open outcome was already taken or is still pending.
    pub fn release(&mut self) -> AdapterResult<()> {
        self.factory.release_opens();
        self.open_outcome().expect("open completed after release")
    }

    /// Returns the open outcome once, if it is available.
    pub fn open_outcome(&mut self) -> Option<AdapterResult<()>> {
        let result = self.opened.as_mut()?.try_result()?;
        self.opened = None;
        Some(result)
    }

    fn ready(mut self) -> Self {
        let outcome = self.open_outcome();
        assert_eq!(outcome, Some(Ok(())), "store failed to open");
        self
    }
}

impl std::ops::Deref for TestAdapter {
    type Target = Adapter<MemoryFactory>;

    fn deref(&self) -> &Self::Target {
        &self.adapter
    }
}

/// Runs a test with a ready in-memory adapter.
///
/// # Example
///
/// ```rust
/// use lawnstore_core::Record;
/// use lawnstore_testkit::{settle, with_adapter};
/// use serde_json::json;
///
/// with_adapter(|adapter| {
///     let saved = settle(adapter.save(Record::new(json!("hi")))).unwrap();
///     assert!(saved.key.is_some());
/// });
/// ```
pub fn with_adapter<F, R>(f: F) -> R
where
    F: FnOnce(&Adapter<MemoryFactory>) -> R,
{
    let test = TestAdapter::memory();
    f(&test.adapter)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use lawnstore_core::{LEGACY_STORE_NAME, STORE_NAME};
    use lawnstore_engine::StoreParams;
    use serde_json::json;

    /// An adapter holding `count` records keyed `0..count`, each with data
    /// `{"index": i}`.
    ///
    /// # Panics
    ///
    /// Panics if the records cannot be saved.
    pub fn populated_adapter(count: i64) -> TestAdapter {
        let test = TestAdapter::memory();
        let records = (0..count)
            .map(|i| Record::with_key(i, json!({ "index": i })))
            .collect();
        let report = settle(test.batch(records)).expect("batch completes");
        assert!(report.is_ok(), "seed batch failed");
        test
    }

    /// An engine holding a database left by an older schema at `version`,
    /// with both the legacy and the current store populated.
    pub fn stale_engine(version: u64, records: usize) -> MemoryFactory {
        let factory = MemoryFactory::new();
        let rows: Vec<_> = (0..records)
            .map(|i| (Key::Text(format!("old-{i}")), json!({ "stale": i })))
            .collect();
        factory.seed_store(TEST_DB, version, LEGACY_STORE_NAME, StoreParams::default(), rows.clone());
        factory.seed_store(TEST_DB, version, STORE_NAME, StoreParams::default(), rows);
        factory
    }
}
