//! The public adapter handle.

use crate::completion::{completion, Completion};
use crate::config::{AdapterConfig, KeyGenerator};
use crate::connection::{ConnectionManager, ConnectionState};
use crate::error::{AdapterError, AdapterResult};
use crate::fanout::BatchReport;
use crate::probe::{probe, Environment};
use crate::record::{Record, RemoveTarget};
use lawnstore_engine::{Factory, Key};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::info;

/// State shared by the public handle and the operations it issues.
pub(crate) struct Inner<F: Factory> {
    pub(crate) manager: Arc<ConnectionManager<F>>,
    pub(crate) keys: Arc<dyn KeyGenerator>,
    pub(crate) supports_auto_key: bool,
}

/// A key-value store backed by an object-store engine.
///
/// Every operation returns a [`Completion`] and is issued at call time. Calls
/// made before the store is open are parked and replayed in call order once
/// it is, so callers never wait for readiness themselves.
///
/// Dropping the adapter drops parked operations; their completions resolve
/// to [`AdapterError::Closed`].
///
/// # Example
///
/// ```rust
/// use lawnstore_core::{Adapter, AdapterConfig, Environment, Record};
/// use lawnstore_engine::MemoryFactory;
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), lawnstore_core::AdapterError> {
/// let env = Environment::standard(MemoryFactory::new());
/// let (adapter, opened) = Adapter::open(AdapterConfig::new("notes"), env)?;
///
/// let saved = adapter.save(Record::new(json!({"title": "milk"}))).await?;
/// opened.await?;
///
/// let key = saved.key.clone().unwrap();
/// assert_eq!(adapter.get(key).await?, Some(saved));
/// # Ok(())
/// # }
/// ```
pub struct Adapter<F: Factory> {
    inner: Arc<Inner<F>>,
}

impl<F: Factory> Adapter<F> {
    /// Returns true when the environment offers a usable engine.
    #[must_use]
    pub fn is_valid(env: &Environment<F>) -> bool {
        probe(env).available
    }

    /// Opens (creating or upgrading as needed) the named store.
    ///
    /// The adapter is usable immediately; the returned completion resolves
    /// once the store is ready or has failed to open.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Unavailable`] when the environment has no
    /// engine.
    pub fn open(
        config: AdapterConfig,
        env: Environment<F>,
    ) -> AdapterResult<(Self, Completion<()>)> {
        let capabilities = probe(&env);
        let factory = env.into_factory().ok_or(AdapterError::Unavailable)?;
        info!(
            db = %config.name,
            auto_key = capabilities.supports_auto_key,
            "opening adapter"
        );

        let (completer, opened) = completion();
        let manager = ConnectionManager::new(
            config.name,
            factory,
            capabilities.supports_auto_key,
            Box::new(move |result: AdapterResult<()>| completer.complete(result)),
        );
        let adapter = Self {
            inner: Arc::new(Inner {
                manager: Arc::clone(&manager),
                keys: config.key_generator,
                supports_auto_key: capabilities.supports_auto_key,
            }),
        };

        manager.start();
        Ok((adapter, opened))
    }

    /// Name of the database.
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.manager.name()
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.manager.state()
    }

    /// Returns true once the store is open. Never reverts.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.manager.gate().is_ready()
    }

    /// Number of operations parked until the store is open.
    #[must_use]
    pub fn pending_operations(&self) -> usize {
        self.inner.manager.gate().waiting()
    }

    /// Returns true when the engine generates keys for keyless records.
    #[must_use]
    pub fn supports_auto_key(&self) -> bool {
        self.inner.supports_auto_key
    }

    /// Runs `op` once the store is open.
    ///
    /// Parked operations hold the adapter weakly; if it is gone by replay
    /// time the operation is dropped along with its completer.
    fn gated<Op>(&self, op: Op)
    where
        Op: FnOnce(&Inner<F>) + Send + 'static,
    {
        let inner: Weak<Inner<F>> = Arc::downgrade(&self.inner);
        self.inner.manager.gate().run_or_defer(Box::new(move || {
            if let Some(inner) = inner.upgrade() {
                op(&inner);
            }
        }));
    }

    /// Upserts a record. A keyless record gets a key; the stored record is
    /// returned with its effective key.
    ///
    /// On failure the error is [`AdapterError::Save`], which carries the
    /// input record unchanged.
    pub fn save(&self, record: Record) -> Completion<Record> {
        let (completer, completion) = completion();
        self.gated(move |inner| {
            inner.save(record, move |result| {
                completer.complete(
                    result.map_err(|(err, record)| AdapterError::save_failed(err, record)),
                );
            });
        });
        completion
    }

    /// Saves every record concurrently.
    ///
    /// The report's results align with `records`. Elements that failed keep
    /// the input record in their slot.
    pub fn batch(&self, records: Vec<Record>) -> Completion<BatchReport<Record>> {
        let (completer, completion) = completion();
        self.gated(move |inner| {
            inner.batch(records, move |report| completer.complete(Ok(report)));
        });
        completion
    }

    /// Fetches one record; `None` when the key is absent.
    pub fn get(&self, key: impl Into<Key>) -> Completion<Option<Record>> {
        let key = key.into();
        let (completer, completion) = completion();
        self.gated(move |inner| inner.get(key, move |r| completer.complete(r)));
        completion
    }

    /// Fetches several records concurrently; absent keys yield `None` at
    /// their position.
    pub fn get_many(&self, keys: Vec<Key>) -> Completion<BatchReport<Option<Record>>> {
        let (completer, completion) = completion();
        self.gated(move |inner| {
            inner.get_many(keys, move |report| completer.complete(Ok(report)));
        });
        completion
    }

    /// Returns true when a record with this key exists.
    pub fn exists(&self, key: impl Into<Key>) -> Completion<bool> {
        let key = key.into();
        let (completer, completion) = completion();
        self.gated(move |inner| inner.exists(key, move |r| completer.complete(r)));
        completion
    }

    /// Deletes a record given its key or the record itself. Absent keys are
    /// not an error.
    ///
    /// A record that was never saved fails with [`AdapterError::MissingKey`].
    pub fn remove(&self, target: impl Into<RemoveTarget>) -> Completion<()> {
        let target = target.into();
        let (completer, completion) = completion();
        self.gated(move |inner| inner.remove(target, move |r| completer.complete(r)));
        completion
    }

    /// Deletes several records concurrently.
    pub fn remove_many(&self, targets: Vec<RemoveTarget>) -> Completion<BatchReport<()>> {
        let (completer, completion) = completion();
        self.gated(move |inner| {
            inner.remove_many(targets, move |report| completer.complete(Ok(report)));
        });
        completion
    }

    /// Deletes every record.
    pub fn nuke(&self) -> Completion<()> {
        let (completer, completion) = completion();
        self.gated(move |inner| inner.nuke(move |r| completer.complete(r)));
        completion
    }

    /// Every record, in key order.
    pub fn all(&self) -> Completion<Vec<Record>> {
        let (completer, completion) = completion();
        self.gated(move |inner| inner.all(move |r| completer.complete(r)));
        completion
    }

    /// Every key, in key order.
    pub fn keys(&self) -> Completion<Vec<Key>> {
        let (completer, completion) = completion();
        self.gated(move |inner| inner.keys(move |r| completer.complete(r)));
        completion
    }
}

impl<F: Factory> fmt::Debug for Adapter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("pending", &self.pending_operations())
            .finish()
    }
}
