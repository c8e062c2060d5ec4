//! In-memory object-store engine for testing.

use crate::backend::{
    Connection, Cursor, CursorStep, Factory, ObjectStore, SchemaEditor, StoreParams,
    TransactionMode, UpgradeHandler, VersionChange,
};
use crate::error::{EngineError, EngineResult};
use crate::key::{Key, KeyRange, Value};
use crate::request::Request;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// How the engine negotiates database versions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EngineFlavor {
    /// Upgrades run inside `open`; lower requested versions conflict.
    #[default]
    Modern,
    /// `open` ignores the requested version; schema changes go through
    /// [`Connection::set_version`].
    Legacy,
}

/// Kinds of engine request, used to script failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// [`Factory::open`].
    Open,
    /// [`Factory::delete_database`].
    DeleteDatabase,
    /// [`Connection::set_version`].
    SetVersion,
    /// [`Connection::transaction`].
    Transaction,
    /// [`ObjectStore::put`].
    Put,
    /// [`ObjectStore::get`].
    Get,
    /// [`ObjectStore::delete`].
    Delete,
    /// [`ObjectStore::open_cursor`].
    OpenCursor,
    /// [`Cursor::advance`].
    Advance,
    /// [`ObjectStore::clear`].
    Clear,
}

#[derive(Debug, Clone)]
struct StoreData {
    auto_increment: bool,
    /// Next generated key; `None` once the generator has run out.
    next_key: Option<i64>,
    records: BTreeMap<Key, Value>,
}

impl StoreData {
    fn new(auto_increment: bool) -> Self {
        Self {
            auto_increment,
            next_key: Some(1),
            records: BTreeMap::new(),
        }
    }

    /// Moves the generator past an explicitly written integer key.
    fn observe_key(&mut self, n: i64) {
        if let Some(next) = self.next_key {
            if n >= next {
                self.next_key = n.checked_add(1);
            }
        }
    }

    fn generate_key(&mut self) -> EngineResult<Key> {
        let current = self.next_key.ok_or(EngineError::KeyGeneratorExhausted)?;
        self.next_key = current.checked_add(1);
        Ok(Key::Int(current))
    }
}

#[derive(Debug, Clone, Default)]
struct DatabaseData {
    version: u64,
    stores: BTreeMap<String, StoreData>,
}

impl SchemaEditor for DatabaseData {
    fn delete_object_store(&mut self, name: &str) -> EngineResult<()> {
        self.stores
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| EngineError::store_not_found(name))
    }

    fn create_object_store(&mut self, name: &str, params: StoreParams) -> EngineResult<()> {
        if self.stores.contains_key(name) {
            return Err(EngineError::StoreExists(name.to_string()));
        }
        self.stores
            .insert(name.to_string(), StoreData::new(params.auto_increment));
        Ok(())
    }

    fn object_store_names(&self) -> Vec<String> {
        self.stores.keys().cloned().collect()
    }
}

type HeldOpen = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct EngineState {
    flavor: EngineFlavor,
    undefined_cursor_end: bool,
    databases: HashMap<String, DatabaseData>,
    faults: HashMap<RequestKind, VecDeque<EngineError>>,
    poisoned: HashSet<Key>,
    hold_opens: bool,
    held: Vec<HeldOpen>,
}

impl EngineState {
    fn take_fault(&mut self, kind: RequestKind) -> EngineResult<()> {
        match self.faults.get_mut(&kind).and_then(VecDeque::pop_front) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn check_key(&self, key: &Key) -> EngineResult<()> {
        if self.poisoned.contains(key) {
            return Err(EngineError::failure(format!("poisoned key {key}")));
        }
        Ok(())
    }

    fn end_of_cursor<C>(&self) -> CursorStep<C> {
        if self.undefined_cursor_end {
            CursorStep::Undefined
        } else {
            CursorStep::Null
        }
    }

    fn store(&self, db: &str, store: &str) -> EngineResult<&StoreData> {
        self.databases
            .get(db)
            .ok_or(EngineError::Closed)?
            .stores
            .get(store)
            .ok_or_else(|| EngineError::store_not_found(store))
    }

    fn store_mut(&mut self, db: &str, store: &str) -> EngineResult<&mut StoreData> {
        self.databases
            .get_mut(db)
            .ok_or(EngineError::Closed)?
            .stores
            .get_mut(store)
            .ok_or_else(|| EngineError::store_not_found(store))
    }
}

struct Shared {
    state: Mutex<EngineState>,
}

impl Shared {
    fn open_now(
        self: &Arc<Self>,
        name: &str,
        version: u64,
        on_upgrade: UpgradeHandler,
    ) -> EngineResult<MemoryConnection> {
        let mut state = self.state.lock();
        state.take_fault(RequestKind::Open)?;
        let persisted = state.databases.get(name).map_or(0, |db| db.version);
        let flavor = state.flavor;

        match flavor {
            EngineFlavor::Legacy => {
                state.databases.entry(name.to_string()).or_default();
                drop(state);
                Ok(self.connection(name, persisted))
            }
            EngineFlavor::Modern if version < persisted => Err(EngineError::VersionConflict {
                requested: version,
                persisted,
            }),
            EngineFlavor::Modern if version == persisted => {
                drop(state);
                Ok(self.connection(name, version))
            }
            EngineFlavor::Modern => {
                drop(state);
                self.change_version(name, version, on_upgrade)?;
                Ok(self.connection(name, version))
            }
        }
    }

    /// Runs `on_upgrade` against a staged copy and commits it on success.
    fn change_version(
        &self,
        name: &str,
        version: u64,
        on_upgrade: UpgradeHandler,
    ) -> EngineResult<()> {
        let mut staged = self
            .state
            .lock()
            .databases
            .get(name)
            .cloned()
            .unwrap_or_default();
        let change = VersionChange {
            old_version: staged.version,
            new_version: version,
        };

        on_upgrade(&mut staged, change)?;

        staged.version = version;
        self.state.lock().databases.insert(name.to_string(), staged);
        Ok(())
    }

    fn connection(self: &Arc<Self>, name: &str, version: u64) -> MemoryConnection {
        MemoryConnection {
            shared: Arc::clone(self),
            name: name.to_string(),
            version: AtomicU64::new(version),
        }
    }
}

/// An in-memory engine.
///
/// Clones share the same databases, so a test can keep a handle for
/// inspection and fault injection while an adapter owns another.
///
/// # Example
///
/// ```rust
/// use lawnstore_engine::{upgrade_handler, Factory, MemoryFactory};
///
/// let factory = MemoryFactory::new();
/// factory
///     .open("db", 1, upgrade_handler(|_, _| Ok(())))
///     .on_complete(|result| assert!(result.is_ok()));
/// assert_eq!(factory.database_version("db"), Some(1));
/// ```
#[derive(Clone)]
pub struct MemoryFactory {
    shared: Arc<Shared>,
}

impl Default for MemoryFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFactory {
    /// Creates an empty modern engine.
    #[must_use]
    pub fn new() -> Self {
        Self::with_flavor(EngineFlavor::Modern)
    }

    /// Creates an empty engine with the given version negotiation.
    #[must_use]
    pub fn with_flavor(flavor: EngineFlavor) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(EngineState {
                    flavor,
                    ..EngineState::default()
                }),
            }),
        }
    }

    /// Makes exhausted cursors report [`CursorStep::Undefined`].
    #[must_use]
    pub fn with_undefined_cursor_end(self) -> Self {
        self.shared.state.lock().undefined_cursor_end = true;
        self
    }

    /// Queues subsequent opens until [`MemoryFactory::release_opens`].
    pub fn hold_opens(&self) {
        self.shared.state.lock().hold_opens = true;
    }

    /// Runs all held opens in arrival order and stops holding new ones.
    pub fn release_opens(&self) {
        let held = {
            let mut state = self.shared.state.lock();
            state.hold_opens = false;
            std::mem::take(&mut state.held)
        };
        for open in held {
            open();
        }
    }

    /// Number of opens waiting for [`MemoryFactory::release_opens`].
    #[must_use]
    pub fn pending_opens(&self) -> usize {
        self.shared.state.lock().held.len()
    }

    /// Makes the next request of `kind` fail with `error`.
    ///
    /// Calls accumulate: each scripted error is consumed by one request.
    pub fn fail_next(&self, kind: RequestKind, error: EngineError) {
        self.shared
            .state
            .lock()
            .faults
            .entry(kind)
            .or_default()
            .push_back(error);
    }

    /// Makes every keyed request on `key` fail until healed.
    pub fn poison_key(&self, key: Key) {
        self.shared.state.lock().poisoned.insert(key);
    }

    /// Removes a key from the poisoned set.
    pub fn heal_key(&self, key: &Key) {
        self.shared.state.lock().poisoned.remove(key);
    }

    /// Persisted version of a database, if it exists.
    #[must_use]
    pub fn database_version(&self, name: &str) -> Option<u64> {
        self.shared
            .state
            .lock()
            .databases
            .get(name)
            .map(|db| db.version)
    }

    /// Names of the object stores in a database.
    #[must_use]
    pub fn store_names(&self, name: &str) -> Vec<String> {
        self.shared
            .state
            .lock()
            .databases
            .get(name)
            .map(|db| db.object_store_names())
            .unwrap_or_default()
    }

    /// Number of records in a store; zero if it does not exist.
    #[must_use]
    pub fn record_count(&self, db: &str, store: &str) -> usize {
        self.shared
            .state
            .lock()
            .store(db, store)
            .map_or(0, |s| s.records.len())
    }

    /// Creates or replaces a store at the given database version, filled
    /// with `records`. Useful for simulating data left by an older schema.
    pub fn seed_store<I>(&self, db: &str, version: u64, store: &str, params: StoreParams, records: I)
    where
        I: IntoIterator<Item = (Key, Value)>,
    {
        let mut state = self.shared.state.lock();
        let data = state.databases.entry(db.to_string()).or_default();
        data.version = version;
        let mut seeded = StoreData::new(params.auto_increment);
        seeded.records = records.into_iter().collect();
        let ints: Vec<i64> = seeded.records.keys().filter_map(Key::as_int).collect();
        for n in ints {
            seeded.observe_key(n);
        }
        data.stores.insert(store.to_string(), seeded);
    }
}

impl Factory for MemoryFactory {
    type Connection = MemoryConnection;

    fn open(&self, name: &str, version: u64, on_upgrade: UpgradeHandler) -> Request<MemoryConnection> {
        let (request, responder) = Request::pending();
        let shared = Arc::clone(&self.shared);
        let name = name.to_string();
        let job = move || {
            let result = shared.open_now(&name, version, on_upgrade);
            responder.complete(result);
        };

        let mut state = self.shared.state.lock();
        if state.hold_opens {
            state.held.push(Box::new(job));
        } else {
            drop(state);
            job();
        }
        request
    }

    fn delete_database(&self, name: &str) -> Request<()> {
        let mut state = self.shared.state.lock();
        let result = state.take_fault(RequestKind::DeleteDatabase).map(|()| {
            state.databases.remove(name);
        });
        Request::completed(result)
    }
}

/// A connection to one in-memory database.
pub struct MemoryConnection {
    shared: Arc<Shared>,
    name: String,
    version: AtomicU64,
}

impl Connection for MemoryConnection {
    type Store = MemoryObjectStore;

    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    fn set_version(&self, version: u64, on_upgrade: UpgradeHandler) -> Request<()> {
        {
            let mut state = self.shared.state.lock();
            if let Err(error) = state.take_fault(RequestKind::SetVersion) {
                return Request::failed(error);
            }
            if state.flavor == EngineFlavor::Modern {
                return Request::failed(EngineError::failure(
                    "set_version is not supported by modern engines",
                ));
            }
        }

        let result = self.shared.change_version(&self.name, version, on_upgrade);
        if result.is_ok() {
            self.version.store(version, Ordering::SeqCst);
        }
        Request::completed(result)
    }

    fn transaction(&self, store: &str, mode: TransactionMode) -> EngineResult<MemoryObjectStore> {
        let mut state = self.shared.state.lock();
        state.take_fault(RequestKind::Transaction)?;
        state.store(&self.name, store)?;
        Ok(MemoryObjectStore {
            shared: Arc::clone(&self.shared),
            db: self.name.clone(),
            store: store.to_string(),
            mode,
        })
    }
}

/// An in-memory object store scoped to one transaction.
pub struct MemoryObjectStore {
    shared: Arc<Shared>,
    db: String,
    store: String,
    mode: TransactionMode,
}

impl MemoryObjectStore {
    fn writable(&self) -> EngineResult<()> {
        match self.mode {
            TransactionMode::ReadWrite => Ok(()),
            TransactionMode::ReadOnly => Err(EngineError::ReadOnly),
        }
    }

    fn cursor_from(
        &self,
        state: &EngineState,
        range: Option<KeyRange>,
        after: Option<&Key>,
    ) -> EngineResult<CursorStep<MemoryCursor>> {
        let records = &state.store(&self.db, &self.store)?.records;
        let lower = match (after, range.as_ref().and_then(KeyRange::lower)) {
            (Some(key), _) => Bound::Excluded(key.clone()),
            (None, Some(key)) => Bound::Included(key.clone()),
            (None, None) => Bound::Unbounded,
        };

        let next = records
            .range((lower, Bound::Unbounded))
            .next()
            .filter(|(key, _)| range.as_ref().map_or(true, |r| r.contains(key)));

        Ok(match next {
            Some((key, value)) => CursorStep::Positioned(MemoryCursor {
                source: self.reopen(),
                range,
                key: key.clone(),
                value: value.clone(),
            }),
            None => state.end_of_cursor(),
        })
    }

    fn reopen(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            db: self.db.clone(),
            store: self.store.clone(),
            mode: self.mode,
        }
    }
}

impl ObjectStore for MemoryObjectStore {
    type Cursor = MemoryCursor;

    fn put(&self, value: Value, key: Option<Key>) -> Request<Key> {
        let mut state = self.shared.state.lock();
        let result = (|| -> EngineResult<Key> {
            state.take_fault(RequestKind::Put)?;
            self.writable()?;
            if let Some(key) = &key {
                state.check_key(key)?;
            }
            let store = state.store_mut(&self.db, &self.store)?;
            let key = match key {
                Some(key) => {
                    if let (true, Some(n)) = (store.auto_increment, key.as_int()) {
                        store.observe_key(n);
                    }
                    key
                }
                None if store.auto_increment => store.generate_key()?,
                None => return Err(EngineError::MissingKey),
            };
            store.records.insert(key.clone(), value);
            Ok(key)
        })();
        Request::completed(result)
    }

    fn get(&self, key: &Key) -> Request<Option<Value>> {
        let mut state = self.shared.state.lock();
        let result = (|| -> EngineResult<Option<Value>> {
            state.take_fault(RequestKind::Get)?;
            state.check_key(key)?;
            Ok(state.store(&self.db, &self.store)?.records.get(key).cloned())
        })();
        Request::completed(result)
    }

    fn delete(&self, key: &Key) -> Request<()> {
        let mut state = self.shared.state.lock();
        let result = (|| -> EngineResult<()> {
            state.take_fault(RequestKind::Delete)?;
            self.writable()?;
            state.check_key(key)?;
            state.store_mut(&self.db, &self.store)?.records.remove(key);
            Ok(())
        })();
        Request::completed(result)
    }

    fn open_cursor(&self, range: Option<KeyRange>) -> Request<CursorStep<MemoryCursor>> {
        let mut state = self.shared.state.lock();
        let result = (|| -> EngineResult<CursorStep<MemoryCursor>> {
            state.take_fault(RequestKind::OpenCursor)?;
            if let Some(key) = range.as_ref().and_then(KeyRange::lower) {
                state.check_key(key)?;
            }
            self.cursor_from(&state, range, None)
        })();
        Request::completed(result)
    }

    fn clear(&self) -> Request<()> {
        let mut state = self.shared.state.lock();
        let result = (|| -> EngineResult<()> {
            state.take_fault(RequestKind::Clear)?;
            self.writable()?;
            state.store_mut(&self.db, &self.store)?.records.clear();
            Ok(())
        })();
        Request::completed(result)
    }
}

/// A forward cursor over an in-memory store.
pub struct MemoryCursor {
    source: MemoryObjectStore,
    range: Option<KeyRange>,
    key: Key,
    value: Value,
}

impl Cursor for MemoryCursor {
    fn key(&self) -> &Key {
        &self.key
    }

    fn value(&self) -> &Value {
        &self.value
    }

    fn advance(self) -> Request<CursorStep<Self>> {
        let mut state = self.source.shared.state.lock();
        let result = state
            .take_fault(RequestKind::Advance)
            .and_then(|()| self.source.cursor_from(&state, self.range, Some(&self.key)));
        Request::completed(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::upgrade_handler;
    use serde_json::json;

    const DB: &str = "db";
    const STORE: &str = "items";

    fn outcome<T: Send + 'static>(request: Request<T>) -> EngineResult<T> {
        let slot = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&slot);
        request.on_complete(move |r| *sink.lock() = Some(r));
        let result = slot.lock().take();
        result.expect("memory requests complete immediately")
    }

    fn create_store(auto_increment: bool) -> UpgradeHandler {
        upgrade_handler(move |editor, _| {
            editor.create_object_store(STORE, StoreParams { auto_increment })
        })
    }

    fn opened(factory: &MemoryFactory, auto_increment: bool) -> MemoryConnection {
        outcome(factory.open(DB, 1, create_store(auto_increment))).unwrap()
    }

    fn read_write(conn: &MemoryConnection) -> MemoryObjectStore {
        conn.transaction(STORE, TransactionMode::ReadWrite).unwrap()
    }

    #[test]
    fn memory_open_runs_upgrade_for_new_database() {
        let factory = MemoryFactory::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let conn = outcome(factory.open(
            DB,
            3,
            upgrade_handler(move |_, change| {
                *sink.lock() = Some(change);
                Ok(())
            }),
        ))
        .unwrap();

        assert_eq!(conn.version(), 3);
        assert_eq!(
            *seen.lock(),
            Some(VersionChange {
                old_version: 0,
                new_version: 3
            })
        );
        assert_eq!(factory.database_version(DB), Some(3));
    }

    #[test]
    fn memory_open_same_version_skips_upgrade() {
        let factory = MemoryFactory::new();
        opened(&factory, true);
        let conn = outcome(factory.open(
            DB,
            1,
            upgrade_handler(|_, _| panic!("upgrade must not run")),
        ))
        .unwrap();
        assert_eq!(conn.version(), 1);
    }

    #[test]
    fn memory_open_lower_version_conflicts() {
        let factory = MemoryFactory::new();
        factory.seed_store(DB, 5, STORE, StoreParams::default(), []);
        let result = outcome(factory.open(DB, 2, create_store(false)));
        assert!(matches!(
            result,
            Err(EngineError::VersionConflict {
                requested: 2,
                persisted: 5
            })
        ));
    }

    #[test]
    fn memory_failed_upgrade_leaves_database_untouched() {
        let factory = MemoryFactory::new();
        factory.seed_store(DB, 1, STORE, StoreParams::default(), [(Key::Int(1), json!(1))]);
        let result = outcome(factory.open(
            DB,
            2,
            upgrade_handler(|editor, _| {
                editor.delete_object_store(STORE)?;
                Err(EngineError::failure("boom"))
            }),
        ));
        assert!(result.is_err());
        assert_eq!(factory.database_version(DB), Some(1));
        assert_eq!(factory.record_count(DB, STORE), 1);
    }

    #[test]
    fn memory_legacy_open_ignores_requested_version() {
        let factory = MemoryFactory::with_flavor(EngineFlavor::Legacy);
        let conn = outcome(factory.open(DB, 2, upgrade_handler(|_, _| panic!("not called")))).unwrap();
        assert_eq!(conn.version(), 0);

        outcome(conn.set_version(2, create_store(false))).unwrap();
        assert_eq!(conn.version(), 2);
        assert_eq!(factory.store_names(DB), vec![STORE.to_string()]);
    }

    #[test]
    fn memory_modern_rejects_set_version() {
        let factory = MemoryFactory::new();
        let conn = opened(&factory, false);
        assert!(outcome(conn.set_version(4, create_store(false))).is_err());
    }

    #[test]
    fn memory_held_opens_wait_for_release() {
        let factory = MemoryFactory::new();
        factory.hold_opens();
        let slot = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&slot);
        factory
            .open(DB, 1, create_store(false))
            .on_complete(move |r| *sink.lock() = Some(r.map(|c| c.version())));

        assert_eq!(factory.pending_opens(), 1);
        assert!(slot.lock().is_none());

        factory.release_opens();
        assert_eq!(*slot.lock(), Some(Ok(1)));
        assert_eq!(factory.pending_opens(), 0);
    }

    #[test]
    fn memory_auto_increment_assigns_sequential_keys() {
        let factory = MemoryFactory::new();
        let conn = opened(&factory, true);
        let store = read_write(&conn);

        assert_eq!(outcome(store.put(json!("a"), None)).unwrap(), Key::Int(1));
        assert_eq!(outcome(store.put(json!("b"), None)).unwrap(), Key::Int(2));
        outcome(store.put(json!("c"), Some(Key::Int(10)))).unwrap();
        assert_eq!(outcome(store.put(json!("d"), None)).unwrap(), Key::Int(11));
    }

    #[test]
    fn memory_max_int_key_exhausts_generator() {
        let factory = MemoryFactory::new();
        let conn = opened(&factory, true);
        let store = read_write(&conn);

        outcome(store.put(json!("last"), Some(Key::Int(i64::MAX)))).unwrap();
        outcome(store.put(json!("again"), Some(Key::Int(i64::MAX)))).unwrap();
        assert_eq!(
            outcome(store.put(json!("next"), None)),
            Err(EngineError::KeyGeneratorExhausted)
        );
        // Explicit keys still work.
        outcome(store.put(json!("low"), Some(Key::Int(3)))).unwrap();
        assert_eq!(factory.record_count(DB, STORE), 2);
    }

    #[test]
    fn memory_seeded_max_int_key_exhausts_generator() {
        let factory = MemoryFactory::new();
        factory.seed_store(
            DB,
            1,
            STORE,
            StoreParams {
                auto_increment: true,
            },
            [(Key::Int(i64::MAX), json!(1)), (Key::Int(-4), json!(2))],
        );
        let conn = outcome(factory.open(DB, 1, upgrade_handler(|_, _| panic!("not called")))).unwrap();
        assert_eq!(
            outcome(read_write(&conn).put(json!(3), None)),
            Err(EngineError::KeyGeneratorExhausted)
        );
    }

    #[test]
    fn memory_negative_int_keys_leave_generator_alone() {
        let factory = MemoryFactory::new();
        let conn = opened(&factory, true);
        let store = read_write(&conn);

        outcome(store.put(json!("neg"), Some(Key::Int(-7)))).unwrap();
        assert_eq!(outcome(store.put(json!("a"), None)).unwrap(), Key::Int(1));
    }

    #[test]
    fn memory_keyless_put_without_auto_increment_fails() {
        let factory = MemoryFactory::new();
        let conn = opened(&factory, false);
        let result = outcome(read_write(&conn).put(json!({}), None));
        assert_eq!(result, Err(EngineError::MissingKey));
    }

    #[test]
    fn memory_put_overwrites() {
        let factory = MemoryFactory::new();
        let conn = opened(&factory, false);
        let store = read_write(&conn);
        let key = Key::from("k");

        outcome(store.put(json!(1), Some(key.clone()))).unwrap();
        outcome(store.put(json!(2), Some(key.clone()))).unwrap();

        assert_eq!(outcome(store.get(&key)).unwrap(), Some(json!(2)));
        assert_eq!(factory.record_count(DB, STORE), 1);
    }

    #[test]
    fn memory_read_only_rejects_writes() {
        let factory = MemoryFactory::new();
        let conn = opened(&factory, false);
        let store = conn.transaction(STORE, TransactionMode::ReadOnly).unwrap();

        assert_eq!(
            outcome(store.put(json!(1), Some(Key::Int(1)))),
            Err(EngineError::ReadOnly)
        );
        assert_eq!(outcome(store.clear()), Err(EngineError::ReadOnly));
        assert_eq!(outcome(store.get(&Key::Int(1))), Ok(None));
    }

    #[test]
    fn memory_delete_absent_key_succeeds() {
        let factory = MemoryFactory::new();
        let conn = opened(&factory, false);
        assert!(outcome(read_write(&conn).delete(&Key::from("nope"))).is_ok());
    }

    #[test]
    fn memory_cursor_walks_in_key_order() {
        let factory = MemoryFactory::new();
        let conn = opened(&factory, false);
        let store = read_write(&conn);
        for key in ["c", "a", "b"] {
            outcome(store.put(json!(key), Some(Key::from(key)))).unwrap();
        }

        let mut seen = Vec::new();
        let mut step = outcome(store.open_cursor(None)).unwrap();
        while let Some(cursor) = step.into_cursor() {
            seen.push(cursor.key().clone());
            step = outcome(cursor.advance()).unwrap();
        }
        assert_eq!(seen, vec![Key::from("a"), Key::from("b"), Key::from("c")]);
    }

    #[test]
    fn memory_cursor_respects_only_range() {
        let factory = MemoryFactory::new();
        let conn = opened(&factory, false);
        let store = read_write(&conn);
        outcome(store.put(json!(1), Some(Key::Int(1)))).unwrap();
        outcome(store.put(json!(2), Some(Key::Int(2)))).unwrap();

        let step = outcome(store.open_cursor(Some(KeyRange::only(Key::Int(1))))).unwrap();
        let cursor = step.into_cursor().unwrap();
        assert_eq!(cursor.value(), &json!(1));
        assert!(outcome(cursor.advance()).unwrap().is_absent());

        let missing = outcome(store.open_cursor(Some(KeyRange::only(Key::Int(3))))).unwrap();
        assert!(matches!(missing, CursorStep::Null));
    }

    #[test]
    fn memory_undefined_cursor_end_quirk() {
        let factory = MemoryFactory::new().with_undefined_cursor_end();
        let conn = opened(&factory, false);
        let step = outcome(read_write(&conn).open_cursor(None)).unwrap();
        assert!(matches!(step, CursorStep::Undefined));
    }

    #[test]
    fn memory_scripted_faults_are_consumed_once() {
        let factory = MemoryFactory::new();
        let conn = opened(&factory, false);
        let store = read_write(&conn);
        factory.fail_next(RequestKind::Get, EngineError::failure("flaky"));

        assert!(outcome(store.get(&Key::Int(1))).is_err());
        assert!(outcome(store.get(&Key::Int(1))).is_ok());
    }

    #[test]
    fn memory_poisoned_key_fails_until_healed() {
        let factory = MemoryFactory::new();
        let conn = opened(&factory, false);
        let store = read_write(&conn);
        let key = Key::from("bad");
        factory.poison_key(key.clone());

        assert!(outcome(store.put(json!(1), Some(key.clone()))).is_err());
        assert!(outcome(store.open_cursor(Some(KeyRange::only(key.clone())))).is_err());

        factory.heal_key(&key);
        assert!(outcome(store.put(json!(1), Some(key))).is_ok());
    }

    #[test]
    fn memory_transaction_on_missing_store_fails() {
        let factory = MemoryFactory::new();
        let conn = opened(&factory, false);
        assert!(matches!(
            conn.transaction("other", TransactionMode::ReadOnly),
            Err(EngineError::StoreNotFound(_))
        ));
    }

    #[test]
    fn memory_delete_database_closes_connections() {
        let factory = MemoryFactory::new();
        let conn = opened(&factory, false);
        outcome(factory.delete_database(DB)).unwrap();

        assert_eq!(factory.database_version(DB), None);
        assert!(matches!(
            conn.transaction(STORE, TransactionMode::ReadOnly),
            Err(EngineError::Closed)
        ));
    }

    #[test]
    fn memory_seed_store_continues_key_sequence() {
        let factory = MemoryFactory::new();
        factory.seed_store(
            DB,
            1,
            STORE,
            StoreParams {
                auto_increment: true,
            },
            [(Key::Int(4), json!("x"))],
        );
        let conn = outcome(factory.open(DB, 1, create_store(true))).unwrap();
        assert_eq!(
            outcome(read_write(&conn).put(json!("y"), None)).unwrap(),
            Key::Int(5)
        );
    }
}
