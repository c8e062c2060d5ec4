//! Object-store engine trait definitions.

use crate::error::EngineResult;
use crate::key::{Key, KeyRange, Value};
use crate::request::Request;

/// Access mode of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    /// Reads only; writes fail with [`crate::EngineError::ReadOnly`].
    ReadOnly,
    /// Reads and writes.
    ReadWrite,
}

/// Parameters for creating an object store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreParams {
    /// Whether the store generates sequential keys for keyless writes.
    pub auto_increment: bool,
}

/// The versions involved in a version-change transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionChange {
    /// Version persisted before the change (0 for a new database).
    pub old_version: u64,
    /// Version being installed.
    pub new_version: u64,
}

/// Schema operations available inside a version-change transaction.
pub trait SchemaEditor {
    /// Deletes an object store and all its records.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::StoreNotFound`] if no such store exists.
    fn delete_object_store(&mut self, name: &str) -> EngineResult<()>;

    /// Creates an empty object store.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::StoreExists`] if the name is taken.
    fn create_object_store(&mut self, name: &str, params: StoreParams) -> EngineResult<()>;

    /// Names of the object stores currently in the database.
    fn object_store_names(&self) -> Vec<String>;
}

/// Schema routine run by the engine inside a version-change transaction.
///
/// Returning an error aborts the transaction and fails the pending open or
/// version change with that error.
pub type UpgradeHandler =
    Box<dyn FnOnce(&mut dyn SchemaEditor, VersionChange) -> EngineResult<()> + Send>;

/// Boxes a schema routine as an [`UpgradeHandler`].
pub fn upgrade_handler<F>(routine: F) -> UpgradeHandler
where
    F: FnOnce(&mut dyn SchemaEditor, VersionChange) -> EngineResult<()> + Send + 'static,
{
    Box::new(routine)
}

/// Entry point of an engine: opens and deletes named databases.
///
/// # Version negotiation
///
/// Engines negotiate versions in one of two ways:
///
/// - Modern engines run `on_upgrade` during `open` when the persisted version
///   is lower than the requested one, then complete the open with a
///   connection at the requested version. A persisted version higher than
///   the requested one fails with [`crate::EngineError::VersionConflict`].
/// - Legacy engines ignore the requested version and open at the persisted
///   one. Callers compare [`Connection::version`] and install the schema with
///   [`Connection::set_version`].
pub trait Factory: Send + Sync + 'static {
    /// Connection type produced by this engine.
    type Connection: Connection;

    /// Opens (creating if needed) the named database.
    fn open(&self, name: &str, version: u64, on_upgrade: UpgradeHandler)
        -> Request<Self::Connection>;

    /// Deletes the named database and everything in it.
    fn delete_database(&self, name: &str) -> Request<()>;
}

/// A live connection to one database.
pub trait Connection: Send + Sync + 'static {
    /// Object-store handle type scoped to one transaction.
    type Store: ObjectStore;

    /// Name of the database.
    fn name(&self) -> &str;

    /// Version of the database as seen by this connection.
    fn version(&self) -> u64;

    /// Legacy version change: runs `on_upgrade` in a version-change
    /// transaction and completes once it commits.
    fn set_version(&self, version: u64, on_upgrade: UpgradeHandler) -> Request<()>;

    /// Starts a transaction over a single object store.
    ///
    /// # Errors
    ///
    /// Fails synchronously if the store does not exist or the connection is
    /// no longer usable.
    fn transaction(&self, store: &str, mode: TransactionMode) -> EngineResult<Self::Store>;
}

/// An object store as seen through one transaction.
pub trait ObjectStore: Send + 'static {
    /// Cursor type for traversals.
    type Cursor: Cursor;

    /// Writes `value` under `key`, replacing any existing record. Without a
    /// key the store must generate one.
    fn put(&self, value: Value, key: Option<Key>) -> Request<Key>;

    /// Reads the value stored under `key`; `None` if absent.
    fn get(&self, key: &Key) -> Request<Option<Value>>;

    /// Deletes the record under `key`. Deleting an absent key succeeds.
    fn delete(&self, key: &Key) -> Request<()>;

    /// Opens a forward cursor over `range`, or over every record.
    fn open_cursor(&self, range: Option<KeyRange>) -> Request<CursorStep<Self::Cursor>>;

    /// Removes every record.
    fn clear(&self) -> Request<()>;
}

/// A position within a forward traversal.
pub trait Cursor: Send + Sized + 'static {
    /// Key at the current position.
    fn key(&self) -> &Key;

    /// Value at the current position.
    fn value(&self) -> &Value;

    /// Moves to the next record.
    fn advance(self) -> Request<CursorStep<Self>>;
}

/// Outcome of opening or advancing a cursor.
#[derive(Debug)]
pub enum CursorStep<C> {
    /// Positioned on a record.
    Positioned(C),
    /// No (more) records.
    Null,
    /// No (more) records, reported through the undefined sentinel that some
    /// engine variants use instead of [`CursorStep::Null`].
    Undefined,
}

impl<C> CursorStep<C> {
    /// Returns true when the step carries no record, whichever sentinel the
    /// engine used.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Null | Self::Undefined)
    }

    /// Converts into the positioned cursor, if any.
    pub fn into_cursor(self) -> Option<C> {
        match self {
            Self::Positioned(cursor) => Some(cursor),
            Self::Null | Self::Undefined => None,
        }
    }
}
