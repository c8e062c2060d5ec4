//! Error types for engine requests.

use thiserror::Error;

/// Result type for engine requests.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors reported by an object-store engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The database was opened with a version lower than the persisted one.
    #[error("version conflict: requested {requested}, persisted {persisted}")]
    VersionConflict {
        /// The version passed to `open`.
        requested: u64,
        /// The version already stored by the engine.
        persisted: u64,
    },

    /// The named object store does not exist.
    #[error("object store not found: {0}")]
    StoreNotFound(String),

    /// An object store with this name already exists.
    #[error("object store already exists: {0}")]
    StoreExists(String),

    /// A write was issued on a read-only transaction.
    #[error("transaction is read-only")]
    ReadOnly,

    /// A keyless write was issued on a store without key generation.
    #[error("no key supplied and the store does not generate keys")]
    MissingKey,

    /// The store's key generator has passed the largest integer key.
    #[error("key generator exhausted")]
    KeyGeneratorExhausted,

    /// The request was dropped before it completed.
    #[error("request aborted")]
    Aborted,

    /// The connection has been closed or the database deleted.
    #[error("connection is closed")]
    Closed,

    /// A failure raised by the engine itself (or injected by a test).
    #[error("engine failure: {0}")]
    Failure(String),
}

impl EngineError {
    /// Creates a store-not-found error.
    pub fn store_not_found(name: impl Into<String>) -> Self {
        Self::StoreNotFound(name.into())
    }

    /// Creates a generic engine failure.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }

    /// Returns true for a version conflict on open.
    #[must_use]
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }

    /// Returns true when the error only says that a store is missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::StoreNotFound(_))
    }
}
