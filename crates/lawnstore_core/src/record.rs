//! Records and removal targets.

use crate::error::{AdapterError, AdapterResult};
use lawnstore_engine::{Key, Value};
use serde::{Deserialize, Serialize};

/// A caller-supplied value together with its key in the store.
///
/// The key is assigned on first save when absent and stays stable for the
/// lifetime of the logical entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Key of the record; `None` until it has been saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,
    /// The payload.
    pub data: Value,
}

impl Record {
    /// A record without a key; one is assigned on save.
    #[must_use]
    pub fn new(data: Value) -> Self {
        Self { key: None, data }
    }

    /// A record with an explicit key.
    #[must_use]
    pub fn with_key(key: impl Into<Key>, data: Value) -> Self {
        Self {
            key: Some(key.into()),
            data,
        }
    }
}

/// Something that identifies a record to remove.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoveTarget {
    /// A bare key.
    Key(Key),
    /// A record, identified by its key.
    Record(Record),
}

impl RemoveTarget {
    /// Resolves the key to delete.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::MissingKey`] for a record that was never saved.
    pub fn into_key(self) -> AdapterResult<Key> {
        match self {
            Self::Key(key) => Ok(key),
            Self::Record(record) => record.key.ok_or(AdapterError::MissingKey),
        }
    }
}

impl From<Key> for RemoveTarget {
    fn from(key: Key) -> Self {
        Self::Key(key)
    }
}

impl From<&Key> for RemoveTarget {
    fn from(key: &Key) -> Self {
        Self::Key(key.clone())
    }
}

impl From<Record> for RemoveTarget {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

impl From<&Record> for RemoveTarget {
    fn from(record: &Record) -> Self {
        Self::Record(record.clone())
    }
}
