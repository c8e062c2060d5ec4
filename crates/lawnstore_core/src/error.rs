//! Error types for the Lawnstore adapter.

use crate::record::Record;
use lawnstore_engine::EngineError;
use thiserror::Error;

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Errors that can occur in adapter operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// The environment offers no object-store engine.
    #[error("no object-store engine is available in this environment")]
    Unavailable,

    /// The engine failed a request.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// Opening or upgrading the store failed.
    #[error("failed to open store: {message}")]
    Open {
        /// Description of the failure.
        message: String,
    },

    /// A save failed. The record handed to `save` comes back unchanged.
    #[error("failed to save record: {source}")]
    Save {
        /// Why the save failed.
        source: Box<AdapterError>,
        /// The input record.
        record: Box<Record>,
    },

    /// A record without a key was used where a key is required.
    #[error("record has no key")]
    MissingKey,

    /// The adapter was dropped before the operation completed.
    #[error("adapter closed before the operation completed")]
    Closed,
}

impl AdapterError {
    /// Creates an open failure.
    pub fn open(message: impl Into<String>) -> Self {
        Self::Open {
            message: message.into(),
        }
    }

    pub(crate) fn save_failed(source: AdapterError, record: Record) -> Self {
        Self::Save {
            source: Box::new(source),
            record: Box::new(record),
        }
    }

    /// Returns the underlying engine error, if any.
    #[must_use]
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            Self::Engine(err) => Some(err),
            Self::Save { source, .. } => source.engine_error(),
            _ => None,
        }
    }

    /// Returns the record a failed save handed back.
    #[must_use]
    pub fn unsaved_record(&self) -> Option<&Record> {
        match self {
            Self::Save { record, .. } => Some(record),
            _ => None,
        }
    }

    /// Takes back the record of a failed save.
    #[must_use]
    pub fn into_unsaved_record(self) -> Option<Record> {
        match self {
            Self::Save { record, .. } => Some(*record),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_convert() {
        let err: AdapterError = EngineError::ReadOnly.into();
        assert_eq!(err.engine_error(), Some(&EngineError::ReadOnly));
        assert_eq!(err.to_string(), "engine error: transaction is read-only");
    }

    #[test]
    fn open_error_display() {
        let err = AdapterError::open("second version conflict");
        assert_eq!(err.to_string(), "failed to open store: second version conflict");
        assert!(err.engine_error().is_none());
    }

    #[test]
    fn save_failure_carries_input_record() {
        let record = Record::with_key("k", serde_json::json!({"big": "payload"}));
        let err = AdapterError::save_failed(EngineError::failure("disk full").into(), record.clone());

        assert_eq!(
            err.to_string(),
            "failed to save record: engine error: engine failure: disk full"
        );
        assert_eq!(err.engine_error(), Some(&EngineError::failure("disk full")));
        assert_eq!(err.unsaved_record(), Some(&record));
        assert_eq!(err.into_unsaved_record(), Some(record));
        assert_eq!(AdapterError::Closed.into_unsaved_record(), None);
    }
}
