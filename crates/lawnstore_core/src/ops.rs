//! Record operations against an open store.
//!
//! These run only once the readiness gate has opened; [`crate::Adapter`]
//! routes every public call through the gate first. Each operation reports
//! through a callback exactly once.

use crate::adapter::Inner;
use crate::error::{AdapterError, AdapterResult};
use crate::fanout::{fan_out, BatchReport};
use crate::record::{Record, RemoveTarget};
use lawnstore_engine::{Factory, Key, KeyRange, ObjectStore, TransactionMode};
use tracing::debug;

/// Outcome of a single save: the stored record, or the cause and the input.
pub(crate) type SaveResult = Result<Record, (AdapterError, Record)>;

impl<F: Factory> Inner<F> {
    /// Upserts one record and reports it with its effective key. A failure
    /// hands the input record back with its cause.
    pub(crate) fn save<D>(&self, record: Record, done: D)
    where
        D: FnOnce(SaveResult) + Send + 'static,
    {
        let store = match self.manager.store(TransactionMode::ReadWrite) {
            Ok(store) => store,
            Err(err) => return done(Err((err, record))),
        };

        let effective = match &record.key {
            Some(key) => Some(key.clone()),
            None if self.supports_auto_key => None,
            None => Some(self.keys.generate()),
        };

        store
            .put(record.data.clone(), effective)
            .on_complete(move |result| {
                done(match result {
                    Ok(key) => Ok(Record {
                        key: Some(key),
                        data: record.data,
                    }),
                    Err(err) => {
                        debug!(error = %err, "save failed");
                        Err((err.into(), record))
                    }
                });
            });
    }

    /// Looks up one key; absent keys report `None`.
    pub(crate) fn get<D>(&self, key: Key, done: D)
    where
        D: FnOnce(AdapterResult<Option<Record>>) + Send + 'static,
    {
        let store = match self.manager.store(TransactionMode::ReadOnly) {
            Ok(store) => store,
            Err(err) => return done(Err(err)),
        };

        store.get(&key).on_complete(move |result| {
            done(match result {
                Ok(value) => Ok(value.map(|data| Record {
                    key: Some(key),
                    data,
                })),
                Err(err) => {
                    debug!(key = %key, error = %err, "get failed");
                    Err(err.into())
                }
            });
        });
    }

    /// Probes for a key with a single-key cursor.
    pub(crate) fn exists<D>(&self, key: Key, done: D)
    where
        D: FnOnce(AdapterResult<bool>) + Send + 'static,
    {
        let store = match self.manager.store(TransactionMode::ReadOnly) {
            Ok(store) => store,
            Err(err) => return done(Err(err)),
        };

        store
            .open_cursor(Some(KeyRange::only(key)))
            .on_complete(move |result| {
                done(result.map(|step| !step.is_absent()).map_err(Into::into));
            });
    }

    /// Deletes one key. Deleting an absent key succeeds.
    pub(crate) fn remove<D>(&self, target: RemoveTarget, done: D)
    where
        D: FnOnce(AdapterResult<()>) + Send + 'static,
    {
        let key = match target.into_key() {
            Ok(key) => key,
            Err(err) => return done(Err(err)),
        };
        let store = match self.manager.store(TransactionMode::ReadWrite) {
            Ok(store) => store,
            Err(err) => return done(Err(err)),
        };

        store.delete(&key).on_complete(move |result| {
            if let Err(err) = &result {
                debug!(key = %key, error = %err, "remove failed");
            }
            done(result.map_err(Into::into));
        });
    }

    /// Removes every record from the store.
    pub(crate) fn nuke<D>(&self, done: D)
    where
        D: FnOnce(AdapterResult<()>) + Send + 'static,
    {
        match self.manager.store(TransactionMode::ReadWrite) {
            Ok(store) => store
                .clear()
                .on_complete(move |result| done(result.map_err(Into::into))),
            Err(err) => done(Err(err)),
        }
    }

    /// Saves every record. A failed element keeps the input record in its
    /// result slot.
    pub(crate) fn batch<D>(&self, records: Vec<Record>, done: D)
    where
        D: FnOnce(BatchReport<Record>) + Send + 'static,
    {
        debug!(count = records.len(), "batch save");
        fan_out(
            records,
            |record, item_done| {
                self.save(record, move |result| match result {
                    Ok(saved) => item_done(None, saved),
                    Err((err, input)) => item_done(Some(err), input),
                });
            },
            done,
        );
    }

    /// Looks up every key; results align with `keys`.
    pub(crate) fn get_many<D>(&self, keys: Vec<Key>, done: D)
    where
        D: FnOnce(BatchReport<Option<Record>>) + Send + 'static,
    {
        debug!(count = keys.len(), "get many");
        fan_out(
            keys,
            |key, item_done| {
                self.get(key, move |result| match result {
                    Ok(record) => item_done(None, record),
                    Err(err) => item_done(Some(err), None),
                });
            },
            done,
        );
    }

    /// Removes every target; results align with `targets`.
    pub(crate) fn remove_many<D>(&self, targets: Vec<RemoveTarget>, done: D)
    where
        D: FnOnce(BatchReport<()>) + Send + 'static,
    {
        fan_out(
            targets,
            |target, item_done| {
                self.remove(target, move |result: AdapterResult<()>| {
                    item_done(result.err(), ());
                });
            },
            done,
        );
    }
}
