//! Connection manager: open, upgrade and readiness.
//!
//! ## State machine
//!
//! ```text
//! Closed -> Opening -> [Upgrading] -> Ready
//!              |
//!              +-- version conflict --> Reopening -> [Upgrading] -> Ready
//!              |
//!              +-- any other failure --> Failed
//! ```
//!
//! A modern engine reports the upgrade from inside `open`; a legacy engine
//! opens at the old version and the manager installs the schema through
//! `set_version`. Both paths run [`ConnectionManager::upgrade`].

use crate::error::{AdapterError, AdapterResult};
use crate::gate::ReadinessGate;
use lawnstore_engine::{
    upgrade_handler, Connection, EngineResult, Factory, SchemaEditor, StoreParams,
    TransactionMode, UpgradeHandler, VersionChange,
};
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, warn};

/// Name of the object store holding the records.
pub const STORE_NAME: &str = "lawnchairncc";

/// Name of the object store used by an older schema; removed on upgrade.
pub const LEGACY_STORE_NAME: &str = "teststore";

/// Schema version of the object store layout.
///
/// Bump it whenever the layout changes (for example the store name). Opening
/// a database at any other version destroys and recreates the store.
pub const STORE_VERSION: u64 = 2;

/// Lifecycle state of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not yet opened.
    Closed,
    /// Open request issued.
    Opening,
    /// Recreating the object store.
    Upgrading,
    /// Recovering from a version conflict by recreating the database.
    Reopening,
    /// Open and serving operations.
    Ready,
    /// Open failed; operations stay parked.
    Failed,
}

/// Callback receiving the outcome of the open sequence.
pub(crate) type OpenDone = Box<dyn FnOnce(AdapterResult<()>) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Retry,
}

/// Owns the store handle and drives it to readiness.
pub(crate) struct ConnectionManager<F: Factory> {
    name: String,
    factory: F,
    auto_increment: bool,
    state: Mutex<ConnectionState>,
    connection: OnceLock<Arc<F::Connection>>,
    gate: ReadinessGate,
    on_open: Mutex<Option<OpenDone>>,
}

impl<F: Factory> ConnectionManager<F> {
    pub(crate) fn new(
        name: String,
        factory: F,
        auto_increment: bool,
        on_open: OpenDone,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            factory,
            auto_increment,
            state: Mutex::new(ConnectionState::Closed),
            connection: OnceLock::new(),
            gate: ReadinessGate::new(),
            on_open: Mutex::new(Some(on_open)),
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    pub(crate) fn gate(&self) -> &ReadinessGate {
        &self.gate
    }

    /// Starts a transaction on the record store.
    pub(crate) fn store(
        &self,
        mode: TransactionMode,
    ) -> AdapterResult<<F::Connection as Connection>::Store> {
        let connection = self.connection.get().ok_or(AdapterError::Closed)?;
        Ok(connection.transaction(STORE_NAME, mode)?)
    }

    /// Issues the initial open request.
    pub(crate) fn start(self: &Arc<Self>) {
        self.open(Attempt::First);
    }

    fn transition(&self, next: ConnectionState) {
        let mut state = self.state.lock();
        debug!(db = %self.name, from = ?*state, to = ?next, "connection state");
        *state = next;
    }

    fn open(self: &Arc<Self>, attempt: Attempt) {
        if attempt == Attempt::First {
            self.transition(ConnectionState::Opening);
        }
        let request = self
            .factory
            .open(&self.name, STORE_VERSION, self.upgrade_handler());
        let this = Arc::clone(self);
        request.on_complete(move |result| this.opened(result, attempt));
    }

    fn upgrade_handler(self: &Arc<Self>) -> UpgradeHandler {
        let this = Arc::clone(self);
        upgrade_handler(move |editor, change| this.upgrade(editor, change))
    }

    /// Destroys any previous store and creates an empty one. Data is not
    /// migrated.
    fn upgrade(&self, editor: &mut dyn SchemaEditor, change: VersionChange) -> EngineResult<()> {
        self.transition(ConnectionState::Upgrading);
        debug!(
            db = %self.name,
            from = change.old_version,
            to = change.new_version,
            "recreating object store"
        );

        for store in [LEGACY_STORE_NAME, STORE_NAME] {
            match editor.delete_object_store(store) {
                Err(err) if !err.is_not_found() => return Err(err),
                _ => {}
            }
        }

        editor.create_object_store(
            STORE_NAME,
            StoreParams {
                auto_increment: self.auto_increment,
            },
        )
    }

    fn opened(self: &Arc<Self>, result: EngineResult<F::Connection>, attempt: Attempt) {
        match result {
            Ok(connection) if connection.version() == STORE_VERSION => {
                self.ready(Arc::new(connection));
            }
            Ok(connection) => self.legacy_upgrade(Arc::new(connection)),
            Err(err) if err.is_version_conflict() && attempt == Attempt::First => {
                warn!(db = %self.name, error = %err, "version conflict, recreating database");
                self.transition(ConnectionState::Reopening);
                let this = Arc::clone(self);
                self.factory
                    .delete_database(&self.name)
                    .on_complete(move |deleted| {
                        if let Err(err) = deleted {
                            warn!(db = %this.name, error = %err, "failed to delete database");
                        }
                        this.open(Attempt::Retry);
                    });
            }
            Err(err) if err.is_version_conflict() => {
                error!(db = %self.name, error = %err, "version conflict after recreating database");
                self.fail(AdapterError::open(format!(
                    "{err} after recreating the database"
                )));
            }
            Err(err) => {
                error!(db = %self.name, error = %err, "failed to open database");
                self.fail(err.into());
            }
        }
    }

    /// Legacy engines open at the persisted version; the schema is
    /// installed through an explicit version change.
    fn legacy_upgrade(self: &Arc<Self>, connection: Arc<F::Connection>) {
        debug!(
            db = %self.name,
            persisted = connection.version(),
            target = STORE_VERSION,
            "legacy version change"
        );
        self.transition(ConnectionState::Upgrading);
        let request = connection.set_version(STORE_VERSION, self.upgrade_handler());
        let this = Arc::clone(self);
        request.on_complete(move |result| match result {
            Ok(()) => this.ready(connection),
            Err(err) => {
                error!(db = %this.name, error = %err, "failed to create object store");
                this.fail(err.into());
            }
        });
    }

    fn ready(&self, connection: Arc<F::Connection>) {
        if self.connection.set(connection).is_err() {
            warn!(db = %self.name, "store handle already installed");
        }
        self.transition(ConnectionState::Ready);
        self.gate.open();
        self.finish(Ok(()));
    }

    fn fail(&self, err: AdapterError) {
        self.transition(ConnectionState::Failed);
        self.finish(Err(err));
    }

    fn finish(&self, result: AdapterResult<()>) {
        let on_open = self.on_open.lock().take();
        if let Some(on_open) = on_open {
            on_open(result);
        }
    }
}
