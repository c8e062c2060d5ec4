//! # Lawnstore Engine
//!
//! Object-store engine interface consumed by the Lawnstore adapter.
//!
//! This crate describes the host engine the adapter runs on: a transactional,
//! versioned object store whose requests complete through callbacks. It does
//! not interpret the values it stores.
//!
//! ## Design Principles
//!
//! - Every request completes exactly once through a [`Request`]
//! - Schema changes only happen inside a version-change transaction
//! - Versions are negotiated either in `open` (modern) or through
//!   [`Connection::set_version`] (legacy)
//! - Engines must be `Send + Sync` so handles can be shared
//!
//! ## Available Engines
//!
//! - [`MemoryFactory`] - In-memory engine for tests, with both negotiation
//!   flavors, held opens and fault injection
//!
//! ## Example
//!
//! ```rust
//! use lawnstore_engine::{
//!     upgrade_handler, Connection, Factory, Key, MemoryFactory, ObjectStore, StoreParams,
//!     TransactionMode,
//! };
//! use serde_json::json;
//!
//! let factory = MemoryFactory::new();
//! factory
//!     .open(
//!         "db",
//!         1,
//!         upgrade_handler(|editor, _| {
//!             editor.create_object_store("items", StoreParams { auto_increment: true })
//!         }),
//!     )
//!     .on_complete(|conn| {
//!         let store = conn
//!             .unwrap()
//!             .transaction("items", TransactionMode::ReadWrite)
//!             .unwrap();
//!         store
//!             .put(json!({"name": "tea"}), None)
//!             .on_complete(|key| assert_eq!(key.unwrap(), Key::Int(1)));
//!     });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod key;
mod memory;
mod request;

pub use backend::{
    upgrade_handler, Connection, Cursor, CursorStep, Factory, ObjectStore, SchemaEditor,
    StoreParams, TransactionMode, UpgradeHandler, VersionChange,
};
pub use error::{EngineError, EngineResult};
pub use key::{Key, KeyRange, Value};
pub use memory::{
    EngineFlavor, MemoryConnection, MemoryCursor, MemoryFactory, MemoryObjectStore, RequestKind,
};
pub use request::{Listener, Request, Responder};
