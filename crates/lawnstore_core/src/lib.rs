//! # Lawnstore Core
//!
//! Asynchronous key-value adapter over a versioned object-store engine.
//!
//! This crate provides:
//! - Capability probing of the host environment
//! - Version negotiation with the engine, recreating the store on upgrade
//! - A readiness gate that parks early calls and replays them in order
//! - Single-record and fan-out batch operations
//! - Full-store scans over engine cursors
//!
//! ## Design Principles
//!
//! - Callers never wait for readiness; operations queue until the store opens
//! - Every operation reports exactly once through a [`Completion`]
//! - Batch results are aligned with their inputs, whatever the completion order
//! - Upgrades discard prior data; nothing is migrated
//!
//! ## Example
//!
//! ```rust
//! use lawnstore_core::{Adapter, AdapterConfig, Environment, Record};
//! use lawnstore_engine::MemoryFactory;
//! use serde_json::json;
//!
//! let env = Environment::standard(MemoryFactory::new());
//! let (adapter, _opened) = Adapter::open(AdapterConfig::new("todo"), env).unwrap();
//!
//! let mut report = adapter.batch(vec![
//!     Record::new(json!({"task": "water lawn"})),
//!     Record::new(json!({"task": "sharpen blades"})),
//! ]);
//! let report = report.try_result().unwrap().unwrap();
//! assert!(report.is_ok());
//! assert_eq!(report.results.len(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod completion;
mod config;
mod connection;
mod error;
mod fanout;
mod gate;
mod ops;
mod probe;
mod record;
mod scan;

pub use adapter::Adapter;
pub use completion::Completion;
pub use config::{AdapterConfig, KeyGenerator, UuidKeyGenerator};
pub use connection::{ConnectionState, LEGACY_STORE_NAME, STORE_NAME, STORE_VERSION};
pub use error::{AdapterError, AdapterResult};
pub use fanout::{BatchFailure, BatchReport};
pub use probe::{probe, Binding, Capabilities, Environment, Vendor};
pub use record::{Record, RemoveTarget};
