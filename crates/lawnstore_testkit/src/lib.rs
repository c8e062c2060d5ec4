//! # Lawnstore Testkit
//!
//! Test utilities for Lawnstore.
//!
//! This crate provides:
//! - Adapter fixtures over the in-memory engine
//! - Property-based test generators using proptest
//! - Stress drivers for the fan-out and gate paths
//! - Test log setup
//!
//! ## Usage
//!
//! ```rust
//! use lawnstore_core::Record;
//! use lawnstore_testkit::prelude::*;
//! use serde_json::json;
//!
//! init_tracing();
//! let test = TestAdapter::memory();
//! let saved = settle(test.save(Record::with_key("k", json!(1)))).unwrap();
//! assert_eq!(settle(test.get("k")).unwrap(), Some(saved));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;
pub mod trace;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
    pub use crate::trace::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
pub use trace::*;
