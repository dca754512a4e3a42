//! # Tessera
//!
//! Tessera is the storage core of an RDF triple/quad store.
//!
//! Terms are mapped to fixed-length identifiers by a layered, caching
//! dictionary. Each statement is written to several permutation indexes so
//! that any pattern of bound and unbound positions resolves to a single
//! ordered prefix scan. Change events keep statement counters and the
//! selectivity estimator used for query planning in step with mutations.
//!
//! ## Features
//!
//! - Term dictionary with well-known identifiers and LRU caching tiers
//! - Triple (`SPO`, `POS`, `OSP`) and quad (six index) layouts
//! - Synchronous change notification with batch brackets
//! - Heuristic cardinality estimation
//!
//! ## Example
//!
//! ```rust
//! use tessera::core::vocab::rdf;
//! use tessera::core::Term;
//! use tessera::config::StoreConfig;
//! use tessera::store::Store;
//!
//! fn example() -> tessera::Result<()> {
//!     let store = Store::open(StoreConfig::default())?;
//!     let alice = Term::iri("http://example.org/alice");
//!     let person = Term::iri("http://example.org/Person");
//!
//!     store.add_statements("loader", &[vec![alice.clone(), Term::iri(rdf::TYPE), person]])?;
//!     let rows = store.match_pattern(&[Some(alice), None, None])?;
//!     assert_eq!(rows.len(), 1);
//!     store.close()
//! }
//! # example().unwrap();
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::doc_markdown)]

/// Configuration structures for the store and its dictionary stack
pub mod config;

/// Core data structures and types
pub mod core;

/// Term dictionary and its decorators
pub mod dictionary;

pub mod error;

/// Metrics exposure for caches and the notification bus
pub mod metrics;

/// Change events and the bus that delivers them
pub mod notification;

/// Cardinality estimation
pub mod statistics;

/// Permutation indexes, their backend and counters
pub mod storage;

/// Store facade
pub mod store;

// Re-export commonly used types
pub use error::{Error, Result};
