//! # blockx Core
//!
//! Core library for the blockx blocking engine.
//!
//! Blocking turns the O(n²) pairwise-comparison problem of entity
//! resolution into a near-linear one: records are partitioned into small
//! candidate groups ("blocks") and only records sharing a block are ever
//! compared downstream. This crate provides the pieces:
//!
//! - [`Predicate`] - deterministic block-key generators over field values,
//!   including conjunctive compounds
//! - [`TfidfIndex`] - per-field inverted index with TF-IDF weighting,
//!   canopy clustering, and corpus search
//! - [`Blocker`] - applies a predicate set to a record stream, emitting
//!   `(BlockKey, RecordId)` pairs and managing the index lifecycle
//! - [`covered_pairs`] - reports which predicates place which labeled
//!   pairs in a common block, the signal consumed by predicate selection
//!
//! ## Example
//!
//! ```rust
//! use blockx_core::{Blocker, Predicate, Record, RecordId, SimpleKind};
//! use std::collections::HashMap;
//!
//! let records: HashMap<RecordId, Record> = [
//!     (RecordId::from(1u64), Record::new().with_field("name", "Jimbo")),
//!     (RecordId::from(2u64), Record::new().with_field("name", "Jimbo")),
//! ]
//! .into();
//!
//! let blocker = Blocker::new(vec![
//!     Predicate::simple(SimpleKind::WholeField, "name"),
//!     Predicate::tfidf_search(0.5, "name").unwrap(),
//! ])
//! .unwrap();
//! blocker.index_all(&records);
//!
//! // Both records land under both predicates' keys.
//! assert_eq!(blocker.block(&records).count(), 4);
//! ```

pub mod blocker;
pub mod coverage;
pub mod error;
pub mod fields;
pub mod predicate;
pub mod record;
pub mod tfidf;

pub use blocker::{BlockKey, Blocker};
pub use coverage::{covered_pairs, TrainingPair};
pub use error::{Error, Result};
pub use fields::{FieldDefinition, FieldType, CANOPY_THRESHOLDS};
pub use predicate::{Predicate, SimpleKind};
pub use record::{FieldValue, Record, RecordId};
pub use tfidf::TfidfIndex;
