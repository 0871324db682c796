//! # blockx
//!
//! A blocking engine for entity resolution.
//!
//! Given a large record collection, blockx partitions records into small
//! candidate groups ("blocks") so that only records sharing a block are
//! ever compared for similarity - turning O(n²) pairwise comparison into
//! a near-linear problem without giving up recall. It does not decide
//! matches: it proposes candidate groupings and reports predicate
//! coverage statistics for the classifier and predicate-selection layers
//! sitting above it.
//!
//! ## Quick Start
//!
//! ```rust
//! use blockx::prelude::*;
//! use std::collections::HashMap;
//!
//! let records: HashMap<RecordId, Record> = [
//!     (RecordId::from(100u64), Record::new().with_field("name", "Jimbo")),
//!     (RecordId::from(105u64), Record::new().with_field("name", "Jimbo")),
//!     (RecordId::from(110u64), Record::new().with_field("name", "Martha")),
//! ]
//! .into();
//!
//! // Block on the whole field and on TF-IDF similarity of the name.
//! let blocker = Blocker::new(vec![
//!     Predicate::simple(SimpleKind::WholeField, "name"),
//!     Predicate::tfidf_search(0.8, "name").unwrap(),
//! ])
//! .unwrap();
//!
//! blocker.index_all(&records);
//!
//! let mut blocks: HashMap<BlockKey, Vec<RecordId>> = HashMap::new();
//! for (key, id) in blocker.block(&records) {
//!     blocks.entry(key).or_default().push(id);
//! }
//! // The two Jimbo records share a block under each predicate.
//! assert_eq!(blocks.values().filter(|ids| ids.len() == 2).count(), 2);
//! ```
//!
//! ## Crate Structure
//!
//! - [`blockx-core`](https://docs.rs/blockx-core) - predicates, TF-IDF
//!   indexing, canopy clustering, the blocker, and coverage analysis
//!
//! ## Features
//!
//! - **Predicate library**: whole-field, token, n-gram, prefix, and
//!   acronym transforms, plus conjunctive compound predicates
//! - **TF-IDF similarity**: incremental per-field inverted indices with
//!   canopy partitioning and corpus search
//! - **Lazy blocking**: record streams in, `(key, id)` pairs out, no
//!   buffering of the full result
//! - **Parallel blocking**: rayon fan-out across records once indexing
//!   is closed
//! - **Coverage analysis**: per-predicate covered-pair reporting for
//!   active-learning predicate selection

// Re-export core types
pub use blockx_core::{
    covered_pairs, BlockKey, Blocker, Error, FieldDefinition, FieldType, FieldValue, Predicate,
    Record, RecordId, Result, SimpleKind, TfidfIndex, TrainingPair, CANOPY_THRESHOLDS,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        covered_pairs, BlockKey, Blocker, Error, FieldDefinition, FieldType, FieldValue,
        Predicate, Record, RecordId, Result, SimpleKind, TfidfIndex, TrainingPair,
    };
}
