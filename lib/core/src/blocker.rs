use crate::error::Result;
use crate::predicate::Predicate;
use crate::record::{Record, RecordId};
use crate::tfidf::{DocId, TfidfIndex};
use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// An opaque grouping key. Records emitted under the same key are
/// candidates for pairwise comparison downstream.
///
/// The rendered form is `<raw-key>:<predicate-ordinal>`, so two
/// predicates that happen to produce the same raw key never collide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockKey(String);

impl BlockKey {
    fn new(raw: &str, ordinal: usize) -> Self {
        BlockKey(format!("{raw}:{ordinal}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BlockKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Applies a predicate set to a record stream, emitting one
/// `(BlockKey, RecordId)` pair per generated key.
///
/// The blocker owns one similarity index per field that any Tfidf
/// predicate targets; predicates sharing a field share the index.
/// Mutations (`index`, `unindex`, `index_all`) serialize behind that
/// field's lock while other fields proceed independently. Blocking and
/// coverage only read, recomputing a stale weight or canopy cache once
/// at the mutation-to-query transition.
pub struct Blocker {
    predicates: Vec<Predicate>,
    indices: HashMap<String, Arc<RwLock<TfidfIndex>>>,
}

impl Blocker {
    /// Build a blocker over an ordered predicate set. Fails if any
    /// predicate breaks a construction invariant (threshold range,
    /// compound arity).
    pub fn new(predicates: Vec<Predicate>) -> Result<Self> {
        let mut fields = BTreeSet::new();
        for predicate in &predicates {
            predicate.validate()?;
            predicate.similarity_fields(&mut fields);
        }
        let indices = fields
            .into_iter()
            .map(|field| {
                (
                    field.to_string(),
                    Arc::new(RwLock::new(TfidfIndex::new())),
                )
            })
            .collect();
        Ok(Self { predicates, indices })
    }

    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Populate every similarity index from a full record collection in
    /// one pass: for each field with a Tfidf predicate, every value of
    /// that field (set members included) becomes a document.
    pub fn index_all(&self, records: &HashMap<RecordId, Record>) {
        for (field, lock) in &self.indices {
            let mut index = lock.write();
            for record in records.values() {
                if let Some(value) = record.get(field) {
                    for text in value.values() {
                        index.index(text);
                    }
                }
            }
            debug!(field = %field, docs = index.len(), "indexed field values");
        }
    }

    /// Incrementally index values into `field`'s similarity index. A
    /// field no similarity predicate targets has no index; the call is a
    /// no-op then.
    pub fn index<I, S>(&self, values: I, field: &str)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(lock) = self.indices.get(field) else {
            warn!(field = %field, "no similarity predicate targets this field");
            return;
        };
        let mut index = lock.write();
        for value in values {
            index.index(value.as_ref());
        }
    }

    /// Remove values from `field`'s similarity index, one reference each.
    pub fn unindex<I, S>(&self, values: I, field: &str)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(lock) = self.indices.get(field) else {
            warn!(field = %field, "no similarity predicate targets this field");
            return;
        };
        let mut index = lock.write();
        for value in values {
            index.unindex(value.as_ref());
        }
    }

    /// Map a record stream to a lazy stream of `(BlockKey, RecordId)`
    /// pairs. Closes the mutation phase first: any stale weight or canopy
    /// cache is recomputed once, after which iteration takes read locks
    /// only. Pair order is unspecified; the pair *set* is deterministic
    /// for a fixed index state.
    pub fn block<'a, I>(&'a self, records: I) -> impl Iterator<Item = (BlockKey, RecordId)> + 'a
    where
        I: IntoIterator<Item = (&'a RecordId, &'a Record)> + 'a,
        I::IntoIter: 'a,
    {
        self.prepare();
        records.into_iter().flat_map(move |(id, record)| {
            let mut out = Vec::new();
            self.emit(id, record, &mut out);
            out
        })
    }

    /// Parallel variant of [`block`](Self::block): record-level blocking
    /// is embarrassingly parallel once the indices are prepared. Produces
    /// the same pair set, in unspecified order.
    pub fn par_block(&self, records: &HashMap<RecordId, Record>) -> Vec<(BlockKey, RecordId)> {
        self.prepare();
        records
            .par_iter()
            .flat_map_iter(|(id, record)| {
                let mut out = Vec::new();
                self.emit(id, record, &mut out);
                out
            })
            .collect()
    }

    fn emit(&self, id: &RecordId, record: &Record, out: &mut Vec<(BlockKey, RecordId)>) {
        for (ordinal, predicate) in self.predicates.iter().enumerate() {
            for raw in self.key_set(predicate, record) {
                out.push((BlockKey::new(&raw, ordinal), id.clone()));
            }
        }
    }

    /// The raw (un-namespaced) key set of one predicate against one
    /// record. Missing fields and unmatched queries yield empty sets; an
    /// empty result for one predicate never disturbs the others.
    pub(crate) fn key_set(&self, predicate: &Predicate, record: &Record) -> BTreeSet<String> {
        match predicate {
            Predicate::Simple { kind, field } => {
                let mut keys = BTreeSet::new();
                if let Some(value) = record.get(field) {
                    for text in value.values() {
                        keys.extend(kind.apply(text));
                    }
                }
                keys
            }
            Predicate::Compound { parts } => {
                let mut product: Vec<String> = Vec::new();
                for (i, part) in parts.iter().enumerate() {
                    let part_keys = self.key_set(part, record);
                    if part_keys.is_empty() {
                        return BTreeSet::new();
                    }
                    product = if i == 0 {
                        part_keys.into_iter().collect()
                    } else {
                        product
                            .iter()
                            .flat_map(|a| part_keys.iter().map(move |b| format!("{a}:{b}")))
                            .collect()
                    };
                }
                product.into_iter().collect()
            }
            Predicate::TfidfCanopy { threshold, field } => {
                let mut keys = BTreeSet::new();
                if let Some(value) = record.get(field) {
                    for text in value.values() {
                        if let Some(canopy) =
                            self.canopy_assignment(field, threshold.into_inner(), text)
                        {
                            keys.insert(canopy.to_string());
                        }
                    }
                }
                keys
            }
            Predicate::TfidfSearch { threshold, field } => {
                let mut keys = BTreeSet::new();
                if let Some(value) = record.get(field) {
                    for text in value.values() {
                        for doc in self.search_matches(field, threshold.into_inner(), text) {
                            keys.insert(doc.to_string());
                        }
                    }
                }
                keys
            }
        }
    }

    /// Recompute stale caches for every similarity predicate in the set.
    /// This is the explicit mutation-to-query checkpoint.
    pub(crate) fn prepare(&self) {
        for predicate in &self.predicates {
            self.prepare_predicate(predicate);
        }
    }

    fn prepare_predicate(&self, predicate: &Predicate) {
        match predicate {
            Predicate::Simple { .. } => {}
            Predicate::Compound { parts } => {
                for part in parts {
                    self.prepare_predicate(part);
                }
            }
            Predicate::TfidfCanopy { threshold, field } => {
                if let Some(lock) = self.indices.get(field) {
                    let threshold = threshold.into_inner();
                    if !lock.read().canopy_fresh(threshold) {
                        lock.write().ensure_canopy(threshold);
                    }
                }
            }
            Predicate::TfidfSearch { field, .. } => {
                if let Some(lock) = self.indices.get(field) {
                    if !lock.read().weights_fresh() {
                        lock.write().ensure_weights();
                    }
                }
            }
        }
    }

    fn canopy_assignment(&self, field: &str, threshold: f64, value: &str) -> Option<DocId> {
        let lock = self.indices.get(field)?;
        {
            let index = lock.read();
            if index.canopy_fresh(threshold) {
                return index.canopy_key(threshold, value);
            }
        }
        // Mutated since the last checkpoint; rebuild before answering.
        let mut index = lock.write();
        index.ensure_canopy(threshold);
        index.canopy_key(threshold, value)
    }

    fn search_matches(&self, field: &str, threshold: f64, value: &str) -> Vec<DocId> {
        let Some(lock) = self.indices.get(field) else {
            return Vec::new();
        };
        {
            let index = lock.read();
            if index.weights_fresh() {
                return index.search(threshold, value);
            }
        }
        let mut index = lock.write();
        index.ensure_weights();
        index.search(threshold, value)
    }
}
