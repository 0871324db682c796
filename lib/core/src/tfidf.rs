// Reference-counted inverted index with TF-IDF weighting for one field.
use ahash::AHashMap;
use ordered_float::OrderedFloat;
use smallvec::SmallVec;
use tracing::debug;

pub(crate) type DocId = u32;

/// Term list of one document: (token, term frequency). Field values are
/// short, so the list almost always fits inline.
type Terms = SmallVec<[(String, u32); 4]>;

#[derive(Debug)]
struct Document {
    terms: Terms,
    /// How many times this value was indexed. The document disappears when
    /// the count returns to zero.
    refs: u32,
}

#[derive(Debug)]
struct Weights {
    version: u64,
    idf: AHashMap<String, f64>,
    norms: AHashMap<DocId, f64>,
}

#[derive(Debug)]
struct CanopyPartition {
    version: u64,
    /// doc -> canopy id (the canopy's founding document).
    assignment: AHashMap<DocId, DocId>,
}

/// Inverted index over the string values of one field.
///
/// Each distinct value is one document. Re-indexing a value bumps its
/// reference count without changing index structure, so clustering
/// results are identical whether a value set was indexed once or twice.
/// TF-IDF weights and canopy partitions are derived caches, versioned
/// against the index and rebuilt lazily after any structural mutation.
#[derive(Debug, Default)]
pub struct TfidfIndex {
    docs: AHashMap<DocId, Document>,
    ids: AHashMap<String, DocId>,
    /// token -> doc -> term frequency
    postings: AHashMap<String, AHashMap<DocId, u32>>,
    next_id: DocId,
    version: u64,
    weights: Option<Weights>,
    canopies: AHashMap<OrderedFloat<f64>, CanopyPartition>,
}

impl TfidfIndex {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct documents currently indexed.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.ids.contains_key(value)
    }

    /// Insert one value. A value already present only has its reference
    /// count bumped: no postings change, no cache invalidation.
    pub fn index(&mut self, value: &str) {
        if let Some(id) = self.ids.get(value) {
            if let Some(doc) = self.docs.get_mut(id) {
                doc.refs += 1;
            }
            return;
        }
        let terms = term_counts(value);
        if terms.is_empty() {
            return;
        }
        let id = self.next_id;
        self.next_id += 1;
        for (token, tf) in &terms {
            self.postings.entry(token.clone()).or_default().insert(id, *tf);
        }
        self.docs.insert(id, Document { terms, refs: 1 });
        self.ids.insert(value.to_string(), id);
        self.touch();
    }

    /// Remove one reference to a value. The document and its postings are
    /// dropped when the last reference goes; unindexing a value never
    /// indexed is a no-op.
    pub fn unindex(&mut self, value: &str) {
        let Some(&id) = self.ids.get(value) else {
            return;
        };
        let remaining = match self.docs.get_mut(&id) {
            Some(doc) => {
                doc.refs -= 1;
                doc.refs
            }
            None => return,
        };
        if remaining > 0 {
            return;
        }
        if let Some(doc) = self.docs.remove(&id) {
            for (token, _) in &doc.terms {
                let emptied = match self.postings.get_mut(token.as_str()) {
                    Some(list) => {
                        list.remove(&id);
                        list.is_empty()
                    }
                    None => false,
                };
                if emptied {
                    self.postings.remove(token.as_str());
                }
            }
        }
        self.ids.remove(value);
        self.touch();
    }

    /// Structural mutation: derived caches are stale from here on.
    fn touch(&mut self) {
        self.version += 1;
    }

    pub(crate) fn weights_fresh(&self) -> bool {
        self.weights
            .as_ref()
            .is_some_and(|w| w.version == self.version)
    }

    pub(crate) fn canopy_fresh(&self, threshold: f64) -> bool {
        self.canopies
            .get(&OrderedFloat(threshold))
            .is_some_and(|c| c.version == self.version)
    }

    /// Recompute IDF weights and document norms if the index mutated since
    /// the last computation. idf(t) = ln((1 + N) / (1 + df(t))) + 1, the
    /// smoothed form, so query tokens absent from the corpus still have a
    /// defined weight.
    pub(crate) fn ensure_weights(&mut self) {
        if self.weights_fresh() {
            return;
        }
        let total = self.docs.len();
        let mut idf: AHashMap<String, f64> = AHashMap::with_capacity(self.postings.len());
        for (token, list) in &self.postings {
            let df = list.len();
            idf.insert(
                token.clone(),
                ((1.0 + total as f64) / (1.0 + df as f64)).ln() + 1.0,
            );
        }
        let mut norms: AHashMap<DocId, f64> = AHashMap::with_capacity(total);
        for (&id, doc) in &self.docs {
            let mut sq = 0.0;
            for (token, tf) in &doc.terms {
                let weight = f64::from(*tf) * idf.get(token.as_str()).copied().unwrap_or(0.0);
                sq += weight * weight;
            }
            norms.insert(id, sq.sqrt());
        }
        debug!(docs = total, terms = idf.len(), "computed tf-idf weights");
        self.weights = Some(Weights {
            version: self.version,
            idf,
            norms,
        });
    }

    /// Recompute the canopy partition for one threshold if stale.
    ///
    /// Documents are visited in ascending doc id (the tie-break rule):
    /// each unassigned document founds a canopy and pulls in every
    /// still-unassigned document with cosine similarity at or above the
    /// threshold. Unmatched documents end up in singleton canopies, so
    /// every indexed document belongs to exactly one canopy.
    pub(crate) fn ensure_canopy(&mut self, threshold: f64) {
        self.ensure_weights();
        if self.canopy_fresh(threshold) {
            return;
        }
        let assignment = self.build_canopy(threshold);
        debug!(threshold = threshold, docs = assignment.len(), "built canopy partition");
        self.canopies.insert(
            OrderedFloat(threshold),
            CanopyPartition {
                version: self.version,
                assignment,
            },
        );
    }

    fn build_canopy(&self, threshold: f64) -> AHashMap<DocId, DocId> {
        let Some(w) = self.weights.as_ref() else {
            return AHashMap::new();
        };
        let mut order: Vec<DocId> = self.docs.keys().copied().collect();
        order.sort_unstable();

        let mut assignment: AHashMap<DocId, DocId> = AHashMap::with_capacity(order.len());
        for &center in &order {
            if assignment.contains_key(&center) {
                continue;
            }
            assignment.insert(center, center);
            let Some(doc) = self.docs.get(&center) else {
                continue;
            };
            let center_norm = w.norms.get(&center).copied().unwrap_or(0.0);
            if center_norm == 0.0 {
                continue;
            }
            // Only documents sharing a token can clear any threshold, so
            // candidates come from the center's posting lists.
            let mut dots: AHashMap<DocId, f64> = AHashMap::new();
            for (token, tf) in &doc.terms {
                let idf = w.idf.get(token.as_str()).copied().unwrap_or(0.0);
                let weight = f64::from(*tf) * idf;
                if let Some(list) = self.postings.get(token.as_str()) {
                    for (&other, &otf) in list {
                        if other == center || assignment.contains_key(&other) {
                            continue;
                        }
                        *dots.entry(other).or_insert(0.0) += weight * f64::from(otf) * idf;
                    }
                }
            }
            for (other, dot) in dots {
                let norm = w.norms.get(&other).copied().unwrap_or(0.0);
                if norm > 0.0 && dot / (center_norm * norm) >= threshold {
                    assignment.insert(other, center);
                }
            }
        }
        assignment
    }

    /// Canopy id of the cluster containing `value`, or None when the value
    /// is not indexed. Requires a fresh partition for this threshold.
    pub(crate) fn canopy_key(&self, threshold: f64, value: &str) -> Option<DocId> {
        let id = self.ids.get(value)?;
        let canopy = self.canopies.get(&OrderedFloat(threshold))?;
        debug_assert_eq!(canopy.version, self.version, "canopy queried while stale");
        canopy.assignment.get(id).copied()
    }

    /// Every indexed document with cosine similarity to `value` at or
    /// above the threshold, in ascending doc id order. The query is not
    /// inserted; it is weighted with the index's current IDF values.
    /// Requires fresh weights; an empty index matches nothing.
    pub(crate) fn search(&self, threshold: f64, value: &str) -> Vec<DocId> {
        let Some(w) = self.weights.as_ref() else {
            return Vec::new();
        };
        debug_assert_eq!(w.version, self.version, "search requires fresh weights");
        if self.docs.is_empty() {
            return Vec::new();
        }
        let query = term_counts(value);
        if query.is_empty() {
            return Vec::new();
        }
        let total = self.docs.len();
        let mut query_norm_sq = 0.0;
        let mut dots: AHashMap<DocId, f64> = AHashMap::new();
        for (token, tf) in &query {
            let idf = w
                .idf
                .get(token.as_str())
                .copied()
                .unwrap_or_else(|| ((1.0 + total as f64).ln()) + 1.0);
            let weight = f64::from(*tf) * idf;
            query_norm_sq += weight * weight;
            if let Some(list) = self.postings.get(token.as_str()) {
                for (&doc, &dtf) in list {
                    *dots.entry(doc).or_insert(0.0) += weight * f64::from(dtf) * idf;
                }
            }
        }
        let query_norm = query_norm_sq.sqrt();
        if query_norm == 0.0 {
            return Vec::new();
        }
        let mut matches: Vec<DocId> = dots
            .into_iter()
            .filter_map(|(doc, dot)| {
                let norm = w.norms.get(&doc).copied().unwrap_or(0.0);
                (norm > 0.0 && dot / (query_norm * norm) >= threshold).then_some(doc)
            })
            .collect();
        matches.sort_unstable();
        matches
    }
}

/// Lowercase and split on non-alphanumerics. Fixed for the lifetime of an
/// index: the same tokenizer runs at build time and query time.
fn tokenize(value: &str) -> Vec<String> {
    value
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn term_counts(value: &str) -> Terms {
    let mut terms = Terms::new();
    for token in tokenize(value) {
        match terms.iter_mut().find(|(t, _)| *t == token) {
            Some((_, tf)) => *tf += 1,
            None => terms.push((token, 1)),
        }
    }
    terms
}
