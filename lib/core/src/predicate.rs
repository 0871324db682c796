use crate::error::{Error, Result};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// The stateless key transforms. Each is a pure function from a field
/// value to a set of block keys; identical input always yields the same
/// key set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimpleKind {
    /// The untouched field value as a single key.
    WholeField,
    /// One key per whitespace-separated token.
    Token,
    /// The first whitespace-separated token.
    FirstToken,
    /// Every four-character window of the field with whitespace removed.
    CommonFourGram,
    /// Every six-character window of the field with whitespace removed.
    CommonSixGram,
    SameThreeCharStart,
    SameFiveCharStart,
    SameSevenCharStart,
    /// Initials of each token, sorted, joined into one key.
    SortedAcronym,
}

impl SimpleKind {
    pub const ALL: [SimpleKind; 9] = [
        SimpleKind::WholeField,
        SimpleKind::Token,
        SimpleKind::FirstToken,
        SimpleKind::CommonFourGram,
        SimpleKind::CommonSixGram,
        SimpleKind::SameThreeCharStart,
        SimpleKind::SameFiveCharStart,
        SimpleKind::SameSevenCharStart,
        SimpleKind::SortedAcronym,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SimpleKind::WholeField => "wholeField",
            SimpleKind::Token => "token",
            SimpleKind::FirstToken => "firstToken",
            SimpleKind::CommonFourGram => "commonFourGram",
            SimpleKind::CommonSixGram => "commonSixGram",
            SimpleKind::SameThreeCharStart => "sameThreeCharStart",
            SimpleKind::SameFiveCharStart => "sameFiveCharStart",
            SimpleKind::SameSevenCharStart => "sameSevenCharStart",
            SimpleKind::SortedAcronym => "sortedAcronym",
        }
    }

    /// Apply the transform to one field value. An empty value yields no
    /// keys; so does a value too short for the transform (e.g. a
    /// three-character string has no four-grams).
    pub fn apply(&self, value: &str) -> BTreeSet<String> {
        if value.is_empty() {
            return BTreeSet::new();
        }
        match self {
            SimpleKind::WholeField => std::iter::once(value.to_string()).collect(),
            SimpleKind::Token => value.split_whitespace().map(str::to_string).collect(),
            SimpleKind::FirstToken => value
                .split_whitespace()
                .next()
                .map(str::to_string)
                .into_iter()
                .collect(),
            SimpleKind::CommonFourGram => char_ngrams(value, 4),
            SimpleKind::CommonSixGram => char_ngrams(value, 6),
            SimpleKind::SameThreeCharStart => start_chars(value, 3),
            SimpleKind::SameFiveCharStart => start_chars(value, 5),
            SimpleKind::SameSevenCharStart => start_chars(value, 7),
            SimpleKind::SortedAcronym => sorted_acronym(value),
        }
    }
}

impl std::fmt::Display for SimpleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SimpleKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SimpleKind::ALL
            .iter()
            .find(|kind| kind.name() == s)
            .copied()
            .ok_or_else(|| Error::UnknownPredicateKind(s.to_string()))
    }
}

fn char_ngrams(value: &str, n: usize) -> BTreeSet<String> {
    let squashed: Vec<char> = value.chars().filter(|c| !c.is_whitespace()).collect();
    if squashed.len() < n {
        return BTreeSet::new();
    }
    squashed.windows(n).map(|w| w.iter().collect()).collect()
}

fn start_chars(value: &str, n: usize) -> BTreeSet<String> {
    let prefix: String = value.chars().filter(|c| !c.is_whitespace()).take(n).collect();
    if prefix.is_empty() {
        BTreeSet::new()
    } else {
        std::iter::once(prefix).collect()
    }
}

fn sorted_acronym(value: &str) -> BTreeSet<String> {
    let mut initials: Vec<char> = value
        .split_whitespace()
        .filter_map(|token| token.chars().next())
        .collect();
    if initials.is_empty() {
        return BTreeSet::new();
    }
    initials.sort_unstable();
    std::iter::once(initials.into_iter().collect()).collect()
}

/// A blocking predicate. Simple predicates are pure functions; the two
/// Tfidf variants read a shared, field-keyed similarity index owned by
/// the [`Blocker`](crate::Blocker). Compound predicates conjoin parts of
/// either flavor, possibly over different fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Predicate {
    Simple {
        kind: SimpleKind,
        field: String,
    },
    Compound {
        parts: Vec<Predicate>,
    },
    /// Key: the canopy cluster holding the query value, if indexed.
    TfidfCanopy {
        threshold: OrderedFloat<f64>,
        field: String,
    },
    /// Keys: every indexed value whose cosine similarity to the query
    /// reaches the threshold. The query need not be indexed.
    TfidfSearch {
        threshold: OrderedFloat<f64>,
        field: String,
    },
}

impl Predicate {
    #[must_use]
    pub fn simple(kind: SimpleKind, field: impl Into<String>) -> Self {
        Predicate::Simple {
            kind,
            field: field.into(),
        }
    }

    /// Conjoin two or more predicates. The combined key set is the
    /// Cartesian product of the parts' key sets; it is empty whenever any
    /// part's is.
    pub fn compound(parts: Vec<Predicate>) -> Result<Self> {
        if parts.len() < 2 {
            return Err(Error::CompoundTooShort { got: parts.len() });
        }
        Ok(Predicate::Compound { parts })
    }

    pub fn tfidf_canopy(threshold: f64, field: impl Into<String>) -> Result<Self> {
        check_threshold(threshold)?;
        Ok(Predicate::TfidfCanopy {
            threshold: OrderedFloat(threshold),
            field: field.into(),
        })
    }

    pub fn tfidf_search(threshold: f64, field: impl Into<String>) -> Result<Self> {
        check_threshold(threshold)?;
        Ok(Predicate::TfidfSearch {
            threshold: OrderedFloat(threshold),
            field: field.into(),
        })
    }

    /// Construct from the external `(kind, field, parameters)` surface.
    /// `threshold` is required for the two similarity kinds and ignored
    /// otherwise.
    pub fn from_parts(kind: &str, field: &str, threshold: Option<f64>) -> Result<Self> {
        match kind {
            "tfidfCanopy" => {
                let threshold = threshold.ok_or_else(|| Error::MissingThreshold {
                    kind: kind.to_string(),
                })?;
                Predicate::tfidf_canopy(threshold, field)
            }
            "tfidfSearch" => {
                let threshold = threshold.ok_or_else(|| Error::MissingThreshold {
                    kind: kind.to_string(),
                })?;
                Predicate::tfidf_search(threshold, field)
            }
            simple => Ok(Predicate::simple(SimpleKind::from_str(simple)?, field)),
        }
    }

    /// Re-validate an arbitrary predicate tree. The enum's fields are
    /// public for matching, so the blocker checks the construction
    /// invariants again before accepting a predicate set.
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Predicate::Simple { .. } => Ok(()),
            Predicate::Compound { parts } => {
                if parts.len() < 2 {
                    return Err(Error::CompoundTooShort { got: parts.len() });
                }
                parts.iter().try_for_each(Predicate::validate)
            }
            Predicate::TfidfCanopy { threshold, .. } | Predicate::TfidfSearch { threshold, .. } => {
                check_threshold(threshold.into_inner())
            }
        }
    }

    /// Collect every field that needs a similarity index.
    pub(crate) fn similarity_fields<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Predicate::Simple { .. } => {}
            Predicate::Compound { parts } => {
                for part in parts {
                    part.similarity_fields(out);
                }
            }
            Predicate::TfidfCanopy { field, .. } | Predicate::TfidfSearch { field, .. } => {
                out.insert(field);
            }
        }
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::Simple { kind, field } => write!(f, "{}({})", kind, field),
            Predicate::Compound { parts } => {
                f.write_str("compound(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", part)?;
                }
                f.write_str(")")
            }
            Predicate::TfidfCanopy { threshold, field } => {
                write!(f, "tfidfCanopy({:.2}, {})", threshold.into_inner(), field)
            }
            Predicate::TfidfSearch { threshold, field } => {
                write!(f, "tfidfSearch({:.2}, {})", threshold.into_inner(), field)
            }
        }
    }
}

fn check_threshold(value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::ThresholdOutOfRange { value })
    }
}
