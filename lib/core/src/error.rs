use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Construction-time errors. Predicate evaluation itself never fails:
/// missing fields and empty indices degrade to empty key sets.
#[derive(Error, Debug)]
pub enum Error {
    #[error("similarity threshold out of range: {value} (expected 0.0..=1.0)")]
    ThresholdOutOfRange { value: f64 },

    #[error("compound predicate needs at least two parts, got {got}")]
    CompoundTooShort { got: usize },

    #[error("similarity predicate kind {kind} requires a threshold")]
    MissingThreshold { kind: String },

    #[error("unknown predicate kind: {0}")]
    UnknownPredicateKind(String),
}
