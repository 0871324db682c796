use crate::predicate::{Predicate, SimpleKind};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Canopy thresholds proposed for every text field. Candidate predicates
/// at several thresholds let downstream selection keep whichever recall
/// level separates the training pairs best.
pub const CANOPY_THRESHOLDS: [f64; 4] = [0.2, 0.4, 0.6, 0.8];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Text,
    Set,
}

/// A field the caller wants blocked, used to derive the candidate
/// predicate pool handed to predicate selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
}

impl FieldDefinition {
    #[must_use]
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Text,
        }
    }

    #[must_use]
    pub fn set(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Set,
        }
    }

    /// Every simple transform plus canopy predicates at the standard
    /// thresholds. Thresholds come from [`CANOPY_THRESHOLDS`] and are in
    /// range by construction, so the variants are built directly.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut out: Vec<Predicate> = SimpleKind::ALL
            .iter()
            .map(|&kind| Predicate::simple(kind, self.name.clone()))
            .collect();
        for threshold in CANOPY_THRESHOLDS {
            out.push(Predicate::TfidfCanopy {
                threshold: OrderedFloat(threshold),
                field: self.name.clone(),
            });
        }
        out
    }
}
