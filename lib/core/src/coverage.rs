//! Predicate coverage over labeled training pairs: the signal predicate
//! selection ranks candidates by.

use crate::blocker::Blocker;
use crate::predicate::Predicate;
use crate::record::Record;
use std::collections::{HashMap, HashSet};

/// A labeled pair of records, match or distinct; the label lives with the
/// caller.
pub type TrainingPair = (Record, Record);

/// For every predicate in the blocker's set, the indices of the pairs it
/// covers: pairs whose two members share at least one raw block key under
/// that predicate.
///
/// Simple predicates are evaluated directly; similarity predicates read
/// the blocker's already-populated indices. Pure: no index mutation
/// beyond recomputing stale caches at the query checkpoint.
pub fn covered_pairs<'a>(
    blocker: &'a Blocker,
    pairs: &[TrainingPair],
) -> HashMap<&'a Predicate, HashSet<usize>> {
    blocker.prepare();
    let mut coverage: HashMap<&Predicate, HashSet<usize>> = HashMap::new();
    for (pair_id, (a, b)) in pairs.iter().enumerate() {
        for predicate in blocker.predicates() {
            let keys_a = blocker.key_set(predicate, a);
            if keys_a.is_empty() {
                continue;
            }
            let keys_b = blocker.key_set(predicate, b);
            if keys_a.intersection(&keys_b).next().is_some() {
                coverage.entry(predicate).or_default().insert(pair_id);
            }
        }
    }
    coverage
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::SimpleKind;

    fn named(name: &str, age: &str) -> Record {
        Record::new().with_field("name", name).with_field("age", age)
    }

    #[test]
    fn test_whole_field_coverage_round_trip() {
        let whole = Predicate::simple(SimpleKind::WholeField, "name");
        let blocker = Blocker::new(vec![whole.clone()]).unwrap();

        let pairs = vec![
            (named("Bob", "50"), named("Bob", "75")),
            (named("Willy", "35"), named("William", "35")),
        ];
        let coverage = covered_pairs(&blocker, &pairs);

        // Identical field values are always covered, differing ones never.
        let covered = coverage.get(&whole).unwrap();
        assert!(covered.contains(&0));
        assert!(!covered.contains(&1));
    }

    #[test]
    fn test_compound_requires_every_part() {
        let compound = Predicate::compound(vec![
            Predicate::simple(SimpleKind::WholeField, "name"),
            Predicate::simple(SimpleKind::WholeField, "age"),
        ])
        .unwrap();
        let blocker = Blocker::new(vec![compound.clone()]).unwrap();

        let pairs = vec![
            (named("Bob", "50"), named("Bob", "50")),
            (named("Bob", "50"), named("Bob", "75")),
        ];
        let coverage = covered_pairs(&blocker, &pairs);

        let covered = coverage.get(&compound).unwrap();
        assert_eq!(covered, &HashSet::from([0]));
    }

    #[test]
    fn test_uncovering_predicates_absent_from_map() {
        let whole = Predicate::simple(SimpleKind::WholeField, "name");
        let blocker = Blocker::new(vec![whole]).unwrap();

        let pairs = vec![(named("Bob", "50"), named("Sue", "10"))];
        assert!(covered_pairs(&blocker, &pairs).is_empty());
    }
}
