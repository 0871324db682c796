// Integration tests for blockx
use blockx::{
    covered_pairs, BlockKey, Blocker, FieldDefinition, Predicate, Record, RecordId, SimpleKind,
};
use std::collections::{BTreeSet, HashMap, HashSet};

fn fixture() -> HashMap<RecordId, Record> {
    let rows = [
        (100u64, "Bob", "50", "0"),
        (105, "Charlie", "75", "1"),
        (110, "Meredith", "40", "1"),
        (115, "Sue", "10", "0"),
        (120, "Jimbo", "21", "0"),
        (125, "Jimbo", "21", "0"),
        (130, "Willy", "35", "0"),
        (135, "Willy", "35", "1"),
        (140, "Martha", "19", "1"),
        (145, "Kyle", "27", "0"),
    ];
    rows.into_iter()
        .map(|(id, name, age, dataset)| {
            (
                RecordId::from(id),
                Record::new()
                    .with_field("name", name)
                    .with_field("age", age)
                    .with_field("dataset", dataset),
            )
        })
        .collect()
}

fn name_of(record: &Record) -> &str {
    record.get("name").and_then(|v| v.as_text()).unwrap()
}

fn dataset_of(record: &Record) -> &str {
    record.get("dataset").and_then(|v| v.as_text()).unwrap()
}

fn integer_id(id: &RecordId) -> u64 {
    match id {
        RecordId::Integer(i) => *i,
        other => panic!("fixture ids are integers, got {other}"),
    }
}

fn group_blocks(
    blocker: &Blocker,
    records: &HashMap<RecordId, Record>,
) -> HashMap<BlockKey, BTreeSet<u64>> {
    let mut blocks: HashMap<BlockKey, BTreeSet<u64>> = HashMap::new();
    for (key, id) in blocker.block(records) {
        blocks.entry(key).or_default().insert(integer_id(&id));
    }
    blocks
}

#[test]
fn test_unconstrained_inverted_index() {
    let records = fixture();
    let blocker = Blocker::new(vec![Predicate::tfidf_search(0.0, "name").unwrap()]).unwrap();

    let names: BTreeSet<&str> = records.values().map(name_of).collect();
    blocker.index(&names, "name");

    let blocks = group_blocks(&blocker, &records);

    // Even at threshold zero, only records sharing index tokens block
    // together: the two Jimbos and the two Willys.
    let multi: BTreeSet<BTreeSet<u64>> = blocks
        .values()
        .filter(|ids| ids.len() > 1)
        .cloned()
        .collect();
    let expected: BTreeSet<BTreeSet<u64>> =
        [[120u64, 125].into(), [130u64, 135].into()].into();
    assert_eq!(multi, expected);
}

fn split_fixture() -> (HashMap<RecordId, Record>, Vec<String>) {
    let records = fixture();
    let first: HashMap<RecordId, Record> = records
        .iter()
        .filter(|(_, r)| dataset_of(r) == "0")
        .map(|(id, r)| (id.clone(), r.clone()))
        .collect();
    let second_names: Vec<String> = records
        .values()
        .filter(|r| dataset_of(r) == "1")
        .map(|r| name_of(r).to_string())
        .collect();
    (first, second_names)
}

#[test]
fn test_cross_corpus_search() {
    let (first, second_names) = split_fixture();
    let blocker = Blocker::new(vec![Predicate::tfidf_search(0.0, "name").unwrap()]).unwrap();
    blocker.index(&second_names, "name");

    let blocks = group_blocks(&blocker, &first);

    // "Willy" (130) exactly matches an indexed value and sits alone in
    // its block; no other first-partition record has a counterpart.
    let expected: Vec<BTreeSet<u64>> = vec![[130u64].into()];
    assert_eq!(blocks.into_values().collect::<Vec<_>>(), expected);
}

#[test]
fn test_doubled_index() {
    let (first, second_names) = split_fixture();
    let blocker = Blocker::new(vec![Predicate::tfidf_search(0.0, "name").unwrap()]).unwrap();
    blocker.index(&second_names, "name");
    blocker.index(&second_names, "name");

    // Indexing the same values twice changes reference counts, not
    // observable blocking.
    let blocks = group_blocks(&blocker, &first);
    let expected: Vec<BTreeSet<u64>> = vec![[130u64].into()];
    assert_eq!(blocks.into_values().collect::<Vec<_>>(), expected);
}

#[test]
fn test_unindex() {
    let (first, second_names) = split_fixture();
    let blocker = Blocker::new(vec![Predicate::tfidf_search(0.0, "name").unwrap()]).unwrap();
    blocker.index(&second_names, "name");
    blocker.unindex(&second_names, "name");

    // Fully unindexed: indistinguishable from never having indexed.
    assert_eq!(blocker.block(&first).count(), 0);
}

#[test]
fn test_training_pair_coverage() {
    let matches = [
        (("Bob", "50"), ("Bob", "75")),
        (("Meredith", "40"), ("Sue", "10")),
    ];
    let distinct = [
        (("Jimmy", "20"), ("Jimbo", "21")),
        (("Willy", "35"), ("William", "35")),
        (("William", "36"), ("William", "35")),
    ];
    let pair = |((n1, a1), (n2, a2)): ((&str, &str), (&str, &str))| {
        (
            Record::new().with_field("name", n1).with_field("age", a1),
            Record::new().with_field("name", n2).with_field("age", a2),
        )
    };
    let training: Vec<(Record, Record)> = matches
        .into_iter()
        .chain(distinct)
        .map(pair)
        .collect();

    let training_records: HashSet<Record> = training
        .iter()
        .flat_map(|(a, b)| [a.clone(), b.clone()])
        .collect();
    let records: HashMap<RecordId, Record> = training_records
        .into_iter()
        .enumerate()
        .map(|(i, r)| (RecordId::from(i as u64), r))
        .collect();

    let blocker = Blocker::new(FieldDefinition::text("name").predicates()).unwrap();
    blocker.index_all(&records);

    let coverage = covered_pairs(&blocker, &training);

    let mut expected = vec![
        Predicate::simple(SimpleKind::Token, "name"),
        Predicate::simple(SimpleKind::CommonSixGram, "name"),
        Predicate::simple(SimpleKind::SortedAcronym, "name"),
        Predicate::simple(SimpleKind::SameThreeCharStart, "name"),
        Predicate::simple(SimpleKind::SameFiveCharStart, "name"),
        Predicate::simple(SimpleKind::SameSevenCharStart, "name"),
        Predicate::simple(SimpleKind::WholeField, "name"),
        Predicate::simple(SimpleKind::CommonFourGram, "name"),
        Predicate::simple(SimpleKind::FirstToken, "name"),
    ];
    for threshold in [0.2, 0.4, 0.6, 0.8] {
        expected.push(Predicate::tfidf_canopy(threshold, "name").unwrap());
    }

    for predicate in &expected {
        let covered = coverage.get(predicate);
        assert!(
            covered.is_some_and(|pairs| !pairs.is_empty()),
            "{predicate} should cover at least one training pair"
        );
    }
}

#[test]
fn test_blocking_is_deterministic() {
    let records = fixture();
    let blocker = Blocker::new(vec![
        Predicate::simple(SimpleKind::FirstToken, "name"),
        Predicate::tfidf_search(0.0, "name").unwrap(),
    ])
    .unwrap();
    blocker.index_all(&records);

    let collect = || {
        let mut pairs: Vec<_> = blocker.block(&records).collect();
        pairs.sort();
        pairs
    };
    assert_eq!(collect(), collect());
}
