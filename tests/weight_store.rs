//! Persistence contract of the vote-weight store.

use conflux::combine::{Trainer, VoteWeights, WeightMode};
use conflux::eval::{LabeledDocument, MetricName};
use conflux::{EntityType, Error, Mention, RecognizerId};
use std::collections::BTreeMap;

#[test]
fn fitted_table_round_trips_through_the_store() {
    let gold = RecognizerId::Other("gold".into());
    let corpus = vec![LabeledDocument {
        reference: vec![
            Mention::try_new("a", EntityType::Person, 0, 6, gold.clone()).unwrap(),
            Mention::try_new("b", EntityType::Date, 10, 18, gold).unwrap(),
        ],
        outputs: BTreeMap::from([
            (
                RecognizerId::Stanford,
                vec![Mention::try_new("a", EntityType::Person, 0, 6, RecognizerId::Stanford)
                    .unwrap()],
            ),
            (
                RecognizerId::DateFinder,
                vec![Mention::try_new("b", EntityType::Date, 10, 18, RecognizerId::DateFinder)
                    .unwrap()],
            ),
        ]),
    }];
    let fitted = Trainer::new(WeightMode::PerCategory).fit(&corpus);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights.json");
    fitted.save(&path).unwrap();
    let loaded = VoteWeights::load(&path).unwrap();

    assert_eq!(fitted, loaded);
    // spot-check one logical key after the round trip
    assert_eq!(
        loaded.get(
            &RecognizerId::Stanford,
            MetricName::Precision,
            Some(EntityType::Person)
        ),
        1.0
    );
}

#[test]
fn missing_store_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let result = VoteWeights::load(dir.path().join("absent.json"));
    assert!(matches!(result, Err(Error::Store(_))));
}

#[test]
fn corrupt_store_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights.json");
    std::fs::write(&path, "{ not valid json").unwrap();
    let result = VoteWeights::load(&path);
    assert!(matches!(result, Err(Error::Store(_))));
}

#[test]
fn refitting_replaces_the_prior_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights.json");

    let mut first = VoteWeights::new(WeightMode::Global);
    first.set(RecognizerId::Stanford, MetricName::Precision, None, 0.3);
    first.save(&path).unwrap();

    let mut second = VoteWeights::new(WeightMode::Global);
    second.set(RecognizerId::Stanford, MetricName::Precision, None, 0.8);
    second.save(&path).unwrap();

    let loaded = VoteWeights::load(&path).unwrap();
    assert_eq!(
        loaded.get(&RecognizerId::Stanford, MetricName::Precision, None),
        0.8
    );
}
