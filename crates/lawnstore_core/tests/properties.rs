//! Property tests over the adapter's observable behavior.

use lawnstore_core::{Completion, Record};
use lawnstore_engine::Key;
use lawnstore_testkit::prelude::*;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
enum Op {
    Save(i64),
    Remove(i64),
    Exists(i64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let key = 0_i64..6;
    prop_oneof![
        key.clone().prop_map(Op::Save),
        key.clone().prop_map(Op::Remove),
        key.prop_map(Op::Exists),
    ]
}

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn scans_return_every_distinct_record(records in distinct_records_strategy(0..40)) {
        let test = TestAdapter::memory();
        let report = settle(test.batch(records.clone())).unwrap();
        prop_assert!(report.is_ok());

        let mut expected = records;
        expected.sort_by(|a, b| a.key.cmp(&b.key));
        let keys: Vec<Key> = expected.iter().filter_map(|r| r.key.clone()).collect();

        prop_assert_eq!(settle(test.all()).unwrap(), expected);
        prop_assert_eq!(settle(test.keys()).unwrap(), keys);

        settle(test.nuke()).unwrap();
        prop_assert!(settle(test.all()).unwrap().is_empty());
    }

    #[test]
    fn keyless_saves_get_unique_keys(
        records in prop::collection::vec(keyless_record_strategy(), 1..20),
        vendor in any::<bool>(),
    ) {
        let test = if vendor { TestAdapter::vendor() } else { TestAdapter::memory() };
        let mut seen = BTreeSet::new();

        for record in records {
            let saved = settle(test.save(record.clone())).unwrap();
            let key = saved.key.clone().unwrap();
            prop_assert!(seen.insert(key.clone()));
            prop_assert_eq!(settle(test.get(key)).unwrap().map(|r| r.data), Some(record.data));
        }
    }

    #[test]
    fn exists_follows_save_and_remove(
        ops in prop::collection::vec(op_strategy(), 1..40),
        before_ready in any::<bool>(),
    ) {
        let mut test = if before_ready { TestAdapter::held() } else { TestAdapter::memory() };
        let mut model = BTreeSet::new();
        let mut probes: Vec<(Completion<bool>, bool)> = Vec::new();

        for op in ops {
            match op {
                Op::Save(k) => {
                    model.insert(k);
                    drop(test.save(Record::with_key(k, serde_json::json!(k))));
                }
                Op::Remove(k) => {
                    model.remove(&k);
                    drop(test.remove(Key::Int(k)));
                }
                Op::Exists(k) => probes.push((test.exists(k), model.contains(&k))),
            }
        }

        if before_ready {
            prop_assert_eq!(test.release(), Ok(()));
        }
        for (probe, expected) in probes {
            prop_assert_eq!(settle(probe), Ok(expected));
        }
        let keys: Vec<Key> = model.into_iter().map(Key::Int).collect();
        prop_assert_eq!(settle(test.keys()).unwrap(), keys);
    }

    #[test]
    fn batch_results_stay_aligned_with_inputs(
        records in distinct_records_strategy(1..30),
        poison in prop::collection::vec(any::<bool>(), 30),
    ) {
        let test = TestAdapter::memory();
        let poisoned: BTreeMap<usize, Key> = records
            .iter()
            .enumerate()
            .filter(|(i, _)| poison[*i])
            .filter_map(|(i, r)| r.key.clone().map(|k| (i, k)))
            .collect();
        for key in poisoned.values() {
            test.factory.poison_key(key.clone());
        }

        let report = settle(test.batch(records.clone())).unwrap();
        prop_assert_eq!(&report.results, &records);
        prop_assert_eq!(report.failed_indices(), poisoned.keys().copied().collect::<Vec<_>>());

        let keys: Vec<Key> = records.iter().filter_map(|r| r.key.clone()).collect();
        let fetched = settle(test.get_many(keys)).unwrap();
        for (i, record) in records.iter().enumerate() {
            if poisoned.contains_key(&i) {
                prop_assert_eq!(&fetched.results[i], &None);
            } else {
                prop_assert_eq!(fetched.results[i].as_ref(), Some(record));
            }
        }
    }
}
