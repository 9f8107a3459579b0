//! Property-based tests for the database handle.
//!
//! Each case opens a fresh database in its own temporary directory, so cases
//! are independent and shrink cleanly.

use proptest::prelude::*;

use rdb::api::{Database, ErrorKind};

fn fresh_db() -> (tempfile::TempDir, Database) {
    let temp = tempfile::tempdir().expect("tempdir");
    let db = Database::open(temp.path().join("prop_db")).expect("open");
    (temp, db)
}

fn bytes() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..256)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: set(k, v) then get(k) returns v.
    #[test]
    fn prop_set_then_get_round_trips(key in bytes(), value in bytes()) {
        let (_temp, db) = fresh_db();
        db.set(&key, &value).expect("set");
        prop_assert_eq!(db.get(&key).expect("get"), value);
    }

    /// Property: the last write wins.
    #[test]
    fn prop_overwrite_returns_latest(key in bytes(), first in bytes(), second in bytes()) {
        let (_temp, db) = fresh_db();
        db.set(&key, &first).expect("set first");
        db.set(&key, &second).expect("set second");
        prop_assert_eq!(db.get(&key).expect("get"), second);
    }

    /// Property: remove(k) then get(k) is NotFound.
    #[test]
    fn prop_remove_then_get_is_not_found(key in bytes(), value in bytes()) {
        let (_temp, db) = fresh_db();
        db.set(&key, &value).expect("set");
        db.remove(&key).expect("remove");
        let err = db.get(&key).expect_err("removed");
        prop_assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    /// Property: for_each sees exactly the distinct keys that were written.
    #[test]
    fn prop_for_each_matches_written_keys(
        entries in prop::collection::btree_map(bytes(), bytes(), 0..32)
    ) {
        let (_temp, db) = fresh_db();
        for (key, value) in &entries {
            db.set(key, value).expect("set");
        }
        let collected: std::collections::BTreeMap<_, _> =
            db.entries().expect("entries").into_iter().collect();
        prop_assert_eq!(collected, entries);
    }
}
