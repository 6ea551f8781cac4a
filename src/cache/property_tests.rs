//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the envelope codec and the embedded adapter against
//! the cache contract.

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::thread::sleep;
use std::time::Duration;

use crate::cache::{entry, Cache, EmbeddedCache};
use crate::error::CacheError;

// == Strategies ==
/// Generates printable cache keys, including separators
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_:.-]{1,48}"
}

/// A nested value shaped like typical cached application data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Record {
    id: u64,
    name: String,
    score: Option<i32>,
    tags: Vec<String>,
    attrs: BTreeMap<String, bool>,
}

fn record_strategy() -> impl Strategy<Value = Record> {
    (
        any::<u64>(),
        "[ -~]{0,32}",
        any::<Option<i32>>(),
        prop::collection::vec("[a-z]{1,8}", 0..5),
        prop::collection::btree_map("[a-z]{1,8}", any::<bool>(), 0..5),
    )
        .prop_map(|(id, name, score, tags, attrs)| Record {
            id,
            name,
            score,
            tags,
            attrs,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Decoding an encoded envelope under the same key yields the original value.
    #[test]
    fn prop_codec_roundtrip(key in key_strategy(), record in record_strategy()) {
        let bytes = entry::encode(&key, &record).unwrap();
        let decoded: Record = entry::decode(&key, &bytes).unwrap();
        prop_assert_eq!(decoded, record);
    }

    // Any truncation of a valid envelope is rejected rather than misread.
    #[test]
    fn prop_codec_rejects_truncation(
        key in key_strategy(),
        record in record_strategy(),
        cut in any::<prop::sample::Index>()
    ) {
        let bytes = entry::encode(&key, &record).unwrap();
        let len = cut.index(bytes.len());
        prop_assert!(entry::decode::<Record>(&key, &bytes[..len]).is_err());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    // Storing a value and reading it back returns the same value.
    #[test]
    fn prop_embedded_roundtrip(key in key_strategy(), record in record_strategy()) {
        let cache = EmbeddedCache::temporary().unwrap();

        cache.set(&key, &record, None).unwrap();

        prop_assert!(cache.has(&key));
        let retrieved: Record = cache.get(&key).unwrap();
        prop_assert_eq!(retrieved, record);
    }

    // The last write to a key wins.
    #[test]
    fn prop_embedded_overwrite(
        key in key_strategy(),
        first in record_strategy(),
        second in record_strategy()
    ) {
        let cache = EmbeddedCache::temporary().unwrap();

        cache.set(&key, &first, None).unwrap();
        cache.set(&key, &second, Some(3600)).unwrap();

        let retrieved: Record = cache.get(&key).unwrap();
        prop_assert_eq!(retrieved, second);
        prop_assert_eq!(cache.len(), 1);
    }

    // After forget, the key is gone, and forgetting again still succeeds.
    #[test]
    fn prop_embedded_forget(key in key_strategy(), record in record_strategy()) {
        let cache = EmbeddedCache::temporary().unwrap();

        cache.set(&key, &record, None).unwrap();
        cache.forget(&key).unwrap();
        cache.forget(&key).unwrap();

        prop_assert!(!cache.has(&key));
        prop_assert!(matches!(cache.get::<Record>(&key), Err(CacheError::NotFound(_))));
    }

    // Bulk delete removes exactly the keys sharing the prefix.
    #[test]
    fn prop_embedded_prefix_match_complete(
        keys in prop::collection::hash_set(key_strategy(), 1..40),
        prefix in "[a-c]{1,2}"
    ) {
        let cache = EmbeddedCache::temporary().unwrap();
        for key in &keys {
            cache.set(key, key, None).unwrap();
        }

        cache.empty_by_match(&prefix).unwrap();

        let survivors: HashSet<&String> = keys.iter().filter(|k| cache.has(k)).collect();
        let expected: HashSet<&String> = keys.iter().filter(|k| !k.starts_with(&prefix)).collect();
        prop_assert_eq!(survivors, expected);
    }
}

// Separate proptest block with fewer cases for time-sensitive TTL tests
proptest! {
    #![proptest_config(ProptestConfig::with_cases(3))]

    // Entries written with a TTL stop being readable once it elapses.
    #[test]
    fn prop_embedded_ttl_expiry(key in key_strategy(), record in record_strategy()) {
        let cache = EmbeddedCache::temporary().unwrap();

        cache.set(&key, &record, Some(1)).unwrap();
        prop_assert!(cache.get::<Record>(&key).is_ok());

        sleep(Duration::from_millis(1100));

        prop_assert!(!cache.has(&key));
        prop_assert!(matches!(cache.get::<Record>(&key), Err(CacheError::NotFound(_))));
    }
}
