// src/services/cache.rs
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

/// Time-to-live cache for fetched data, owned by whoever does the fetching.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (DateTime<Utc>, V)>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        TtlCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<K, (DateTime<Utc>, V)>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Utc::now())
    }

    /// Returns the entry if it is younger than the TTL at `now`; stale entries are dropped.
    pub fn get_at(&self, key: &K, now: DateTime<Utc>) -> Option<V> {
        let mut entries = self.entries();
        let fresh = match entries.get(key) {
            Some((stored_at, _)) => now - *stored_at < self.ttl,
            None => return None,
        };
        if fresh {
            entries.get(key).map(|(_, v)| v.clone())
        } else {
            entries.remove(key);
            None
        }
    }

    pub fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Utc::now());
    }

    pub fn insert_at(&self, key: K, value: V, now: DateTime<Utc>) {
        self.entries().insert(key, (now, value));
    }

    pub fn invalidate(&self, key: &K) {
        self.entries().remove(key);
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_expire_after_ttl() {
        let cache = TtlCache::new(Duration::minutes(15));
        let t0 = Utc::now();
        cache.insert_at("VTI", 1.5, t0);

        assert_eq!(cache.get_at(&"VTI", t0 + Duration::minutes(14)), Some(1.5));
        assert_eq!(cache.get_at(&"VTI", t0 + Duration::minutes(15)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_drops_one_key() {
        let cache = TtlCache::new(Duration::hours(1));
        cache.insert("VTI", 1);
        cache.insert("BND", 2);
        cache.invalidate(&"VTI");
        assert_eq!(cache.get(&"VTI"), None);
        assert_eq!(cache.get(&"BND"), Some(2));
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
