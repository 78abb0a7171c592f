use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use serde::Serialize;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    pub total_keys: usize,
    pub keys: Vec<String>,
}

/// In-memory cache where each read decides how old an entry may be.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, (Instant, V)>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the value if it was set less than `timeout` ago. Expired
    /// entries are removed.
    pub fn get(&self, key: &str, timeout: Duration) -> Option<V> {
        let mut entries = self.lock();

        let expired = match entries.get(key) {
            Some((stored, value)) if stored.elapsed() <= timeout => return Some(value.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            log::debug!("Cache entry {key} expired");
            entries.remove(key);
        }

        None
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        self.lock().insert(key.into(), (Instant::now(), value));
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.lock();
        let mut keys = entries.keys().cloned().collect::<Vec<_>>();
        keys.sort();

        CacheStats {
            total_keys: keys.len(),
            keys,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, (Instant, V)>> {
        // A panic while holding the lock cannot leave a half-written entry
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_entry_is_returned() {
        let cache = TtlCache::new();
        cache.set("stations", 3);

        assert_eq!(cache.get("stations", Duration::from_secs(60)), Some(3));
        assert_eq!(cache.get("routes", Duration::from_secs(60)), None);
    }

    #[test]
    fn test_expired_entry_is_removed() {
        let cache = TtlCache::new();
        cache.set("subway_ace", "feed".to_owned());

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("subway_ace", Duration::from_millis(1)), None);
        assert_eq!(cache.stats().total_keys, 0);
    }

    #[test]
    fn test_clear_and_stats() {
        let cache = TtlCache::new();
        cache.set("line_1", 1);
        cache.set("line_L", 2);

        assert_eq!(
            cache.stats(),
            CacheStats {
                total_keys: 2,
                keys: vec!["line_1".to_owned(), "line_L".to_owned()],
            }
        );

        cache.clear();
        assert_eq!(cache.stats().total_keys, 0);
    }
}
