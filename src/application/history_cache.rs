use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::domain::forecast::Window;
use crate::domain::ohlcv::History;

/// Inputs a fetched history depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryKey {
    pub ticker: String,
    pub window: Window,
}

impl HistoryKey {
    pub fn new(ticker: &str, window: Window) -> Self {
        Self {
            ticker: ticker.trim().to_uppercase(),
            window,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedHistory {
    history: History,
    fetched_at: Instant,
}

/// Bounded, TTL-limited cache of locally fetched histories.
///
/// Entries are keyed by ticker and window, so changing either one misses.
/// When the inputs change, [`HistoryCache::retain_only`] drops everything
/// that no longer matches. The cache only saves network calls; a miss is
/// always safe.
pub struct HistoryCache {
    entries: RwLock<HashMap<HistoryKey, CachedHistory>>,
    ttl: Duration,
    capacity: usize,
}

impl std::fmt::Debug for HistoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryCache")
            .field("entries", &"<RwLock>")
            .field("ttl", &self.ttl)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl HistoryCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, key: &HistoryKey) -> Option<History> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &HistoryKey, now: Instant) -> Option<History> {
        let guard = match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("HistoryCache: Lock poisoned during read, recovering");
                poisoned.into_inner()
            }
        };

        let entry = guard.get(key)?;
        if now.saturating_duration_since(entry.fetched_at) > self.ttl {
            tracing::trace!("HistoryCache: Entry expired for {:?}", key);
            return None;
        }
        tracing::trace!("HistoryCache: Cache HIT for {:?}", key);
        Some(entry.history.clone())
    }

    pub fn insert(&self, key: HistoryKey, history: History) {
        self.insert_at(key, history, Instant::now());
    }

    fn insert_at(&self, key: HistoryKey, history: History, now: Instant) {
        let mut guard = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("HistoryCache: Lock poisoned during write, recovering");
                poisoned.into_inner()
            }
        };

        guard.retain(|_, e| now.saturating_duration_since(e.fetched_at) <= self.ttl);

        if !guard.contains_key(&key) && guard.len() >= self.capacity {
            let oldest = guard
                .iter()
                .min_by_key(|(_, e)| e.fetched_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                tracing::debug!("HistoryCache: Evicting {:?}", oldest);
                guard.remove(&oldest);
            }
        }

        guard.insert(
            key,
            CachedHistory {
                history,
                fetched_at: now,
            },
        );
    }

    /// Drops every entry except `key`.
    pub fn retain_only(&self, key: &HistoryKey) {
        match self.entries.write() {
            Ok(mut guard) => guard.retain(|k, _| k == key),
            Err(poisoned) => poisoned.into_inner().retain(|k, _| k == key),
        }
    }

    pub fn clear(&self) {
        match self.entries.write() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvRecord;
    use chrono::NaiveDate;

    fn sample_history(close: f64) -> History {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        History::from_records(vec![OhlcvRecord::new(date, close, close, close, close, 1.0)])
            .unwrap()
    }

    fn key(ticker: &str, window: u32) -> HistoryKey {
        HistoryKey::new(ticker, Window::new(window).unwrap())
    }

    #[test]
    fn test_hit_for_same_inputs() {
        let cache = HistoryCache::new(Duration::from_secs(60), 4);
        cache.insert(key("amzn", 60), sample_history(1.0));

        // Ticker is normalized to upper case
        assert!(cache.get(&key("AMZN", 60)).is_some());
    }

    #[test]
    fn test_new_ticker_or_window_misses() {
        let cache = HistoryCache::new(Duration::from_secs(60), 4);
        cache.insert(key("AMZN", 60), sample_history(1.0));

        assert!(cache.get(&key("MSFT", 60)).is_none());
        assert!(cache.get(&key("AMZN", 90)).is_none());
    }

    #[test]
    fn test_entries_expire_after_ttl() {
        let cache = HistoryCache::new(Duration::from_secs(10), 4);
        let start = Instant::now();
        cache.insert_at(key("AMZN", 60), sample_history(1.0), start);

        assert!(cache.get_at(&key("AMZN", 60), start + Duration::from_secs(5)).is_some());
        assert!(cache.get_at(&key("AMZN", 60), start + Duration::from_secs(11)).is_none());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = HistoryCache::new(Duration::from_secs(600), 2);
        let start = Instant::now();
        cache.insert_at(key("A", 60), sample_history(1.0), start);
        cache.insert_at(key("B", 60), sample_history(2.0), start + Duration::from_secs(1));
        cache.insert_at(key("C", 60), sample_history(3.0), start + Duration::from_secs(2));

        assert_eq!(cache.len(), 2);
        let now = start + Duration::from_secs(3);
        assert!(cache.get_at(&key("A", 60), now).is_none());
        assert!(cache.get_at(&key("B", 60), now).is_some());
        assert!(cache.get_at(&key("C", 60), now).is_some());
    }

    #[test]
    fn test_retain_only_invalidates_other_inputs() {
        let cache = HistoryCache::new(Duration::from_secs(600), 4);
        cache.insert(key("AMZN", 60), sample_history(1.0));
        cache.insert(key("MSFT", 60), sample_history(2.0));

        cache.retain_only(&key("MSFT", 60));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key("AMZN", 60)).is_none());

        cache.clear();
        assert!(cache.is_empty());
    }
}
