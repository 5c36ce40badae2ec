//! Query result caches
//!
//! Answers are kept in two LRU tiers so that cheap lookups cannot push out the results
//! of slow ones: queries answered within the latency threshold go to `fast`, the rest to
//! `slow`. Both tiers share one capacity; a capacity of zero disables caching.

use lru::LruCache;
use parking_lot::Mutex;
use protree_core::{PeptideMapping, SequenceMatchingPreferences};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct QueryCache {
    tiers: Mutex<Tiers>,
    threshold: Duration,
    hit_count: AtomicUsize,
    miss_count: AtomicUsize,
}

struct Tiers {
    fast: Option<LruCache<String, Arc<PeptideMapping>>>,
    slow: Option<LruCache<String, Arc<PeptideMapping>>>,
    capacity: usize,
    /// Preferences the cached answers were computed under
    preferences: Option<SequenceMatchingPreferences>,
}

fn tier(capacity: usize) -> Option<LruCache<String, Arc<PeptideMapping>>> {
    NonZeroUsize::new(capacity).map(LruCache::new)
}

/// Which tier an answer was stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    Fast,
    Slow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCacheStats {
    pub hit_count: usize,
    pub miss_count: usize,
    pub fast_len: usize,
    pub slow_len: usize,
    pub capacity: usize,
}

impl QueryCacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

impl QueryCache {
    pub fn new(capacity: usize, threshold: Duration) -> Self {
        QueryCache {
            tiers: Mutex::new(Tiers {
                fast: tier(capacity),
                slow: tier(capacity),
                capacity,
                preferences: None,
            }),
            threshold,
            hit_count: AtomicUsize::new(0),
            miss_count: AtomicUsize::new(0),
        }
    }

    /// Cached answer for a peptide, promoting it to most recently used.
    pub fn get(&self, peptide: &str) -> Option<Arc<PeptideMapping>> {
        let mut guard = self.tiers.lock();
        let tiers = &mut *guard;
        let mut found = tiers.fast.as_mut().and_then(|fast| fast.get(peptide).cloned());
        if found.is_none() {
            found = tiers.slow.as_mut().and_then(|slow| slow.get(peptide).cloned());
        }

        if found.is_some() {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.miss_count.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Look a peptide up without touching recency or counters
    pub fn peek(&self, peptide: &str) -> Option<Arc<PeptideMapping>> {
        let tiers = self.tiers.lock();
        tiers
            .fast
            .as_ref()
            .and_then(|fast| fast.peek(peptide).cloned())
            .or_else(|| tiers.slow.as_ref().and_then(|slow| slow.peek(peptide).cloned()))
    }

    /// Store an answer in the tier matching how long it took to compute.
    pub fn insert(
        &self,
        peptide: String,
        mapping: Arc<PeptideMapping>,
        elapsed: Duration,
    ) -> Option<CacheTier> {
        let mut guard = self.tiers.lock();
        let tiers = &mut *guard;
        let (target, tier) = if elapsed <= self.threshold {
            (tiers.fast.as_mut(), CacheTier::Fast)
        } else {
            (tiers.slow.as_mut(), CacheTier::Slow)
        };
        let cache = target?;
        cache.put(peptide, mapping);
        Some(tier)
    }

    /// Clear both tiers when `preferences` differ from those of the cached answers.
    /// Returns whether the caches were emptied.
    pub fn ensure_preferences(&self, preferences: &SequenceMatchingPreferences) -> bool {
        let mut tiers = self.tiers.lock();
        if tiers.preferences.as_ref() == Some(preferences) {
            return false;
        }
        let had_entries = tiers.preferences.is_some();
        tiers.preferences = Some(*preferences);
        clear_tiers(&mut tiers);
        had_entries
    }

    pub fn clear(&self) {
        clear_tiers(&mut self.tiers.lock());
    }

    /// Change the capacity of each tier, evicting least recently used answers.
    pub fn set_capacity(&self, capacity: usize) {
        let mut guard = self.tiers.lock();
        let tiers = &mut *guard;
        tiers.capacity = capacity;
        match NonZeroUsize::new(capacity) {
            Some(cap) => {
                for cache in [&mut tiers.fast, &mut tiers.slow] {
                    match cache {
                        Some(existing) => existing.resize(cap),
                        None => *cache = Some(LruCache::new(cap)),
                    }
                }
            }
            None => {
                tiers.fast = None;
                tiers.slow = None;
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.tiers.lock().capacity
    }

    pub fn len(&self) -> usize {
        let tiers = self.tiers.lock();
        tiers.fast.as_ref().map_or(0, |c| c.len()) + tiers.slow.as_ref().map_or(0, |c| c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> QueryCacheStats {
        let tiers = self.tiers.lock();
        QueryCacheStats {
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            fast_len: tiers.fast.as_ref().map_or(0, |c| c.len()),
            slow_len: tiers.slow.as_ref().map_or(0, |c| c.len()),
            capacity: tiers.capacity,
        }
    }
}

fn clear_tiers(tiers: &mut Tiers) {
    if let Some(fast) = tiers.fast.as_mut() {
        fast.clear();
    }
    if let Some(slow) = tiers.slow.as_mut() {
        slow.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn answer(accession: &str) -> Arc<PeptideMapping> {
        Arc::new(HashMap::from([(
            "PEP".to_string(),
            HashMap::from([(accession.to_string(), vec![0])]),
        )]))
    }

    const FAST: Duration = Duration::from_millis(1);
    const SLOW: Duration = Duration::from_secs(1);

    #[test]
    fn test_tier_selection() {
        let cache = QueryCache::new(4, Duration::from_millis(50));
        assert_eq!(
            cache.insert("AAA".to_string(), answer("P1"), FAST),
            Some(CacheTier::Fast)
        );
        assert_eq!(
            cache.insert("CCC".to_string(), answer("P2"), SLOW),
            Some(CacheTier::Slow)
        );
        let stats = cache.stats();
        assert_eq!((stats.fast_len, stats.slow_len), (1, 1));
        assert_eq!(cache.get("CCC").unwrap()["PEP"]["P2"], vec![0]);
    }

    #[test]
    fn test_lru_evicts_least_recently_touched() {
        let cache = QueryCache::new(2, Duration::from_millis(50));
        cache.insert("AAA".to_string(), answer("P1"), FAST);
        cache.insert("CCC".to_string(), answer("P2"), FAST);

        // Touching AAA makes CCC the eviction candidate
        assert!(cache.get("AAA").is_some());
        cache.insert("DDD".to_string(), answer("P3"), FAST);

        assert!(cache.peek("AAA").is_some());
        assert!(cache.peek("CCC").is_none());
        assert!(cache.peek("DDD").is_some());
    }

    #[test]
    fn test_tiers_evict_independently() {
        let cache = QueryCache::new(1, Duration::from_millis(50));
        cache.insert("AAA".to_string(), answer("P1"), SLOW);
        cache.insert("CCC".to_string(), answer("P2"), FAST);
        cache.insert("DDD".to_string(), answer("P3"), FAST);

        assert!(cache.peek("AAA").is_some());
        assert!(cache.peek("CCC").is_none());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_zero_capacity_disables() {
        let cache = QueryCache::new(0, Duration::from_millis(50));
        assert_eq!(cache.insert("AAA".to_string(), answer("P1"), FAST), None);
        assert!(cache.get("AAA").is_none());

        cache.set_capacity(3);
        cache.insert("AAA".to_string(), answer("P1"), FAST);
        assert!(cache.get("AAA").is_some());

        cache.set_capacity(0);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 0);
    }

    #[test]
    fn test_preference_change_clears() {
        let cache = QueryCache::new(4, Duration::from_millis(50));
        let exact = SequenceMatchingPreferences::exact();
        assert!(!cache.ensure_preferences(&exact));
        cache.insert("AAA".to_string(), answer("P1"), FAST);

        assert!(!cache.ensure_preferences(&exact));
        assert_eq!(cache.len(), 1);

        assert!(cache.ensure_preferences(&SequenceMatchingPreferences::combinatorial()));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_hit_rate() {
        let cache = QueryCache::new(4, Duration::from_millis(50));
        cache.insert("AAA".to_string(), answer("P1"), FAST);
        cache.get("AAA");
        cache.get("CCC");
        assert_eq!(cache.stats().hit_rate(), 0.5);
    }
}
