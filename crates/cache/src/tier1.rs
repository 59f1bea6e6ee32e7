use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

const DEFAULT_MAX_ENTRIES: usize = 1000;
const DEFAULT_TTL_MINUTES: u64 = 60;

#[derive(Debug, Default)]
pub struct Tier1Stats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl Tier1Stats {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    pub fn total_requests(&self) -> u64 {
        self.hits() + self.misses()
    }
}

/// Bounded, process-local cache: LRU by recency-of-use, expires-after-write
/// with a configurable TTL. LRU gives recency-ordered eviction; TTL is
/// checked at read time against `inserted_at`.
pub struct Tier1Cache {
    entries: Mutex<LruCache<String, (String, Instant)>>,
    ttl: Duration,
    stats: Tier1Stats,
}

impl Tier1Cache {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_entries.max(1)).unwrap();
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            stats: Tier1Stats::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap();
        let hit = match entries.get(key) {
            Some((value, inserted_at)) if inserted_at.elapsed() <= self.ttl => Some(value.clone()),
            Some(_) => {
                entries.pop(key);
                None
            }
            None => None,
        };

        match &hit {
            Some(_) => self.stats.hits.fetch_add(1, Ordering::Relaxed),
            None => self.stats.misses.fetch_add(1, Ordering::Relaxed),
        };
        hit
    }

    pub fn put(&self, key: String, value: String) {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() == entries.cap().get() && !entries.contains(&key) {
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        }
        entries.put(key, (value, Instant::now()));
    }

    pub fn evict(&self, key: &str) {
        self.entries.lock().unwrap().pop(key);
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    pub fn size(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn stats(&self) -> &Tier1Stats {
        &self.stats
    }
}

impl Default for Tier1Cache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES, Duration::from_secs(DEFAULT_TTL_MINUTES * 60))
    }
}
