use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::tier1::Tier1Cache;
use crate::tier2::Tier2Cache;

const DEFAULT_TIER2_TTL_HOURS: u64 = 24;

/// Cache-wide statistics for `GET /analytics/cache`.
///
/// `hit_rate` denominator is tier-1 total requests: tier-2 hits are an
/// internal promotion detail, not a second population to divide by. The
/// source system this gateway is modeled on mixed tier-1 total requests with
/// tier-2 misses in its hit-rate formula; that was a bug, not a
/// specification, and is not reproduced here.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub tier1_hits: u64,
    pub tier1_misses: u64,
    pub tier1_evictions: u64,
    pub tier1_size: usize,
    pub tier2_enabled: bool,
    pub hit_rate: f64,
}

/// Read-through T1↔T2, write-through, health-checkable cache manager.
pub struct CacheManager {
    tier1: Tier1Cache,
    tier2: Arc<dyn Tier2Cache>,
    tier2_enabled: bool,
    tier2_ttl: Duration,
    key_prefix: String,
}

impl CacheManager {
    pub fn new(tier1: Tier1Cache, tier2: Arc<dyn Tier2Cache>, tier2_enabled: bool, key_prefix: impl Into<String>) -> Self {
        Self {
            tier1,
            tier2,
            tier2_enabled,
            tier2_ttl: Duration::from_secs(DEFAULT_TIER2_TTL_HOURS * 3600),
            key_prefix: key_prefix.into(),
        }
    }

    pub fn with_tier2_ttl(mut self, ttl: Duration) -> Self {
        self.tier2_ttl = ttl;
        self
    }

    /// Check T1; on miss, check T2; on T2 hit, promote into T1 before
    /// returning.
    pub async fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.tier1.get(key) {
            return Some(value);
        }
        if !self.tier2_enabled {
            return None;
        }
        let value = self.tier2.get(key).await?;
        self.tier1.put(key.to_string(), value.clone());
        Some(value)
    }

    /// Put into both tiers; T2 write carries its TTL.
    pub async fn put(&self, key: &str, value: &str) {
        self.tier1.put(key.to_string(), value.to_string());
        if self.tier2_enabled {
            self.tier2.put(key, value, self.tier2_ttl).await;
        }
    }

    pub async fn evict(&self, key: &str) {
        self.tier1.evict(key);
        if self.tier2_enabled {
            self.tier2.delete(key).await;
        }
    }

    /// Removes from both tiers; T2 clear is scoped to the configured key
    /// prefix.
    pub async fn clear(&self) {
        self.tier1.clear();
        if self.tier2_enabled {
            self.tier2.clear_prefix(&self.key_prefix).await;
        }
    }

    /// Write-read-delete cycle per tier; tier-2 is skipped when disabled.
    pub async fn health_check(&self) -> bool {
        let probe_key = format!("{}:__health__", self.key_prefix);
        self.tier1.put(probe_key.clone(), "ok".to_string());
        let tier1_ok = self.tier1.get(&probe_key).as_deref() == Some("ok");
        self.tier1.evict(&probe_key);

        let tier2_ok = if self.tier2_enabled { self.tier2.health_check().await } else { true };

        tier1_ok && tier2_ok
    }

    pub fn stats(&self) -> CacheStats {
        let stats = self.tier1.stats();
        let total = stats.total_requests();
        let hit_rate = if total == 0 { 0.0 } else { stats.hits() as f64 / total as f64 };
        CacheStats {
            tier1_hits: stats.hits(),
            tier1_misses: stats.misses(),
            tier1_evictions: stats.evictions(),
            tier1_size: self.tier1.size(),
            tier2_enabled: self.tier2_enabled,
            hit_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier2::NullTier2;

    fn manager(tier2_enabled: bool) -> CacheManager {
        CacheManager::new(Tier1Cache::new(10, Duration::from_secs(60)), Arc::new(NullTier2), tier2_enabled, "llmg")
    }

    #[tokio::test]
    async fn put_then_get_round_trips_through_tier1() {
        let manager = manager(true);
        manager.put("k", "v").await;
        assert_eq!(manager.get("k").await, Some("v".to_string()));
    }

    #[tokio::test]
    async fn miss_on_both_tiers_returns_none() {
        let manager = manager(true);
        assert_eq!(manager.get("missing").await, None);
    }

    #[tokio::test]
    async fn hit_rate_denominator_is_tier1_total_requests() {
        let manager = manager(true);
        manager.put("k", "v").await;
        manager.get("k").await; // hit
        manager.get("missing").await; // miss
        let stats = manager.stats();
        assert_eq!(stats.hit_rate, 0.5);
    }

    #[tokio::test]
    async fn disabled_tier2_is_skipped_by_health_check() {
        let manager = manager(false);
        assert!(manager.health_check().await);
    }

    #[tokio::test]
    async fn evict_removes_from_tier1() {
        let manager = manager(true);
        manager.put("k", "v").await;
        manager.evict("k").await;
        assert_eq!(manager.tier1.get("k"), None);
    }
}
