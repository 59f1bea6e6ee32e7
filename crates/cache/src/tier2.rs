use std::time::Duration;

use async_trait::async_trait;

/// Network-backed key-value store contract. Any I/O failure is logged and
/// treated as a miss (reads) or a silent drop (writes): a tier-2 outage must
/// never fail a request.
#[async_trait]
pub trait Tier2Cache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn put(&self, key: &str, value: &str, ttl: Duration);
    async fn delete(&self, key: &str);
    async fn clear_prefix(&self, prefix: &str);
    /// Write-read-delete cycle used by the cache manager's health check.
    async fn health_check(&self) -> bool;
}

/// Used when `cache.l2.enabled=false`: all operations are no-ops and reads
/// always report a miss.
pub struct NullTier2;

#[async_trait]
impl Tier2Cache for NullTier2 {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn put(&self, _key: &str, _value: &str, _ttl: Duration) {}

    async fn delete(&self, _key: &str) {}

    async fn clear_prefix(&self, _prefix: &str) {}

    async fn health_check(&self) -> bool {
        true
    }
}

/// An HTTP key-value client speaking a generic `GET/PUT/DELETE
/// {key_prefix}/{key}` contract against a shared network cache service.
pub struct HttpTier2Cache {
    client: reqwest::Client,
    base_url: String,
    key_prefix: String,
}

impl HttpTier2Cache {
    pub fn new(base_url: impl Into<String>, key_prefix: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client, base_url: base_url.into(), key_prefix: key_prefix.into() }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}/{}", self.base_url.trim_end_matches('/'), self.key_prefix, key)
    }
}

#[async_trait]
impl Tier2Cache for HttpTier2Cache {
    async fn get(&self, key: &str) -> Option<String> {
        match self.client.get(self.url_for(key)).send().await {
            Ok(response) if response.status().is_success() => response.text().await.ok(),
            Ok(response) => {
                if !response.status().as_u16().eq(&404) {
                    tracing::warn!(status = %response.status(), "tier-2 cache get returned non-success, treating as miss");
                }
                None
            }
            Err(error) => {
                tracing::warn!(%error, "tier-2 cache get failed, treating as miss");
                None
            }
        }
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) {
        let result = self
            .client
            .put(self.url_for(key))
            .header("x-ttl-seconds", ttl.as_secs().to_string())
            .body(value.to_string())
            .send()
            .await;
        if let Err(error) = result {
            tracing::warn!(%error, "tier-2 cache put failed, dropping silently");
        }
    }

    async fn delete(&self, key: &str) {
        if let Err(error) = self.client.delete(self.url_for(key)).send().await {
            tracing::warn!(%error, "tier-2 cache delete failed, dropping silently");
        }
    }

    async fn clear_prefix(&self, prefix: &str) {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), prefix);
        if let Err(error) = self.client.delete(url).send().await {
            tracing::warn!(%error, "tier-2 cache clear_prefix failed, dropping silently");
        }
    }

    async fn health_check(&self) -> bool {
        let probe_key = "__health__";
        self.put(probe_key, "ok", Duration::from_secs(5)).await;
        let read_back = self.get(probe_key).await;
        self.delete(probe_key).await;
        read_back.as_deref() == Some("ok")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_tier2_always_misses() {
        let tier2 = NullTier2;
        tier2.put("k", "v", Duration::from_secs(60)).await;
        assert_eq!(tier2.get("k").await, None);
    }

    #[tokio::test]
    async fn null_tier2_health_check_reports_healthy() {
        let tier2 = NullTier2;
        assert!(tier2.health_check().await);
    }
}
