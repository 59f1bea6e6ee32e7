use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use llmguardian::Orchestrator;

use crate::config::ServerConfig;

/// Fixed-window per-key rate limiter: one counter reset once per minute.
/// Good enough at gateway scale; a sliding log is overkill for a request
/// budget measured in requests-per-minute.
struct RateWindow {
    count: u32,
    window_started_at: Instant,
}

/// Shared, `Arc`-cloned application state handed to every handler.
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<ServerConfig>,
    pub orchestrator: Arc<Orchestrator>,
    rate_limits: Arc<DashMap<String, RateWindow>>,
}

impl ServerState {
    pub fn new(config: Arc<ServerConfig>, orchestrator: Arc<Orchestrator>) -> Self {
        Self { config, orchestrator, rate_limits: Arc::new(DashMap::new()) }
    }

    pub fn is_valid_api_key(&self, key: &str) -> bool {
        self.config.api_keys.iter().any(|configured| configured == key)
    }

    /// Returns `true` if the call is within budget, incrementing the
    /// window's counter as a side effect. Resets the window once a minute
    /// has elapsed since it was opened.
    pub fn check_rate_limit(&self, key: &str) -> bool {
        let limit = self.config.rate_limit_per_minute;
        let mut entry = self.rate_limits.entry(key.to_string()).or_insert_with(|| RateWindow { count: 0, window_started_at: Instant::now() });

        if entry.window_started_at.elapsed() >= Duration::from_secs(60) {
            entry.count = 0;
            entry.window_started_at = Instant::now();
        }

        if entry.count >= limit {
            return false;
        }
        entry.count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit::{AuditSink, InMemoryAuditStore};
    use cache::{CacheManager, NullTier2, Tier1Cache};
    use provider::{ProviderClient, RetryPolicy};
    use routing::ModelRegistry;
    use sensitive::Detector;

    fn state() -> ServerState {
        let mut config = ServerConfig::default();
        config.api_keys = vec!["test-key".to_string()];
        config.rate_limit_per_minute = 2;

        let guardian_config = Arc::new(config.guardian.clone());
        let detector = Arc::new(Detector::new());
        let registry = Arc::new(ModelRegistry::with_defaults());
        let cache_manager = Arc::new(CacheManager::new(Tier1Cache::new(10, Duration::from_secs(60)), Arc::new(NullTier2), false, "llmg"));
        let provider_client = Arc::new(ProviderClient::new("https://api.openai.invalid/v1", "sk-test", vec!["gpt-4o-mini".to_string()], RetryPolicy::default(), Duration::from_secs(5)));
        let audit_sink = Arc::new(AuditSink::spawn(Arc::new(InMemoryAuditStore::new())));
        let orchestrator = Arc::new(Orchestrator::new(guardian_config, detector, registry, cache_manager, provider_client, audit_sink));

        ServerState::new(Arc::new(config), orchestrator)
    }

    #[test]
    fn valid_api_key_is_accepted() {
        assert!(state().is_valid_api_key("test-key"));
    }

    #[test]
    fn unknown_api_key_is_rejected() {
        assert!(!state().is_valid_api_key("not-a-key"));
    }

    #[test]
    fn rate_limit_allows_up_to_the_configured_budget_then_rejects() {
        let state = state();
        assert!(state.check_rate_limit("client-a"));
        assert!(state.check_rate_limit("client-a"));
        assert!(!state.check_rate_limit("client-a"));
    }

    #[test]
    fn rate_limit_is_tracked_independently_per_key() {
        let state = state();
        assert!(state.check_rate_limit("client-a"));
        assert!(state.check_rate_limit("client-a"));
        assert!(state.check_rate_limit("client-b"));
    }
}
