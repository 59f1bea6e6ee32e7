use std::sync::Arc;
use std::time::Duration;

use audit::{spawn_retention_sweep, AuditSink, AuditStore, SqliteAuditStore};
use provider::CancellationToken;
use cache::{CacheManager, NullTier2, Tier1Cache};
use llmguardian::Orchestrator;
use provider::{ProviderClient, RetryPolicy};
use routing::ModelRegistry;
use sensitive::Detector;
use server::{start_server, ServerConfig, ServerState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Arc::new(ServerConfig::load()?);
    let guardian_config = Arc::new(config.guardian.clone());

    let detector = Arc::new(Detector::new());
    let registry = Arc::new(ModelRegistry::with_defaults());

    let cache_manager = Arc::new(CacheManager::new(
        Tier1Cache::new(guardian_config.cache.l1.max_size, Duration::from_secs(guardian_config.cache.l1.ttl_minutes * 60)),
        Arc::new(NullTier2),
        guardian_config.cache.l2.enabled,
        guardian_config.cache.l2.key_prefix.clone(),
    ));

    let provider_client = Arc::new(ProviderClient::new(
        "https://api.openai.com/v1",
        guardian_config.provider.openai.api_key.clone(),
        vec!["gpt-4o-mini".to_string(), "gpt-4o".to_string(), "gpt-3.5-turbo".to_string()],
        RetryPolicy {
            max_retries: guardian_config.provider.openai.max_retries,
            base_delay: Duration::from_millis(guardian_config.provider.openai.retry_delay_ms),
        },
        Duration::from_secs(guardian_config.provider.openai.timeout_seconds),
    ));

    let audit_store: Arc<dyn AuditStore> = Arc::new(SqliteAuditStore::open("llmguardian-audit.db")?);
    let audit_sink = Arc::new(AuditSink::spawn(audit_store.clone()));

    let retention_token = CancellationToken::new();
    let _retention_sweep = spawn_retention_sweep(audit_store, guardian_config.pii.audit.retention_days, retention_token);

    let orchestrator = Arc::new(Orchestrator::new(guardian_config, detector, registry, cache_manager, provider_client, audit_sink));
    let state = ServerState::new(config.clone(), orchestrator);

    start_server(config, state).await
}
