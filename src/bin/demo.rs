use std::sync::Arc;
use std::time::Duration;

use audit::{AuditSink, InMemoryAuditStore};
use cache::{CacheManager, NullTier2, Tier1Cache};
use llmguardian::{CompletionRequestDto, GuardianConfig, Orchestrator};
use provider::{CancellationToken, ProviderClient, RetryPolicy};
use routing::ModelRegistry;
use sensitive::Detector;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let config = Arc::new(GuardianConfig::default());
    let detector = Arc::new(Detector::new());
    let registry = Arc::new(ModelRegistry::with_defaults());
    let cache_manager = Arc::new(CacheManager::new(
        Tier1Cache::new(config.cache.l1.max_size, Duration::from_secs(config.cache.l1.ttl_minutes * 60)),
        Arc::new(NullTier2),
        false,
        config.cache.l2.key_prefix.clone(),
    ));
    let provider_client = Arc::new(ProviderClient::new(
        "https://api.openai.com/v1",
        std::env::var("LLMGUARDIAN_PROVIDER_OPENAI_API_KEY").unwrap_or_default(),
        vec!["gpt-4o-mini".to_string(), "gpt-4o".to_string(), "gpt-3.5-turbo".to_string()],
        RetryPolicy::default(),
        Duration::from_secs(config.provider.openai.timeout_seconds),
    ));
    let audit_sink = Arc::new(AuditSink::spawn(Arc::new(InMemoryAuditStore::new())));

    let orchestrator = Orchestrator::new(config, detector, registry, cache_manager, provider_client, audit_sink);

    let request = CompletionRequestDto {
        query: "Hello, world! Contact me at demo@example.com if this fails.".to_string(),
        max_tokens: 256,
        temperature: None,
        top_p: None,
        model: None,
        routing_strategy: None,
        enable_optimization: true,
        enable_cache: true,
    };

    let response = orchestrator.process(request, CancellationToken::new()).await;
    println!("{}", serde_json::to_string_pretty(&response).unwrap());
}
