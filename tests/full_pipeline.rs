use std::sync::Arc;
use std::time::Duration;

use audit::{AuditSink, AuditStore, InMemoryAuditStore};
use cache::{CacheManager, NullTier2, Tier1Cache};
use llmguardian::{CancellationToken, CompletionRequestDto, GuardianConfig, Orchestrator};
use provider::{ProviderClient, RetryPolicy};
use routing::ModelRegistry;
use sensitive::Detector;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(query: impl Into<String>) -> CompletionRequestDto {
    CompletionRequestDto {
        query: query.into(),
        max_tokens: 500,
        temperature: None,
        top_p: None,
        model: None,
        routing_strategy: None,
        enable_optimization: true,
        enable_cache: true,
    }
}

async fn build_orchestrator(base_url: &str, audit_store: Arc<dyn AuditStore>) -> (Orchestrator, Arc<AuditSink>) {
    let config = Arc::new(GuardianConfig::default());
    let detector = Arc::new(Detector::new());
    let registry = Arc::new(ModelRegistry::with_defaults());
    let cache_manager = Arc::new(CacheManager::new(Tier1Cache::new(100, Duration::from_secs(3600)), Arc::new(NullTier2), false, "llmg"));
    let provider_client = Arc::new(ProviderClient::new(
        base_url,
        "sk-test",
        vec!["gpt-4o-mini".to_string(), "gpt-4o".to_string(), "gpt-3.5-turbo".to_string()],
        RetryPolicy { max_retries: 3, base_delay: Duration::from_millis(5) },
        Duration::from_secs(5),
    ));
    let audit_sink = Arc::new(AuditSink::spawn(audit_store));
    (Orchestrator::new(config, detector, registry, cache_manager, provider_client, audit_sink.clone()), audit_sink)
}

fn completion_body(content: &str, prompt_tokens: u32, completion_tokens: u32) -> serde_json::Value {
    json!({
        "choices": [{
            "message": { "content": content },
            "finish_reason": "stop",
        }],
        "usage": { "prompt_tokens": prompt_tokens, "completion_tokens": completion_tokens },
    })
}

#[tokio::test]
async fn scenario_1_hello_world_no_pii() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("This is a generated response.", 10, 5)))
        .expect(1)
        .mount(&server)
        .await;

    let (orchestrator, _sink) = build_orchestrator(&server.uri(), Arc::new(InMemoryAuditStore::new())).await;
    let response = orchestrator.process(request("Hello, world!"), CancellationToken::new()).await;

    assert!(response.success);
    let metadata = response.metadata.unwrap();
    assert!(!metadata.from_cache);
    assert!(!metadata.pii_detected);
    assert_eq!(metadata.total_tokens, 15);
    assert_eq!(metadata.model_used, "gpt-4o-mini");
}

#[tokio::test]
async fn scenario_2_email_is_redacted_before_reaching_the_provider_and_audited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Sure, I'll follow up.", 12, 6)))
        .mount(&server)
        .await;

    let audit_store: Arc<dyn AuditStore> = Arc::new(InMemoryAuditStore::new());
    let (orchestrator, _sink) = build_orchestrator(&server.uri(), audit_store.clone()).await;

    let response = orchestrator
        .process(request("Contact me at john.doe@example.com regarding the project."), CancellationToken::new())
        .await;

    assert!(response.success);
    let metadata = response.metadata.unwrap();
    assert!(metadata.pii_detected);
    assert_eq!(metadata.pii_count, 1);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let sent_body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(!sent_body.contains("john.doe@example.com"));

    // Audit submission is fire-and-forget; give the background worker a
    // moment to drain the channel before asserting on the store.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(audit_store.count().unwrap(), 1);
}

#[tokio::test]
async fn scenario_3_repeat_query_hits_cache_on_second_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Repeated.", 4, 2)))
        .expect(1)
        .mount(&server)
        .await;

    let (orchestrator, _sink) = build_orchestrator(&server.uri(), Arc::new(InMemoryAuditStore::new())).await;

    let first = orchestrator.process(request("Repeat this query."), CancellationToken::new()).await;
    let second = orchestrator.process(request("Repeat this query."), CancellationToken::new()).await;

    assert!(first.success && second.success);
    assert!(!first.metadata.unwrap().from_cache);
    assert!(second.metadata.unwrap().from_cache);
}

#[tokio::test]
async fn scenario_4_long_filler_prompt_is_optimized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Here's a draft email.", 20, 10)))
        .mount(&server)
        .await;

    let (orchestrator, _sink) = build_orchestrator(&server.uri(), Arc::new(InMemoryAuditStore::new())).await;
    let query = "So basically, I was wondering if you could possibly help me write an email actually about the project status.";
    let response = orchestrator.process(request(query), CancellationToken::new()).await;

    assert!(response.success);
    let metadata = response.metadata.unwrap();
    assert!(metadata.optimization_applied);
    assert!(metadata.tokens_saved > 0);
}

#[tokio::test]
async fn scenario_5_empty_query_is_rejected_before_any_provider_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("unreachable", 1, 1)))
        .expect(0)
        .mount(&server)
        .await;

    let (orchestrator, _sink) = build_orchestrator(&server.uri(), Arc::new(InMemoryAuditStore::new())).await;
    let response = orchestrator.process(request(""), CancellationToken::new()).await;

    assert!(!response.success);
    assert!(response.metadata.is_none());
}

#[tokio::test]
async fn scenario_6_rate_limited_twice_then_success_logs_three_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Recovered.", 8, 4)))
        .mount(&server)
        .await;

    let (orchestrator, _sink) = build_orchestrator(&server.uri(), Arc::new(InMemoryAuditStore::new())).await;
    let response = orchestrator.process(request("Will this retry correctly?"), CancellationToken::new()).await;

    assert!(response.success);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}
