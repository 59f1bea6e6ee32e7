use std::collections::HashSet;
use std::sync::Arc;

use audit::{AuditRecord, AuditSink};
use cache::{cache_key, CacheManager};
use chrono::Utc;
use provider::{CancellationToken, CompletionRequest, ModelRates, ProviderClient};
use routing::{ComplexityAnalyzer, ModelRegistry, ModelRouter, RoutingStrategy};
use sensitive::{Detector, SvContext, TokenGenerationMode};
use uuid::Uuid;

use crate::config::{AuditLevelConfig, GuardianConfig};
use crate::dto::{CompletionMetadata, CompletionRequestDto, CompletionResponseDto};
use crate::error::GuardianError;
use crate::metrics::{GuardianStage, MetricsSpan, StageContext};
use crate::optimize::{self, OptimizationConfig};

/// Sequences the nine request-pipeline stages and assembles the structured
/// result. Holds `Arc`-shared, trait-typed collaborators injected at
/// construction; no global singletons.
pub struct Orchestrator {
    config: Arc<GuardianConfig>,
    detector: Arc<Detector>,
    registry: Arc<ModelRegistry>,
    analyzer: ComplexityAnalyzer,
    cache_manager: Arc<CacheManager>,
    provider_client: Arc<ProviderClient>,
    audit_sink: Arc<AuditSink>,
}

impl Orchestrator {
    pub fn new(
        config: Arc<GuardianConfig>,
        detector: Arc<Detector>,
        registry: Arc<ModelRegistry>,
        cache_manager: Arc<CacheManager>,
        provider_client: Arc<ProviderClient>,
        audit_sink: Arc<AuditSink>,
    ) -> Self {
        Self {
            config,
            detector,
            registry,
            analyzer: ComplexityAnalyzer::new(),
            cache_manager,
            provider_client,
            audit_sink,
        }
    }

    /// Runs the full pipeline for one request. The invariant held throughout:
    /// the prompt passed to the provider client is always the redacted
    /// prompt; no original sensitive value crosses that boundary.
    pub async fn process(&self, request: CompletionRequestDto, cancellation: CancellationToken) -> CompletionResponseDto {
        let request_id = Uuid::new_v4();
        let stage_ctx = StageContext { request_id: request_id.to_string() };

        if let Err(message) = request.validate() {
            return CompletionResponseDto::failure(request_id, message);
        }

        match self.process_inner(request_id, &request, cancellation, &stage_ctx).await {
            Ok((text, metadata)) => CompletionResponseDto::success(request_id, text, metadata),
            Err(error) => {
                tracing::warn!(request_id = %request_id, error_type = error.error_type(), "request failed");
                CompletionResponseDto::failure(request_id, error.user_message())
            }
        }
    }

    async fn process_inner(
        &self,
        request_id: Uuid,
        request: &CompletionRequestDto,
        cancellation: CancellationToken,
        stage_ctx: &StageContext,
    ) -> Result<(String, CompletionMetadata), GuardianError> {
        let request_start = std::time::Instant::now();
        let mut sv_context = SvContext::new(request_id);

        // Stage 1-2: SV detect + redact.
        let span = MetricsSpan::start(GuardianStage::SvDetect, stage_ctx.clone());
        let enabled_kinds = self.enabled_kind_names();
        let detect_result = if self.config.pii.detection.enabled {
            self.detector.detect(&request.query, Some(&enabled_kinds))
        } else {
            sensitive::DetectResult { matches: Vec::new(), elapsed: std::time::Duration::ZERO }
        };
        span.with_field("matches", detect_result.matches.len().to_string()).record_success();

        let span = MetricsSpan::start(GuardianStage::SvRedact, stage_ctx.clone());
        let token_mode = match self.config.pii.redaction.token_generation {
            crate::config::TokenGenerationConfig::Random => TokenGenerationMode::Random,
            crate::config::TokenGenerationConfig::Sequential => TokenGenerationMode::Sequential,
        };
        let redacted_prompt = sensitive::redact(&request.query, &detect_result.matches, &mut sv_context, token_mode, self.config.pii.redaction.token_length);
        span.record_success();

        // Stage 3: prompt optimization, operating on the redacted prompt only.
        let span = MetricsSpan::start(GuardianStage::PromptOptimize, stage_ctx.clone());
        let optimization_config = OptimizationConfig {
            enabled: request.enable_optimization && self.config.optimization.enabled,
            min_prompt_length: self.config.optimization.min_prompt_length,
        };
        let protected_spans = sensitive::token_spans(&redacted_prompt);
        let optimization = optimize::optimize(&redacted_prompt, &optimization_config, &protected_spans);
        if optimization.applied {
            span.with_field("tokens_saved", optimization.tokens_saved.to_string()).record_success();
        } else {
            span.record_skipped();
        }
        let optimized_prompt = optimization.text.clone();

        // Stage 4: complexity scoring.
        let span = MetricsSpan::start(GuardianStage::ComplexityScore, stage_ctx.clone());
        let complexity = self.analyzer.analyze(&optimized_prompt);
        span.with_field("score", complexity.score.to_string()).record_success();

        // Stage 5: model routing.
        let span = MetricsSpan::start(GuardianStage::ModelRoute, stage_ctx.clone());
        let strategy = request.routing_strategy.unwrap_or(RoutingStrategy::Complexity);
        let router = ModelRouter::new(&self.registry);
        let decision = if let Some(requested_model) = &request.model {
            routing::ModelDecision {
                model_id: requested_model.clone(),
                strategy_used: strategy,
                rationale: "explicit model override".to_string(),
                complexity: complexity.clone(),
                routing_millis: 0,
            }
        } else {
            router.route(complexity.clone(), strategy)
        };
        span.with_field("model", decision.model_id.clone()).record_success();

        let profile = self
            .registry
            .get(&decision.model_id)
            .or_else(|| self.registry.fallback())
            .ok_or_else(|| GuardianError::Internal("no model profile available".to_string()))?
            .clone();

        // Stage 6: cache lookup.
        let cache_key_value = cache_key(&self.config.cache.l2.key_prefix, &optimized_prompt, &profile.model_id, None);
        let span = MetricsSpan::start(GuardianStage::CacheLookup, stage_ctx.clone());
        let cached = if request.enable_cache { self.cache_manager.get(&cache_key_value).await } else { None };
        let from_cache = cached.is_some();
        span.with_field("hit", from_cache.to_string()).record_success();

        let (response_text, input_tokens, output_tokens, estimated_cost) = if let Some(cached_text) = cached {
            (cached_text, 0u32, 0u32, 0.0)
        } else {
            // Stage 7: provider call.
            let span = MetricsSpan::start(GuardianStage::ProviderCall, stage_ctx.clone());
            let completion_request = CompletionRequest {
                model_id: &profile.model_id,
                prompt: &optimized_prompt,
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
                top_p: request.top_p,
                n: None,
                stop_sequences: None,
            };
            let rates = ModelRates { input_cost_per_1k: profile.input_cost_per_1k, output_cost_per_1k: profile.output_cost_per_1k };
            let result = self.provider_client.complete(completion_request, rates, &cancellation).await;
            match result {
                Ok(response) => {
                    span.record_success();
                    // Stage 8: cache store.
                    let span = MetricsSpan::start(GuardianStage::CacheStore, stage_ctx.clone());
                    if request.enable_cache {
                        self.cache_manager.put(&cache_key_value, &response.text).await;
                    }
                    span.record_success();
                    (response.text, response.input_tokens, response.output_tokens, response.estimated_cost)
                }
                Err(error) => {
                    span.record_failure();
                    return Err(GuardianError::from(error));
                }
            }
        };

        // Stage 9: SV restore.
        let span = MetricsSpan::start(GuardianStage::SvRestore, stage_ctx.clone());
        let restored_text = sensitive::restore(&response_text, &sv_context);
        span.record_success();

        // Stage 10: asynchronous audit submission.
        let span = MetricsSpan::start(GuardianStage::AuditSubmit, stage_ctx.clone());
        if self.config.pii.audit.enabled {
            self.submit_audit(&sv_context);
        }
        span.record_success();

        let metadata = CompletionMetadata {
            model_used: profile.model_id,
            complexity_level: format!("{:?}", complexity.level).to_lowercase(),
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            latency_ms: request_start.elapsed().as_millis() as u64,
            from_cache,
            optimization_applied: optimization.applied,
            tokens_saved: optimization.tokens_saved,
            reduction_percentage: optimization.reduction_percentage,
            pii_detected: !sv_context.is_empty(),
            pii_count: sv_context.detections().len(),
            estimated_cost,
        };

        Ok((restored_text, metadata))
    }

    /// Exposes cache statistics for the analytics surface; read-only.
    pub fn cache_stats(&self) -> cache::CacheStats {
        self.cache_manager.stats()
    }

    /// Exposes the registered model profiles for the analytics surface.
    pub fn model_profiles(&self) -> Vec<routing::ModelProfile> {
        self.registry.all().into_iter().cloned().collect()
    }

    pub async fn cache_health_check(&self) -> bool {
        self.cache_manager.health_check().await
    }

    pub async fn clear_cache(&self) {
        self.cache_manager.clear().await
    }

    /// Kind names currently enabled for detection, after configuration
    /// overrides. Exposed for the analytics surface.
    pub fn enabled_detection_kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.enabled_kind_names().into_iter().collect();
        kinds.sort();
        kinds
    }

    fn enabled_kind_names(&self) -> HashSet<String> {
        let mut set: HashSet<String> = sensitive::builtin_patterns().iter().map(|p| p.kind.token_name()).collect();
        for (kind, enabled) in &self.config.pii.detection.patterns {
            if *enabled {
                set.insert(kind.clone());
            } else {
                set.remove(kind);
            }
        }
        set
    }

    fn submit_audit(&self, sv_context: &SvContext) {
        let detailed = self.config.pii.audit.level == AuditLevelConfig::Detailed;
        let records: Vec<AuditRecord> = sv_context
            .detections()
            .iter()
            .map(|detection| {
                let (start, end) = if detailed { (detection.start, detection.end) } else { (None, None) };
                AuditRecord::redacted(
                    sv_context.request_id,
                    detection.kind.token_name(),
                    detection.token.clone(),
                    detection.original_length,
                    start.zip(end),
                    Utc::now(),
                )
            })
            .collect();
        self.audit_sink.submit(records);
    }
}
