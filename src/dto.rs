use chrono::{DateTime, Utc};
use routing::RoutingStrategy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_max_tokens() -> u32 {
    1000
}

fn default_true() -> bool {
    true
}

/// `POST /completions` request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequestDto {
    pub query: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub model: Option<String>,
    pub routing_strategy: Option<RoutingStrategy>,
    #[serde(default = "default_true")]
    pub enable_optimization: bool,
    #[serde(default = "default_true")]
    pub enable_cache: bool,
}

impl CompletionRequestDto {
    /// Local validation ahead of orchestration: empty query, or
    /// `maxTokens`/`temperature`/`topP` out of their documented ranges.
    pub fn validate(&self) -> Result<(), String> {
        if self.query.trim().is_empty() {
            return Err("query must not be empty".to_string());
        }
        if self.max_tokens == 0 || self.max_tokens > 4096 {
            return Err("maxTokens must be in [1, 4096]".to_string());
        }
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err("temperature must be in [0, 2]".to_string());
            }
        }
        if let Some(top_p) = self.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err("topP must be in [0, 1]".to_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompletionMetadata {
    pub model_used: String,
    pub complexity_level: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
    pub latency_ms: u64,
    pub from_cache: bool,
    pub optimization_applied: bool,
    pub tokens_saved: u32,
    pub reduction_percentage: f64,
    pub pii_detected: bool,
    pub pii_count: usize,
    pub estimated_cost: f64,
}

/// `POST /completions` response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponseDto {
    pub request_id: Uuid,
    pub text: Option<String>,
    pub success: bool,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub metadata: Option<CompletionMetadata>,
}

impl CompletionResponseDto {
    pub fn failure(request_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            request_id,
            text: None,
            success: false,
            error: Some(error.into()),
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    pub fn success(request_id: Uuid, text: String, metadata: CompletionMetadata) -> Self {
        Self {
            request_id,
            text: Some(text),
            success: true,
            error: None,
            timestamp: Utc::now(),
            metadata: Some(metadata),
        }
    }
}
