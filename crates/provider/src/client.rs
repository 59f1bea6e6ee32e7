use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{ProviderError, ProviderErrorKind};
use crate::retry::{run_with_retry, RetryPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub text: String,
    pub model_id: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub latency_millis: u64,
    pub finish_reason: FinishReason,
    pub estimated_cost: f64,
    pub timestamp: DateTime<Utc>,
}

/// Per-1k token rates used for cost estimation; informational only, never
/// gates success.
#[derive(Debug, Clone, Copy)]
pub struct ModelRates {
    pub input_cost_per_1k: f64,
    pub output_cost_per_1k: f64,
}

pub struct CompletionRequest<'a> {
    pub model_id: &'a str,
    pub prompt: &'a str,
    pub max_output_tokens: u32,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub n: Option<u32>,
    pub stop_sequences: Option<&'a [String]>,
}

/// Outbound OpenAI-compatible chat-completions client with retry, timeout,
/// and error classification.
pub struct ProviderClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    supported_models: Vec<String>,
    retry_policy: RetryPolicy,
    per_attempt_timeout: Duration,
}

impl ProviderClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, supported_models: Vec<String>, retry_policy: RetryPolicy, per_attempt_timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            supported_models,
            retry_policy,
            per_attempt_timeout,
        }
    }

    pub async fn complete(&self, request: CompletionRequest<'_>, rates: ModelRates, token: &CancellationToken) -> Result<ProviderResponse, ProviderError> {
        if !self.supported_models.iter().any(|m| m == request.model_id) {
            return Err(ProviderError::new(ProviderErrorKind::InvalidRequest, format!("model '{}' is not supported by this provider", request.model_id)));
        }
        if request.prompt.trim().is_empty() {
            return Err(ProviderError::new(ProviderErrorKind::InvalidRequest, "prompt must not be empty"));
        }
        if request.max_output_tokens == 0 {
            return Err(ProviderError::new(ProviderErrorKind::InvalidRequest, "max_output_tokens must be > 0"));
        }

        run_with_retry(&self.retry_policy, token, |_attempt| self.attempt_once(&request, rates)).await
    }

    async fn attempt_once(&self, request: &CompletionRequest<'_>, rates: ModelRates) -> Result<ProviderResponse, ProviderError> {
        let start = Instant::now();
        let body = serde_json::json!({
            "model": request.model_id,
            "messages": [{"role": "user", "content": request.prompt}],
            "max_tokens": request.max_output_tokens,
            "temperature": request.temperature,
            "top_p": request.top_p,
            "n": request.n,
            "stop": request.stop_sequences,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(self.per_attempt_timeout)
            .send()
            .await
            .map_err(ProviderError::from)?;

        let status = response.status();
        if !status.is_success() {
            let kind = ProviderErrorKind::from_status(status.as_u16());
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(ProviderError::new(kind, message));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(ProviderError::from)?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::new(ProviderErrorKind::ServerError, "provider returned no choices"))?;

        let input_tokens = parsed.usage.prompt_tokens;
        let output_tokens = parsed.usage.completion_tokens;
        let estimated_cost = (input_tokens as f64 / 1000.0) * rates.input_cost_per_1k
            + (output_tokens as f64 / 1000.0) * rates.output_cost_per_1k;

        Ok(ProviderResponse {
            text: choice.message.content,
            model_id: request.model_id.to_string(),
            input_tokens,
            output_tokens,
            latency_millis: start.elapsed().as_millis() as u64,
            finish_reason: parse_finish_reason(&choice.finish_reason),
            estimated_cost,
            timestamp: Utc::now(),
        })
    }
}

fn parse_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "stop" => FinishReason::Stop,
        "length" => FinishReason::Length,
        "content_filter" => FinishReason::ContentFilter,
        _ => FinishReason::Other,
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: ChatUsage,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: String,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ProviderClient {
        ProviderClient::new(
            "https://api.openai.invalid/v1",
            "sk-test",
            vec!["gpt-4o-mini".to_string()],
            RetryPolicy::default(),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn rejects_unsupported_model_locally() {
        let client = client();
        let token = CancellationToken::new();
        let request = CompletionRequest {
            model_id: "not-a-model",
            prompt: "hello",
            max_output_tokens: 100,
            temperature: None,
            top_p: None,
            n: None,
            stop_sequences: None,
        };
        let result = client.complete(request, ModelRates { input_cost_per_1k: 0.0, output_cost_per_1k: 0.0 }, &token).await;
        assert_eq!(result.unwrap_err().kind, ProviderErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn rejects_empty_prompt_locally() {
        let client = client();
        let token = CancellationToken::new();
        let request = CompletionRequest {
            model_id: "gpt-4o-mini",
            prompt: "   ",
            max_output_tokens: 100,
            temperature: None,
            top_p: None,
            n: None,
            stop_sequences: None,
        };
        let result = client.complete(request, ModelRates { input_cost_per_1k: 0.0, output_cost_per_1k: 0.0 }, &token).await;
        assert_eq!(result.unwrap_err().kind, ProviderErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn rejects_zero_max_output_tokens_locally() {
        let client = client();
        let token = CancellationToken::new();
        let request = CompletionRequest {
            model_id: "gpt-4o-mini",
            prompt: "hello",
            max_output_tokens: 0,
            temperature: None,
            top_p: None,
            n: None,
            stop_sequences: None,
        };
        let result = client.complete(request, ModelRates { input_cost_per_1k: 0.0, output_cost_per_1k: 0.0 }, &token).await;
        assert_eq!(result.unwrap_err().kind, ProviderErrorKind::InvalidRequest);
    }
}
