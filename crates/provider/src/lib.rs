//! Retryable outbound calls to an OpenAI-compatible chat-completions
//! provider, with local validation, error classification, and exponential
//! backoff with jitter.

mod client;
mod error;
mod retry;

pub use client::{CompletionRequest, FinishReason, ModelRates, ProviderClient, ProviderResponse};
pub use error::{ProviderError, ProviderErrorKind};
pub use retry::{backoff_sleep, run_with_retry, RetryPolicy, SleepOutcome};

pub use tokio_util::sync::CancellationToken;
