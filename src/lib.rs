//! A guarded gateway between client applications and a remote LLM completion
//! endpoint. For each request it detects and reversibly tokenizes sensitive
//! values, optimizes and routes the prompt, checks a two-tier cache, calls
//! the provider with retries, de-tokenizes the response, and asynchronously
//! audits what it redacted — all without the original sensitive value ever
//! leaving the process.

pub mod config;
pub mod dto;
pub mod error;
pub mod metrics;
pub mod optimize;
pub mod orchestrator;

pub use config::GuardianConfig;
pub use dto::{CompletionMetadata, CompletionRequestDto, CompletionResponseDto};
pub use error::GuardianError;
pub use metrics::{
    guardian_logger, guardian_metrics, set_guardian_logger, set_guardian_metrics, GuardianEvent,
    GuardianEventLogger, GuardianEventStatus, GuardianMetrics, GuardianStage, KeyValueLogger,
    MetricsSpan, StageContext,
};
pub use orchestrator::Orchestrator;

pub use provider::CancellationToken;
