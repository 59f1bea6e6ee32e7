//! Per-stage instrumentation, mirrored on the pipeline's own dual
//! metrics/event-logging pattern: a `GuardianMetrics` trait for
//! counters/histograms and a `GuardianEventLogger` trait for structured
//! per-stage events. Both are optional and installable globally; when unset
//! they are no-ops.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::Instant;

use chrono::{DateTime, Utc};

/// The nine stages the orchestrator sequences, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardianStage {
    SvDetect,
    SvRedact,
    PromptOptimize,
    ComplexityScore,
    ModelRoute,
    CacheLookup,
    ProviderCall,
    CacheStore,
    SvRestore,
    AuditSubmit,
}

impl fmt::Display for GuardianStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GuardianStage::SvDetect => "sv_detect",
            GuardianStage::SvRedact => "sv_redact",
            GuardianStage::PromptOptimize => "prompt_optimize",
            GuardianStage::ComplexityScore => "complexity_score",
            GuardianStage::ModelRoute => "model_route",
            GuardianStage::CacheLookup => "cache_lookup",
            GuardianStage::ProviderCall => "provider_call",
            GuardianStage::CacheStore => "cache_store",
            GuardianStage::SvRestore => "sv_restore",
            GuardianStage::AuditSubmit => "audit_submit",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardianEventStatus {
    Started,
    Completed,
    Failed,
    Skipped,
}

impl fmt::Display for GuardianEventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GuardianEventStatus::Started => "started",
            GuardianEventStatus::Completed => "completed",
            GuardianEventStatus::Failed => "failed",
            GuardianEventStatus::Skipped => "skipped",
        };
        write!(f, "{name}")
    }
}

/// One structured per-stage event.
#[derive(Debug, Clone)]
pub struct GuardianEvent {
    pub stage: GuardianStage,
    pub status: GuardianEventStatus,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub duration_millis: Option<u64>,
    pub fields: Vec<(String, String)>,
}

impl GuardianEvent {
    /// Renders as `key=value` pairs in a stable order, escaping embedded
    /// quotes/spaces the way the teacher's key-value logger does.
    pub fn format_key_values(&self) -> String {
        let mut parts = vec![
            format!("stage={}", self.stage),
            format!("status={}", self.status),
            format!("request_id={}", self.request_id),
        ];
        if let Some(duration) = self.duration_millis {
            parts.push(format!("duration_ms={duration}"));
        }
        for (key, value) in &self.fields {
            parts.push(format!("{key}={}", escape_kv(value)));
        }
        parts.join(" ")
    }
}

fn escape_kv(value: &str) -> String {
    if value.contains(' ') || value.contains('"') {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

pub trait GuardianMetrics: Send + Sync {
    fn record_stage_duration(&self, stage: GuardianStage, millis: u64);
    fn record_cache_hit(&self, tier: &str);
    fn record_cache_miss(&self, tier: &str);
    fn record_pii_detected(&self, kind: &str);
    fn record_provider_attempt(&self, model_id: &str, succeeded: bool);
    fn record_audit_dropped(&self, batch_size: usize);
}

pub trait GuardianEventLogger: Send + Sync {
    fn log(&self, event: &GuardianEvent);
}

/// Writes events as key-value lines to stdout or a custom writer.
pub struct KeyValueLogger<W: Write + Send + Sync> {
    writer: std::sync::Mutex<W>,
    with_timestamps: bool,
}

impl KeyValueLogger<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self { writer: std::sync::Mutex::new(std::io::stdout()), with_timestamps: true }
    }
}

impl<W: Write + Send + Sync> KeyValueLogger<W> {
    pub fn with_writer(writer: W) -> Self {
        Self { writer: std::sync::Mutex::new(writer), with_timestamps: true }
    }

    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.with_timestamps = enabled;
        self
    }
}

impl<W: Write + Send + Sync> GuardianEventLogger for KeyValueLogger<W> {
    fn log(&self, event: &GuardianEvent) {
        let mut writer = self.writer.lock().unwrap();
        let line = if self.with_timestamps {
            format!("{} {}\n", event.timestamp.to_rfc3339(), event.format_key_values())
        } else {
            format!("{}\n", event.format_key_values())
        };
        let _ = writer.write_all(line.as_bytes());
    }
}

static GLOBAL_METRICS: OnceLock<RwLock<Option<Arc<dyn GuardianMetrics>>>> = OnceLock::new();
static GLOBAL_LOGGER: OnceLock<RwLock<Option<Arc<dyn GuardianEventLogger>>>> = OnceLock::new();

fn metrics_slot() -> &'static RwLock<Option<Arc<dyn GuardianMetrics>>> {
    GLOBAL_METRICS.get_or_init(|| RwLock::new(None))
}

fn logger_slot() -> &'static RwLock<Option<Arc<dyn GuardianEventLogger>>> {
    GLOBAL_LOGGER.get_or_init(|| RwLock::new(None))
}

pub fn set_guardian_metrics(metrics: Arc<dyn GuardianMetrics>) {
    *metrics_slot().write().unwrap() = Some(metrics);
}

pub fn set_guardian_logger(logger: Arc<dyn GuardianEventLogger>) {
    *logger_slot().write().unwrap() = Some(logger);
}

pub fn guardian_metrics() -> Option<Arc<dyn GuardianMetrics>> {
    metrics_slot().read().unwrap().clone()
}

pub fn guardian_logger() -> Option<Arc<dyn GuardianEventLogger>> {
    logger_slot().read().unwrap().clone()
}

/// Per-request carrier threaded through the orchestrator so every
/// `MetricsSpan` can tag its event with the same `request_id`.
#[derive(Debug, Clone)]
pub struct StageContext {
    pub request_id: String,
}

/// Times a single stage and emits a start/completion event pair, consuming
/// `self` at each terminal call so a span can only be closed once.
pub struct MetricsSpan {
    stage: GuardianStage,
    context: StageContext,
    started_at: Instant,
    fields: Vec<(String, String)>,
}

impl MetricsSpan {
    pub fn start(stage: GuardianStage, context: StageContext) -> Self {
        if let Some(logger) = guardian_logger() {
            logger.log(&GuardianEvent {
                stage,
                status: GuardianEventStatus::Started,
                request_id: context.request_id.clone(),
                timestamp: Utc::now(),
                duration_millis: None,
                fields: Vec::new(),
            });
        }
        Self { stage, context, started_at: Instant::now(), fields: Vec::new() }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    fn finish(self, status: GuardianEventStatus) -> u64 {
        let millis = self.started_at.elapsed().as_millis() as u64;
        if let Some(metrics) = guardian_metrics() {
            metrics.record_stage_duration(self.stage, millis);
        }
        if let Some(logger) = guardian_logger() {
            logger.log(&GuardianEvent {
                stage: self.stage,
                status,
                request_id: self.context.request_id,
                timestamp: Utc::now(),
                duration_millis: Some(millis),
                fields: self.fields,
            });
        }
        millis
    }

    pub fn record_success(self) -> u64 {
        self.finish(GuardianEventStatus::Completed)
    }

    pub fn record_failure(self) -> u64 {
        self.finish(GuardianEventStatus::Failed)
    }

    pub fn record_skipped(self) -> u64 {
        self.finish(GuardianEventStatus::Skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct CountingMetrics {
        stage_durations: AtomicU64,
        cache_hits: AtomicU64,
    }

    impl GuardianMetrics for CountingMetrics {
        fn record_stage_duration(&self, _stage: GuardianStage, _millis: u64) {
            self.stage_durations.fetch_add(1, Ordering::SeqCst);
        }
        fn record_cache_hit(&self, _tier: &str) {
            self.cache_hits.fetch_add(1, Ordering::SeqCst);
        }
        fn record_cache_miss(&self, _tier: &str) {}
        fn record_pii_detected(&self, _kind: &str) {}
        fn record_provider_attempt(&self, _model_id: &str, _succeeded: bool) {}
        fn record_audit_dropped(&self, _batch_size: usize) {}
    }

    #[derive(Default)]
    struct RecordingLogger {
        events: StdMutex<Vec<String>>,
    }

    impl GuardianEventLogger for RecordingLogger {
        fn log(&self, event: &GuardianEvent) {
            self.events.lock().unwrap().push(event.format_key_values());
        }
    }

    #[test]
    fn metrics_span_records_duration_and_two_log_events() {
        let metrics = Arc::new(CountingMetrics::default());
        let logger = Arc::new(RecordingLogger::default());
        set_guardian_metrics(metrics.clone());
        set_guardian_logger(logger.clone());

        let span = MetricsSpan::start(GuardianStage::SvDetect, StageContext { request_id: "r1".to_string() });
        span.with_field("matches", "2").record_success();

        assert_eq!(metrics.stage_durations.load(Ordering::SeqCst), 1);
        assert_eq!(logger.events.lock().unwrap().len(), 2);
    }

    #[test]
    fn event_key_value_formatting_escapes_spaces() {
        let event = GuardianEvent {
            stage: GuardianStage::ProviderCall,
            status: GuardianEventStatus::Failed,
            request_id: "r2".to_string(),
            timestamp: Utc::now(),
            duration_millis: Some(12),
            fields: vec![("message".to_string(), "rate limited".to_string())],
        };
        assert!(event.format_key_values().contains("message=\"rate limited\""));
    }
}
