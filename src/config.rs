use std::collections::HashMap;

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPatternConfig {
    pub name: String,
    pub regex: String,
    pub region: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PiiDetectionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub patterns: HashMap<String, bool>,
    #[serde(default)]
    pub custom_patterns: Vec<CustomPatternConfig>,
}

impl Default for PiiDetectionConfig {
    fn default() -> Self {
        Self { enabled: true, patterns: HashMap::new(), custom_patterns: Vec::new() }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenGenerationConfig {
    Random,
    Sequential,
}

impl Default for TokenGenerationConfig {
    fn default() -> Self {
        TokenGenerationConfig::Random
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PiiRedactionConfig {
    #[serde(default)]
    pub token_generation: TokenGenerationConfig,
    #[serde(default = "default_token_length")]
    pub token_length: usize,
}

fn default_token_length() -> usize {
    6
}

impl Default for PiiRedactionConfig {
    fn default() -> Self {
        Self { token_generation: TokenGenerationConfig::default(), token_length: default_token_length() }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevelConfig {
    Basic,
    Detailed,
}

impl Default for AuditLevelConfig {
    fn default() -> Self {
        AuditLevelConfig::Basic
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PiiAuditConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub level: AuditLevelConfig,
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

fn default_retention_days() -> i64 {
    30
}

impl Default for PiiAuditConfig {
    fn default() -> Self {
        Self { enabled: true, level: AuditLevelConfig::default(), retention_days: default_retention_days() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PiiConfig {
    #[serde(default)]
    pub detection: PiiDetectionConfig,
    #[serde(default)]
    pub redaction: PiiRedactionConfig,
    #[serde(default)]
    pub audit: PiiAuditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheL1Config {
    #[serde(default = "default_l1_max_size")]
    pub max_size: usize,
    #[serde(default = "default_l1_ttl_minutes")]
    pub ttl_minutes: u64,
}

fn default_l1_max_size() -> usize {
    1000
}
fn default_l1_ttl_minutes() -> u64 {
    60
}

impl Default for CacheL1Config {
    fn default() -> Self {
        Self { max_size: default_l1_max_size(), ttl_minutes: default_l1_ttl_minutes() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheL2Config {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_l2_ttl_minutes")]
    pub ttl_minutes: u64,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_l2_ttl_minutes() -> u64 {
    24 * 60
}
fn default_key_prefix() -> String {
    "llmg".to_string()
}

impl Default for CacheL2Config {
    fn default() -> Self {
        Self { enabled: false, ttl_minutes: default_l2_ttl_minutes(), key_prefix: default_key_prefix() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    #[serde(default)]
    pub l1: CacheL1Config,
    #[serde(default)]
    pub l2: CacheL2Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationConfigSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_min_prompt_length")]
    pub min_prompt_length: usize,
    #[serde(default = "default_target_reduction")]
    pub target_reduction: f64,
}

fn default_min_prompt_length() -> usize {
    50
}
fn default_target_reduction() -> f64 {
    0.15
}

impl Default for OptimizationConfigSection {
    fn default() -> Self {
        Self { enabled: true, min_prompt_length: default_min_prompt_length(), target_reduction: default_target_reduction() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOpenAiConfig {
    /// Sourced from an environment variable at load time; never read from a
    /// committed config file.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_model")]
    pub default_model: String,
}

fn default_timeout_seconds() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    500
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for ProviderOpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            timeout_seconds: default_timeout_seconds(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            default_model: default_model(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default)]
    pub openai: ProviderOpenAiConfig,
}

/// The core pipeline's complete configuration surface, namespaced
/// `llmguardian.*`. Loaded once at startup by `crates/server` and passed in;
/// never read from a global.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardianConfig {
    #[serde(default)]
    pub pii: PiiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub optimization: OptimizationConfigSection,
    #[serde(default)]
    pub provider: ProviderConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_documented_values() {
        let config = GuardianConfig::default();
        assert_eq!(config.cache.l1.max_size, 1000);
        assert_eq!(config.cache.l1.ttl_minutes, 60);
        assert_eq!(config.cache.l2.ttl_minutes, 24 * 60);
        assert!(!config.cache.l2.enabled);
        assert_eq!(config.pii.redaction.token_length, 6);
        assert_eq!(config.provider.openai.max_retries, 3);
        assert_eq!(config.optimization.min_prompt_length, 50);
    }
}
