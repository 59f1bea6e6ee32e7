use std::net::SocketAddr;
use std::time::Duration;

use llmguardian::GuardianConfig;
use serde::{Deserialize, Serialize};

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_timeout_seconds() -> u64 {
    30
}
fn default_max_body_bytes() -> usize {
    1024 * 1024
}
fn default_rate_limit_per_minute() -> u32 {
    60
}
fn default_version() -> String {
    "0.1.0".to_string()
}

/// HTTP-layer settings, loaded from a config file plus
/// `LLMGUARDIAN_SERVER__*` environment overrides. The pipeline's own
/// settings (`pii.*`, `cache.*`, `optimization.*`, `provider.*`) are loaded
/// as a nested `GuardianConfig` under the same namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: u32,
    #[serde(default)]
    pub api_keys: Vec<String>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub guardian: GuardianConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout_seconds(),
            max_body_bytes: default_max_body_bytes(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
            api_keys: Vec::new(),
            version: default_version(),
            guardian: GuardianConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Layers `config/default.toml` (if present), then a file named by
    /// `LLMGUARDIAN_CONFIG_FILE`, then `LLMGUARDIAN_SERVER__*`-prefixed
    /// environment variables (double-underscore separated, matching the
    /// dotted `llmguardian.*` keys). Falls back to a single demo API key
    /// when none are configured, so the demo binary and local smoke tests
    /// have something to authenticate with.
    pub fn load() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder()
            .set_default("host", default_host())?
            .set_default("port", default_port() as i64)?
            .set_default("timeoutSeconds", default_timeout_seconds() as i64)?
            .set_default("maxBodyBytes", default_max_body_bytes() as i64)?
            .set_default("rateLimitPerMinute", default_rate_limit_per_minute() as i64)?
            .set_default("version", default_version())?
            .add_source(config::File::with_name("config/default").required(false));

        if let Ok(path) = std::env::var("LLMGUARDIAN_CONFIG_FILE") {
            builder = builder.add_source(config::File::with_name(&path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("LLMGUARDIAN_SERVER")
                .separator("__")
                .try_parsing(true),
        );

        let mut settings: ServerConfig = builder.build()?.try_deserialize()?;

        if let Ok(api_key) = std::env::var("LLMGUARDIAN_PROVIDER_OPENAI_API_KEY") {
            settings.guardian.provider.openai.api_key = api_key;
        }

        if settings.api_keys.is_empty() {
            tracing::warn!("no API keys configured, falling back to a single demo key");
            settings.api_keys.push("demo-key".to_string());
        }

        Ok(settings)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
        assert!(config.api_keys.is_empty());
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig::default();
        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);
    }
}
