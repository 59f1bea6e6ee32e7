use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Capability ordering is `Basic < Standard < Advanced`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CapabilityTier {
    Basic,
    Standard,
    Advanced,
}

/// Immutable once registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelProfile {
    pub model_id: String,
    pub display_name: String,
    pub provider: String,
    pub input_cost_per_1k: f64,
    pub output_cost_per_1k: f64,
    pub max_context_tokens: u32,
    pub capability_tier: CapabilityTier,
    pub enabled: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no fallback model profile registered")]
    NoFallback,
}

/// Holds model profiles keyed by `model_id`, with O(1) lookup and a
/// designated fallback. Seeds a built-in profile table at construction and
/// remains open to registering more profiles from configuration.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    profiles: HashMap<String, ModelProfile>,
    fallback_id: String,
}

impl ModelRegistry {
    /// Seeds the registry with the three profiles the spec's own scenarios
    /// assume: gpt-4o-mini as the `standard` default, gpt-4o as `advanced`,
    /// gpt-3.5-turbo as `basic`/cheapest.
    pub fn with_defaults() -> Self {
        let mut registry = Self { profiles: HashMap::new(), fallback_id: "gpt-4o-mini".to_string() };
        registry.register(ModelProfile {
            model_id: "gpt-4o-mini".to_string(),
            display_name: "GPT-4o mini".to_string(),
            provider: "openai".to_string(),
            input_cost_per_1k: 0.00015,
            output_cost_per_1k: 0.0006,
            max_context_tokens: 128_000,
            capability_tier: CapabilityTier::Standard,
            enabled: true,
        });
        registry.register(ModelProfile {
            model_id: "gpt-4o".to_string(),
            display_name: "GPT-4o".to_string(),
            provider: "openai".to_string(),
            input_cost_per_1k: 0.0025,
            output_cost_per_1k: 0.01,
            max_context_tokens: 128_000,
            capability_tier: CapabilityTier::Advanced,
            enabled: true,
        });
        registry.register(ModelProfile {
            model_id: "gpt-3.5-turbo".to_string(),
            display_name: "GPT-3.5 Turbo".to_string(),
            provider: "openai".to_string(),
            input_cost_per_1k: 0.0005,
            output_cost_per_1k: 0.0015,
            max_context_tokens: 16_385,
            capability_tier: CapabilityTier::Basic,
            enabled: true,
        });
        registry
    }

    pub fn register(&mut self, profile: ModelProfile) {
        self.profiles.insert(profile.model_id.clone(), profile);
    }

    pub fn get(&self, model_id: &str) -> Option<&ModelProfile> {
        self.profiles.get(model_id)
    }

    pub fn fallback(&self) -> Option<&ModelProfile> {
        self.profiles.get(&self.fallback_id)
    }

    pub fn set_fallback(&mut self, model_id: impl Into<String>) {
        self.fallback_id = model_id.into();
    }

    pub fn cheapest(&self) -> Option<&ModelProfile> {
        self.profiles
            .values()
            .filter(|p| p.enabled)
            .min_by(|a, b| a.input_cost_per_1k.total_cmp(&b.input_cost_per_1k))
    }

    pub fn most_capable(&self) -> Option<&ModelProfile> {
        self.profiles
            .values()
            .filter(|p| p.enabled)
            .max_by_key(|p| p.capability_tier)
    }

    pub fn standard_default(&self) -> Option<&ModelProfile> {
        self.profiles
            .values()
            .find(|p| p.enabled && p.capability_tier == CapabilityTier::Standard)
            .or_else(|| self.fallback())
    }

    pub fn cheapest_that_handles(&self, min_tier: CapabilityTier) -> Option<&ModelProfile> {
        self.profiles
            .values()
            .filter(|p| p.enabled && p.capability_tier >= min_tier)
            .min_by(|a, b| a.input_cost_per_1k.total_cmp(&b.input_cost_per_1k))
    }

    pub fn all(&self) -> Vec<&ModelProfile> {
        self.profiles.values().collect()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_seed_expected_profiles() {
        let registry = ModelRegistry::with_defaults();
        assert!(registry.get("gpt-4o-mini").is_some());
        assert!(registry.get("gpt-4o").is_some());
        assert!(registry.get("gpt-3.5-turbo").is_some());
    }

    #[test]
    fn cheapest_and_most_capable_are_distinct() {
        let registry = ModelRegistry::with_defaults();
        assert_eq!(registry.cheapest().unwrap().model_id, "gpt-3.5-turbo");
        assert_eq!(registry.most_capable().unwrap().model_id, "gpt-4o");
    }

    #[test]
    fn fallback_returns_registered_default() {
        let registry = ModelRegistry::with_defaults();
        assert_eq!(registry.fallback().unwrap().model_id, "gpt-4o-mini");
    }

    #[test]
    fn disabled_profiles_are_excluded_from_queries() {
        let mut registry = ModelRegistry::with_defaults();
        registry.register(ModelProfile {
            model_id: "gpt-3.5-turbo".to_string(),
            display_name: "GPT-3.5 Turbo".to_string(),
            provider: "openai".to_string(),
            input_cost_per_1k: 0.0005,
            output_cost_per_1k: 0.0015,
            max_context_tokens: 16_385,
            capability_tier: CapabilityTier::Basic,
            enabled: false,
        });
        assert_ne!(registry.cheapest().unwrap().model_id, "gpt-3.5-turbo");
    }
}
