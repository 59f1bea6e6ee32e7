use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::complexity::{ComplexityLevel, ComplexityScore};
use crate::registry::{CapabilityTier, ModelRegistry};

/// Closed set of routing strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingStrategy {
    Complexity,
    Cost,
    Performance,
    Balanced,
}

impl Default for RoutingStrategy {
    fn default() -> Self {
        RoutingStrategy::Complexity
    }
}

/// The outcome of applying a routing strategy to a complexity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDecision {
    pub model_id: String,
    pub strategy_used: RoutingStrategy,
    pub rationale: String,
    pub complexity: ComplexityScore,
    pub routing_millis: u64,
}

/// Applies a routing strategy over a complexity score and the registry's
/// model profiles; falls back to the registry's fallback profile if the
/// selected profile is absent or disabled.
pub struct ModelRouter<'a> {
    registry: &'a ModelRegistry,
}

impl<'a> ModelRouter<'a> {
    pub fn new(registry: &'a ModelRegistry) -> Self {
        Self { registry }
    }

    pub fn route(&self, complexity: ComplexityScore, strategy: RoutingStrategy) -> ModelDecision {
        let start = Instant::now();
        let (model_id, rationale) = self.select(complexity.level, complexity.score, strategy);
        ModelDecision {
            model_id,
            strategy_used: strategy,
            rationale,
            complexity,
            routing_millis: start.elapsed().as_millis() as u64,
        }
    }

    fn select(&self, level: ComplexityLevel, score: u32, strategy: RoutingStrategy) -> (String, String) {
        let chosen = match (strategy, level) {
            (RoutingStrategy::Complexity, ComplexityLevel::Simple | ComplexityLevel::Medium) => {
                ("standard default", self.registry.standard_default())
            }
            (RoutingStrategy::Complexity, ComplexityLevel::Complex) => {
                ("most-capable", self.registry.most_capable())
            }
            (RoutingStrategy::Cost, _) => ("cheapest", self.registry.cheapest()),
            (RoutingStrategy::Performance, _) => ("most-capable", self.registry.most_capable()),
            (RoutingStrategy::Balanced, ComplexityLevel::Simple) => ("cheapest", self.registry.cheapest()),
            (RoutingStrategy::Balanced, ComplexityLevel::Medium) => {
                ("standard default", self.registry.standard_default())
            }
            (RoutingStrategy::Balanced, ComplexityLevel::Complex) => {
                if score >= 75 {
                    ("most-capable (score >= 75)", self.registry.most_capable())
                } else {
                    ("standard default (score < 75)", self.registry.standard_default())
                }
            }
        };

        let (label, profile) = chosen;
        match profile.filter(|p| p.enabled) {
            Some(p) => (p.model_id.clone(), format!("{strategy:?}/{level:?}: {label}")),
            None => {
                let fallback = self.registry.fallback();
                let model_id = fallback.map(|p| p.model_id.clone()).unwrap_or_else(|| "unknown".to_string());
                (model_id, format!("{strategy:?}/{level:?}: {label} unavailable, used fallback"))
            }
        }
    }

    /// Used by the `cheapest that can handle level` registry query surfaced
    /// through capability tiers rather than a routing strategy.
    pub fn cheapest_for_tier(&self, tier: CapabilityTier) -> Option<String> {
        self.registry.cheapest_that_handles(tier).map(|p| p.model_id.clone())
    }
}
