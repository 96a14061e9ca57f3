//! Composite risk scoring

pub mod severity;

pub use severity::{
    ChangeSummary, HeuristicStrategy, LlmStrategy, ModelVerdict, SeverityModel, SeverityStrategy,
};

use crate::config::{RiskBands, RiskWeights};
use crate::core::{ChangeSet, ImpactEntry, RiskComponents, RiskScore, RiskTier, SeverityResult};

/// Combines churn, propagation depth, core-service criticality, and the
/// severity signal into one composite score and tier.
pub struct RiskScorer {
    weights: RiskWeights,
    bands: RiskBands,
}

impl RiskScorer {
    pub fn new(weights: RiskWeights, bands: RiskBands) -> Self {
        Self { weights, bands }
    }

    /// Score a change set against its impact and severity signal
    ///
    /// The core multiplier applies to the pre-clamp composite, so a high
    /// base score can saturate at 1.0/CRITICAL; that escalation is intended.
    pub fn score(
        &self,
        changes: &ChangeSet,
        impact: &[ImpactEntry],
        severity: &SeverityResult,
    ) -> RiskScore {
        let churn = saturate(changes.total_churn() as f64, self.weights.churn_saturation);
        let max_depth = impact.iter().map(|e| e.depth).max().unwrap_or(0);
        let depth = saturate(max_depth as f64, self.weights.depth_saturation);

        let touches_core = impact.iter().any(|e| e.module.is_core_service);
        let core_multiplier = if touches_core {
            self.weights.core_multiplier
        } else {
            1.0
        };

        let base = self.weights.churn_weight * churn
            + self.weights.depth_weight * depth
            + self.weights.severity_weight * severity.score;
        let value = (base * core_multiplier).clamp(0.0, 1.0);

        RiskScore {
            value,
            tier: self.tier_for(value),
            components: RiskComponents {
                churn,
                depth,
                core_multiplier,
                severity: severity.score,
            },
        }
    }

    /// Band lookup with the closed-upper convention: a boundary value
    /// resolves to the higher tier.
    pub fn tier_for(&self, value: f64) -> RiskTier {
        if value >= self.bands.critical {
            RiskTier::Critical
        } else if value >= self.bands.high {
            RiskTier::High
        } else if value >= self.bands.medium {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }
}

fn saturate(value: f64, scale: f64) -> f64 {
    1.0 - (-value / scale).exp()
}
