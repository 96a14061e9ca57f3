//! Severity estimation: LLM strategy with a deterministic heuristic fallback

use crate::config::SeverityConfig;
use crate::core::{ChangeSet, ImpactEntry, SeverityResult, SeveritySource};
use crossbeam::channel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Most files listed in a model prompt before the list is truncated
const MAX_SUMMARY_FILES: usize = 50;

/// Bounded-size structured summary sent to the severity model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub files: Vec<String>,
    pub truncated_files: usize,
    pub total_churn: usize,
    pub impacted_modules: usize,
    /// Count of impacted modules per propagation depth
    pub depth_histogram: BTreeMap<usize, usize>,
}

impl ChangeSummary {
    pub fn new(changes: &ChangeSet, impact: &[ImpactEntry]) -> Self {
        let mut files: Vec<String> = changes.paths().map(str::to_string).collect();
        let truncated_files = files.len().saturating_sub(MAX_SUMMARY_FILES);
        files.truncate(MAX_SUMMARY_FILES);

        let mut depth_histogram = BTreeMap::new();
        for entry in impact {
            *depth_histogram.entry(entry.depth).or_insert(0) += 1;
        }

        Self {
            files,
            truncated_files,
            total_churn: changes.total_churn(),
            impacted_modules: impact.len(),
            depth_histogram,
        }
    }
}

/// Verdict returned by an external severity model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVerdict {
    pub severity: f64,
    pub rationale: String,
}

/// External severity-model collaborator
///
/// Any error is uniformly treated as "unavailable" and absorbed into the
/// heuristic fallback; it never surfaces to the caller.
pub trait SeverityModel: Send + Sync + 'static {
    fn assess(&self, summary: &ChangeSummary) -> anyhow::Result<ModelVerdict>;
}

/// Strategy selected by configuration and model availability
///
/// Callers only observe which variant ran through `SeverityResult::source`;
/// risk scoring is identical either way.
pub enum SeverityStrategy {
    Llm(LlmStrategy),
    Heuristic(HeuristicStrategy),
}

impl SeverityStrategy {
    pub fn heuristic(config: &SeverityConfig) -> Self {
        Self::Heuristic(HeuristicStrategy::new(config))
    }

    pub fn llm(config: &SeverityConfig, model: Arc<dyn SeverityModel>) -> Self {
        Self::Llm(LlmStrategy {
            model,
            timeout: Duration::from_secs(config.timeout_secs),
            fallback: HeuristicStrategy::new(config),
        })
    }

    /// Produce exactly one severity result for the analysis
    pub fn estimate(&self, summary: &ChangeSummary) -> SeverityResult {
        match self {
            Self::Heuristic(strategy) => strategy.estimate(summary),
            Self::Llm(strategy) => strategy.estimate(summary),
        }
    }
}

/// Calls the external model on a worker thread under a timeout
pub struct LlmStrategy {
    model: Arc<dyn SeverityModel>,
    timeout: Duration,
    fallback: HeuristicStrategy,
}

impl LlmStrategy {
    fn estimate(&self, summary: &ChangeSummary) -> SeverityResult {
        match self.call_with_timeout(summary) {
            Ok(verdict) if (0.0..=1.0).contains(&verdict.severity) => SeverityResult {
                source: SeveritySource::Llm,
                score: verdict.severity,
                rationale: verdict.rationale,
            },
            Ok(verdict) => {
                log::warn!(
                    "Severity model returned out-of-range score {}, using heuristic",
                    verdict.severity
                );
                self.fallback.estimate(summary)
            }
            Err(reason) => {
                log::warn!("Severity model unavailable ({reason}), using heuristic");
                self.fallback.estimate(summary)
            }
        }
    }

    /// Timeout or a dropped sender both count as unavailable; the abandoned
    /// worker finishes in the background and its result is discarded.
    fn call_with_timeout(&self, summary: &ChangeSummary) -> Result<ModelVerdict, String> {
        let (tx, rx) = channel::bounded(1);
        let model = Arc::clone(&self.model);
        let summary = summary.clone();
        std::thread::spawn(move || {
            let _ = tx.send(model.assess(&summary));
        });

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(verdict)) => Ok(verdict),
            Ok(Err(e)) => Err(e.to_string()),
            Err(channel::RecvTimeoutError::Timeout) => {
                Err(format!("timed out after {:?}", self.timeout))
            }
            Err(channel::RecvTimeoutError::Disconnected) => Err("model worker died".to_string()),
        }
    }
}

/// Pure severity estimate from churn and impact breadth
///
/// Same inputs always give the same score, keeping the engine reproducible
/// when no model is configured or reachable.
pub struct HeuristicStrategy {
    churn_weight: f64,
    impact_weight: f64,
    churn_scale: f64,
    impact_scale: f64,
}

impl HeuristicStrategy {
    pub fn new(config: &SeverityConfig) -> Self {
        Self {
            churn_weight: config.churn_weight,
            impact_weight: config.impact_weight,
            churn_scale: config.churn_scale,
            impact_scale: config.impact_scale,
        }
    }

    pub fn estimate(&self, summary: &ChangeSummary) -> SeverityResult {
        let churn_term = saturate(summary.total_churn as f64, self.churn_scale);
        let impact_term = saturate(summary.impacted_modules as f64, self.impact_scale);
        let score =
            (self.churn_weight * churn_term + self.impact_weight * impact_term).clamp(0.0, 1.0);

        SeverityResult {
            source: SeveritySource::Heuristic,
            score,
            rationale: format!(
                "heuristic: {} changed lines across {} files, {} impacted modules",
                summary.total_churn,
                summary.files.len() + summary.truncated_files,
                summary.impacted_modules
            ),
        }
    }
}

/// Monotonic saturating map of a non-negative magnitude into [0,1)
fn saturate(value: f64, scale: f64) -> f64 {
    1.0 - (-value / scale).exp()
}
