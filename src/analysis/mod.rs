//! Analysis orchestration: sequences parsing, graph construction,
//! propagation, severity, scoring, and sanity checks into one record.

pub mod runner;

pub use runner::{CommandTestRunner, TestRunner};

use crate::config::{CoreServiceMatcher, EngineConfig};
use crate::core::{AnalysisRecord, ImpactError, Result};
use crate::diff::parse_unified_diff;
use crate::graph::{propagate, GraphBuilder};
use crate::io::RepoSnapshot;
use crate::risk::{ChangeSummary, RiskScorer, SeverityModel, SeverityStrategy};
use crate::sanity::SanityChecker;
use std::sync::Arc;

/// One analysis request: the diff plus the repository snapshot at the PR's
/// head state, both supplied by the PR-source collaborator.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub diff: String,
    pub snapshot: RepoSnapshot,
    pub run_regression_tests: bool,
}

/// The engine itself
///
/// Holds only configuration and collaborators; no state survives between
/// requests, so concurrent analyses need no coordination.
pub struct AnalysisEngine {
    config: EngineConfig,
    severity: SeverityStrategy,
    test_runner: Option<Box<dyn TestRunner>>,
}

impl AnalysisEngine {
    /// Engine with the deterministic heuristic severity strategy
    pub fn new(config: EngineConfig) -> Self {
        let severity = SeverityStrategy::heuristic(&config.severity);
        Self {
            config,
            severity,
            test_runner: None,
        }
    }

    /// Route severity through an external model, heuristic on any failure
    pub fn with_severity_model(mut self, model: Arc<dyn SeverityModel>) -> Self {
        self.severity = SeverityStrategy::llm(&self.config.severity, model);
        self
    }

    pub fn with_test_runner(mut self, runner: Box<dyn TestRunner>) -> Self {
        self.test_runner = Some(runner);
        self
    }

    /// Run the full pipeline and assemble the analysis record
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisRecord> {
        let changes = parse_unified_diff(&request.diff)?;
        log::info!(
            "Parsed diff: {} files, {} changed lines",
            changes.len(),
            changes.total_churn()
        );

        let core_matcher = CoreServiceMatcher::from_config(&self.config.core_services)?;
        let builder = GraphBuilder::new(self.config.graph.clone(), core_matcher);
        let graph = builder.build(&request.snapshot)?;

        let impact = propagate(&changes, &graph);
        let summary = ChangeSummary::new(&changes, &impact);
        let severity = self.severity.estimate(&summary);

        let scorer = RiskScorer::new(self.config.risk.clone(), self.config.bands.clone());
        let risk = scorer.score(&changes, &impact, &severity);

        let checker = SanityChecker::new(self.config.sanity.clone());
        let sanity = checker.check(&changes, &graph, &impact, &risk, &severity, &scorer);
        let fatal = checker.fatal_issues(&sanity);
        if !fatal.is_empty() {
            return Err(ImpactError::FatalSanity { issues: fatal });
        }

        // A runner failure degrades to a recorded status, never an error
        let regression = if request.run_regression_tests {
            let scope: Vec<String> = changes.paths().map(str::to_string).collect();
            match &self.test_runner {
                Some(runner) => Some(runner.run(&scope)),
                None => Some(crate::core::RegressionTestReport::skipped(
                    "no regression runner configured",
                )),
            }
        } else {
            None
        };

        log::info!(
            "Analysis complete: risk {:.3} ({:?}), {} impacted modules",
            risk.value,
            risk.tier,
            impact.len()
        );

        Ok(AnalysisRecord {
            change_set: changes,
            graph: graph.summary(),
            impact,
            risk,
            severity,
            sanity,
            regression,
        })
    }
}
