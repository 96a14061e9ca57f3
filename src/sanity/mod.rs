//! Post-hoc sanity checks on engine inputs and outputs

use crate::config::SanityConfig;
use crate::core::{
    ChangeSet, ImpactEntry, RiskScore, SanityCheckReport, SanityIssue, SanityIssueKind,
    SeverityResult,
};
use crate::graph::DependencyGraph;
use crate::risk::RiskScorer;

/// Validates the assembled analysis before the record is returned
///
/// Issues come in two classes: the configured fatal kinds make the
/// orchestrator withhold the record, everything else rides along as
/// advisory context.
pub struct SanityChecker {
    config: SanityConfig,
}

impl SanityChecker {
    pub fn new(config: SanityConfig) -> Self {
        Self { config }
    }

    pub fn check(
        &self,
        changes: &ChangeSet,
        graph: &DependencyGraph,
        impact: &[ImpactEntry],
        risk: &RiskScore,
        severity: &SeverityResult,
        scorer: &RiskScorer,
    ) -> SanityCheckReport {
        let mut issues = Vec::new();

        for record in changes.iter() {
            if let Some(problem) = path_problem(&record.path) {
                issues.push(SanityIssue::new(
                    SanityIssueKind::IllegalPath,
                    format!("illegal changed-file path {:?}: {problem}", record.path),
                ));
            } else if !graph.contains(&record.path) {
                issues.push(SanityIssue::new(
                    SanityIssueKind::UntrackedChangedFile,
                    format!("untracked changed file: {}", record.path),
                ));
            }
        }

        for entry in impact {
            if !graph.contains(&entry.module.id) {
                issues.push(SanityIssue::new(
                    SanityIssueKind::PhantomImpactModule,
                    format!("impact entry {} is not in the dependency graph", entry.module.id),
                ));
            }
        }

        if !(0.0..=1.0).contains(&risk.value) {
            issues.push(SanityIssue::new(
                SanityIssueKind::RiskScoreOutOfRange,
                format!("risk score {} is outside [0,1]", risk.value),
            ));
        } else if risk.tier != scorer.tier_for(risk.value) {
            issues.push(SanityIssue::new(
                SanityIssueKind::TierMismatch,
                format!("tier {:?} does not match band for value {}", risk.tier, risk.value),
            ));
        }

        if !(0.0..=1.0).contains(&severity.score) {
            issues.push(SanityIssue::new(
                SanityIssueKind::SeverityOutOfRange,
                format!("severity score {} is outside [0,1]", severity.score),
            ));
        }

        if graph.unresolved_imports() > 0 {
            issues.push(SanityIssue::new(
                SanityIssueKind::UnresolvedImports,
                format!(
                    "{} imports did not resolve inside the repository",
                    graph.unresolved_imports()
                ),
            ));
        }

        SanityCheckReport::from_issues(issues)
    }

    /// Issues in the configured fatal class, if any
    pub fn fatal_issues(&self, report: &SanityCheckReport) -> Vec<SanityIssue> {
        report
            .issues
            .iter()
            .filter(|issue| self.config.fatal_kinds.contains(&issue.kind))
            .cloned()
            .collect()
    }
}

/// Reject empty paths, absolute paths, and traversal sequences
fn path_problem(path: &str) -> Option<&'static str> {
    if path.is_empty() {
        Some("empty")
    } else if path.starts_with('/') || path.contains(":\\") {
        Some("absolute")
    } else if path.split('/').any(|segment| segment == "..") {
        Some("contains traversal")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RiskBands, RiskWeights, SanityConfig};
    use crate::core::{ChangeRecord, ModuleNode, RiskComponents, RiskTier, SeveritySource};

    fn checker() -> SanityChecker {
        SanityChecker::new(SanityConfig::default())
    }

    fn scorer() -> RiskScorer {
        RiskScorer::new(RiskWeights::default(), RiskBands::default())
    }

    fn risk(value: f64, tier: RiskTier) -> RiskScore {
        RiskScore {
            value,
            tier,
            components: RiskComponents {
                churn: 0.0,
                depth: 0.0,
                core_multiplier: 1.0,
                severity: 0.0,
            },
        }
    }

    fn severity(score: f64) -> SeverityResult {
        SeverityResult {
            source: SeveritySource::Heuristic,
            score,
            rationale: String::new(),
        }
    }

    fn graph_with(ids: &[&str]) -> DependencyGraph {
        let mut g = DependencyGraph::new();
        for id in ids {
            g.add_node(*id, false);
        }
        g
    }

    fn changes(paths: &[&str]) -> ChangeSet {
        ChangeSet::from_records(paths.iter().map(|p| ChangeRecord {
            path: p.to_string(),
            lines_added: 1,
            lines_removed: 0,
            changed_ranges: vec![],
            renamed: false,
        }))
    }

    #[test]
    fn clean_analysis_passes() {
        let report = checker().check(
            &changes(&["a.js"]),
            &graph_with(&["a.js"]),
            &[],
            &risk(0.1, RiskTier::Low),
            &severity(0.1),
            &scorer(),
        );
        assert!(report.passed);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn untracked_changed_file_is_advisory() {
        let c = checker();
        let report = c.check(
            &changes(&["README.md"]),
            &graph_with(&["a.js"]),
            &[],
            &risk(0.1, RiskTier::Low),
            &severity(0.1),
            &scorer(),
        );
        assert!(!report.passed);
        assert_eq!(report.issues[0].kind, SanityIssueKind::UntrackedChangedFile);
        assert!(c.fatal_issues(&report).is_empty());
    }

    #[test]
    fn traversal_path_is_flagged() {
        let report = checker().check(
            &changes(&["../../etc/passwd"]),
            &graph_with(&[]),
            &[],
            &risk(0.1, RiskTier::Low),
            &severity(0.1),
            &scorer(),
        );
        assert_eq!(report.issues[0].kind, SanityIssueKind::IllegalPath);
    }

    #[test]
    fn tier_mismatch_is_fatal() {
        let c = checker();
        let report = c.check(
            &changes(&["a.js"]),
            &graph_with(&["a.js"]),
            &[],
            &risk(0.9, RiskTier::Low),
            &severity(0.1),
            &scorer(),
        );
        let fatal = c.fatal_issues(&report);
        assert_eq!(fatal.len(), 1);
        assert_eq!(fatal[0].kind, SanityIssueKind::TierMismatch);
    }

    #[test]
    fn phantom_impact_module_is_fatal() {
        let c = checker();
        let impact = [ImpactEntry {
            module: ModuleNode {
                id: "ghost.js".to_string(),
                is_core_service: false,
            },
            depth: 1,
            via_path: vec![],
        }];
        let report = c.check(
            &changes(&["a.js"]),
            &graph_with(&["a.js"]),
            &impact,
            &risk(0.1, RiskTier::Low),
            &severity(0.1),
            &scorer(),
        );
        assert!(!c.fatal_issues(&report).is_empty());
    }
}
