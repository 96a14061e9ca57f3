//! Common type definitions used across the engine

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inclusive range of line numbers in the post-change file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Per-file change extracted from a unified diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub path: String,
    pub lines_added: usize,
    pub lines_removed: usize,
    pub changed_ranges: Vec<LineRange>,
    /// Pure renames carry zero churn and are scored as such
    pub renamed: bool,
}

impl ChangeRecord {
    pub fn churn(&self) -> usize {
        self.lines_added + self.lines_removed
    }
}

/// Immutable set of per-file changes, keyed by path
///
/// Iteration order is path order, so downstream consumers are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeSet {
    records: BTreeMap<String, ChangeRecord>,
}

impl ChangeSet {
    pub fn from_records(records: impl IntoIterator<Item = ChangeRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.path.clone(), r)).collect(),
        }
    }

    pub fn get(&self, path: &str) -> Option<&ChangeRecord> {
        self.records.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.records.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total added+removed lines across all records
    pub fn total_churn(&self) -> usize {
        self.records.values().map(ChangeRecord::churn).sum()
    }
}

/// A module in the dependency graph, identified by normalized repo-relative path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleNode {
    pub id: String,
    pub is_core_service: bool,
}

/// One impacted module with its minimum propagation depth and a witnessing path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactEntry {
    pub module: ModuleNode,
    pub depth: usize,
    pub via_path: Vec<String>,
}

/// Which strategy produced the severity signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeveritySource {
    Llm,
    Heuristic,
}

/// Severity signal in [0,1] with its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityResult {
    pub source: SeveritySource,
    pub score: f64,
    pub rationale: String,
}

/// Discrete banding of the composite risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
}

/// Normalized sub-components that fed the composite score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskComponents {
    pub churn: f64,
    pub depth: f64,
    pub core_multiplier: f64,
    pub severity: f64,
}

/// Composite risk score, derived and clamped to [0,1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub value: f64,
    pub tier: RiskTier,
    pub components: RiskComponents,
}

/// Classification of sanity issues; a configured subset is fatal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SanityIssueKind {
    IllegalPath,
    PhantomImpactModule,
    RiskScoreOutOfRange,
    TierMismatch,
    SeverityOutOfRange,
    UntrackedChangedFile,
    UnresolvedImports,
}

/// One sanity violation or diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanityIssue {
    pub kind: SanityIssueKind,
    pub message: String,
}

impl SanityIssue {
    pub fn new(kind: SanityIssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of the post-hoc sanity pass; attached to the record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanityCheckReport {
    pub passed: bool,
    pub issues: Vec<SanityIssue>,
}

impl SanityCheckReport {
    pub fn from_issues(issues: Vec<SanityIssue>) -> Self {
        Self {
            passed: issues.is_empty(),
            issues,
        }
    }
}

/// Terminal status of a regression-test run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegressionStatus {
    Passed,
    Failed,
    Skipped,
    TimedOut,
}

/// Result of the external regression-test collaborator
///
/// Runner failures are encoded here, never as engine errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegressionTestReport {
    pub status: RegressionStatus,
    pub failed_cases: Vec<String>,
    pub duration_ms: u64,
    pub command: String,
    pub output_tail: String,
}

impl RegressionTestReport {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: RegressionStatus::Skipped,
            failed_cases: Vec::new(),
            duration_ms: 0,
            command: String::new(),
            output_tail: reason.into(),
        }
    }
}

/// Compact description of the graph the analysis ran against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub module_count: usize,
    pub edge_count: usize,
    pub unresolved_imports: usize,
}

/// The engine's sole output; the caller owns persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub change_set: ChangeSet,
    pub graph: GraphSummary,
    pub impact: Vec<ImpactEntry>,
    pub risk: RiskScore,
    pub severity: SeverityResult,
    pub sanity: SanityCheckReport,
    pub regression: Option<RegressionTestReport>,
}
