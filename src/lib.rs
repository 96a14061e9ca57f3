// Export modules for library usage
pub mod analysis;
pub mod cli;
pub mod config;
pub mod core;
pub mod diff;
pub mod graph;
pub mod io;
pub mod llm;
pub mod risk;
pub mod sanity;

// Re-export commonly used types
pub use crate::core::{
    AnalysisRecord, ChangeRecord, ChangeSet, GraphSummary, ImpactEntry, ImpactError, LineRange,
    ModuleNode, RegressionStatus, RegressionTestReport, Result, RiskComponents, RiskScore,
    RiskTier, SanityCheckReport, SanityIssue, SanityIssueKind, SeverityResult, SeveritySource,
};

pub use crate::analysis::{AnalysisEngine, AnalysisRequest, CommandTestRunner, TestRunner};
pub use crate::config::{load_config, CoreServiceMatcher, EngineConfig};
pub use crate::diff::parse_unified_diff;
pub use crate::graph::{propagate, DependencyGraph, GraphBuilder};
pub use crate::io::{RepoSnapshot, SourceFile};
pub use crate::risk::{
    ChangeSummary, HeuristicStrategy, ModelVerdict, RiskScorer, SeverityModel, SeverityStrategy,
};
pub use crate::sanity::SanityChecker;
