pub mod errors;
pub mod types;

pub use errors::{ImpactError, Result};
pub use types::{
    AnalysisRecord, ChangeRecord, ChangeSet, GraphSummary, ImpactEntry, LineRange, ModuleNode,
    RegressionStatus, RegressionTestReport, RiskComponents, RiskScore, RiskTier, SanityCheckReport,
    SanityIssue, SanityIssueKind, SeverityResult, SeveritySource,
};
