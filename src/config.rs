//! Immutable engine configuration
//!
//! Loaded once from `.impactmap.toml` and passed into the orchestrator at
//! construction; nothing here is ambient global state, so tests can run the
//! engine with varied configurations deterministically.

use crate::core::types::SanityIssueKind;
use crate::core::Result;
use crate::io::SOURCE_EXTENSIONS;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = ".impactmap.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub risk: RiskWeights,
    #[serde(default)]
    pub bands: RiskBands,
    #[serde(default)]
    pub core_services: CoreServiceConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub severity: SeverityConfig,
    #[serde(default)]
    pub regression: RegressionConfig,
    #[serde(default)]
    pub sanity: SanityConfig,
}

/// Weights and saturation constants for the composite risk score
///
/// The numeric weights are tunables, not a hard contract; they are
/// normalized so churn+depth+severity sum to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskWeights {
    #[serde(default = "default_churn_weight")]
    pub churn_weight: f64,
    #[serde(default = "default_depth_weight")]
    pub depth_weight: f64,
    #[serde(default = "default_severity_weight")]
    pub severity_weight: f64,
    /// Multiplier applied when a core-service module is touched or impacted
    #[serde(default = "default_core_multiplier")]
    pub core_multiplier: f64,
    /// Churn (total lines) at which the churn component reaches ~0.63
    #[serde(default = "default_churn_saturation")]
    pub churn_saturation: f64,
    /// Propagation depth at which the depth component reaches ~0.63
    #[serde(default = "default_depth_saturation")]
    pub depth_saturation: f64,
}

pub fn default_churn_weight() -> f64 {
    0.35
}
pub fn default_depth_weight() -> f64 {
    0.30
}
pub fn default_severity_weight() -> f64 {
    0.35
}
pub fn default_core_multiplier() -> f64 {
    1.5
}
pub fn default_churn_saturation() -> f64 {
    50.0
}
pub fn default_depth_saturation() -> f64 {
    3.0
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            churn_weight: default_churn_weight(),
            depth_weight: default_depth_weight(),
            severity_weight: default_severity_weight(),
            core_multiplier: default_core_multiplier(),
            churn_saturation: default_churn_saturation(),
            depth_saturation: default_depth_saturation(),
        }
    }
}

impl RiskWeights {
    pub fn validate(&self) -> std::result::Result<(), String> {
        let weights = [self.churn_weight, self.depth_weight, self.severity_weight];
        if weights.iter().any(|w| *w < 0.0) {
            return Err("risk weights must be non-negative".to_string());
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err("risk weights must sum to a positive value".to_string());
        }
        if self.core_multiplier < 1.0 {
            return Err("core multiplier must be at least 1.0".to_string());
        }
        if self.churn_saturation <= 0.0 || self.depth_saturation <= 0.0 {
            return Err("saturation constants must be positive".to_string());
        }
        Ok(())
    }

    /// Scale churn/depth/severity weights to sum exactly 1.0
    pub fn normalize(&mut self) {
        let sum = self.churn_weight + self.depth_weight + self.severity_weight;
        if sum > 0.0 {
            self.churn_weight /= sum;
            self.depth_weight /= sum;
            self.severity_weight /= sum;
        }
    }
}

/// Non-overlapping tier bands over the composite value; boundary values
/// resolve to the higher tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskBands {
    #[serde(default = "default_medium_band")]
    pub medium: f64,
    #[serde(default = "default_high_band")]
    pub high: f64,
    #[serde(default = "default_critical_band")]
    pub critical: f64,
}

pub fn default_medium_band() -> f64 {
    0.25
}
pub fn default_high_band() -> f64 {
    0.5
}
pub fn default_critical_band() -> f64 {
    0.75
}

impl Default for RiskBands {
    fn default() -> Self {
        Self {
            medium: default_medium_band(),
            high: default_high_band(),
            critical: default_critical_band(),
        }
    }
}

impl RiskBands {
    pub fn validate(&self) -> std::result::Result<(), String> {
        let ordered = 0.0 < self.medium && self.medium < self.high && self.high < self.critical;
        if !ordered || self.critical > 1.0 {
            return Err("tier bands must be ascending within (0, 1]".to_string());
        }
        Ok(())
    }
}

/// Glob patterns naming business-critical modules; assigned by path, never
/// inferred from content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreServiceConfig {
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// Compiled core-service matcher
#[derive(Debug, Clone)]
pub struct CoreServiceMatcher {
    patterns: Vec<glob::Pattern>,
}

impl CoreServiceMatcher {
    pub fn from_config(config: &CoreServiceConfig) -> Result<Self> {
        let patterns = config
            .patterns
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_core(&self, module_id: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(module_id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Worker pool size for per-file extraction; 0 means one per CPU
    #[serde(default)]
    pub threads: usize,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

pub fn default_extensions() -> Vec<String> {
    SOURCE_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            extensions: default_extensions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityConfig {
    /// Budget for the LLM call before falling back to the heuristic
    #[serde(default = "default_severity_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_severity_churn_weight")]
    pub churn_weight: f64,
    #[serde(default = "default_severity_impact_weight")]
    pub impact_weight: f64,
    #[serde(default = "default_severity_churn_scale")]
    pub churn_scale: f64,
    #[serde(default = "default_severity_impact_scale")]
    pub impact_scale: f64,
    #[serde(default)]
    pub llm: Option<LlmConfig>,
}

pub fn default_severity_timeout_secs() -> u64 {
    30
}
pub fn default_severity_churn_weight() -> f64 {
    0.6
}
pub fn default_severity_impact_weight() -> f64 {
    0.4
}
pub fn default_severity_churn_scale() -> f64 {
    80.0
}
pub fn default_severity_impact_scale() -> f64 {
    8.0
}

impl Default for SeverityConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_severity_timeout_secs(),
            churn_weight: default_severity_churn_weight(),
            impact_weight: default_severity_impact_weight(),
            churn_scale: default_severity_churn_scale(),
            impact_scale: default_severity_impact_scale(),
            llm: None,
        }
    }
}

/// OpenAI-compatible endpoint settings for the severity model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Environment variable holding the API key; the LLM strategy is never
    /// constructed when the variable is unset
    #[serde(default = "default_llm_api_key_env")]
    pub api_key_env: String,
}

pub fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}
pub fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}
pub fn default_llm_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key_env: default_llm_api_key_env(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionConfig {
    /// Command and arguments; empty means the runner is not configured
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default = "default_regression_timeout_secs")]
    pub timeout_secs: u64,
}

pub fn default_regression_timeout_secs() -> u64 {
    240
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            timeout_secs: default_regression_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanityConfig {
    /// Issue kinds that fail the request instead of returning a record
    #[serde(default = "default_fatal_kinds")]
    pub fatal_kinds: Vec<SanityIssueKind>,
}

pub fn default_fatal_kinds() -> Vec<SanityIssueKind> {
    vec![
        SanityIssueKind::RiskScoreOutOfRange,
        SanityIssueKind::TierMismatch,
        SanityIssueKind::SeverityOutOfRange,
        SanityIssueKind::PhantomImpactModule,
    ]
}

impl Default for SanityConfig {
    fn default() -> Self {
        Self {
            fatal_kinds: default_fatal_kinds(),
        }
    }
}

/// Parse and validate a TOML config string
pub fn parse_config(contents: &str) -> std::result::Result<EngineConfig, String> {
    let mut config = toml::from_str::<EngineConfig>(contents)
        .map_err(|e| format!("Failed to parse {CONFIG_FILE_NAME}: {e}"))?;

    if let Err(e) = config.risk.validate() {
        eprintln!("Warning: invalid risk weights: {e}. Using defaults.");
        config.risk = RiskWeights::default();
    }
    config.risk.normalize();

    if let Err(e) = config.bands.validate() {
        eprintln!("Warning: invalid tier bands: {e}. Using defaults.");
        config.bands = RiskBands::default();
    }
    Ok(config)
}

/// Load configuration from `.impactmap.toml` under `root`, falling back to
/// defaults when the file is absent or invalid.
pub fn load_config(root: &Path) -> EngineConfig {
    let path = root.join(CONFIG_FILE_NAME);
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to read {}: {}", path.display(), e);
            }
            return normalized_default();
        }
    };
    match parse_config(&contents) {
        Ok(config) => {
            log::debug!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            eprintln!("Warning: {e}. Using defaults.");
            normalized_default()
        }
    }
}

fn normalized_default() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.risk.normalize();
    config
}

/// Starter config written by `impactmap init`
pub fn starter_config() -> &'static str {
    r#"# impactmap configuration

[core_services]
# Globs over module paths that escalate risk when touched or impacted
patterns = ["api-gateway/**", "order-service/**", "payment-service/**"]

[risk]
churn_weight = 0.35
depth_weight = 0.30
severity_weight = 0.35
core_multiplier = 1.5

[bands]
medium = 0.25
high = 0.5
critical = 0.75

[severity]
timeout_secs = 30
# [severity.llm]
# model = "gpt-4o-mini"
# api_key_env = "OPENAI_API_KEY"

[regression]
# command = ["npm", "test"]
timeout_secs = 240
"#
}
