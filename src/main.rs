use anyhow::{anyhow, Context, Result};
use clap::Parser;
use impactmap::analysis::{AnalysisEngine, AnalysisRequest, CommandTestRunner};
use impactmap::cli::{Cli, Commands, OutputFormat};
use impactmap::config::{self, EngineConfig};
use impactmap::core::AnalysisRecord;
use impactmap::io::RepoSnapshot;
use impactmap::llm::OpenAiSeverityModel;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            repo,
            diff,
            config,
            format,
            output,
            use_llm,
            run_tests,
        } => handle_analyze(repo, diff, config, format, output, use_llm, run_tests),
        Commands::Init { force } => handle_init(force),
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_analyze(
    repo: PathBuf,
    diff: PathBuf,
    config_path: Option<PathBuf>,
    format: OutputFormat,
    output: Option<PathBuf>,
    use_llm: bool,
    run_tests: bool,
) -> Result<()> {
    let config = resolve_config(&repo, config_path.as_deref())?;

    let diff_text = std::fs::read_to_string(&diff)
        .with_context(|| format!("reading diff file {}", diff.display()))?;
    let extensions: Vec<&str> = config.graph.extensions.iter().map(String::as_str).collect();
    let snapshot = RepoSnapshot::load(&repo, &extensions)?;

    let mut engine = AnalysisEngine::new(config.clone());
    if use_llm {
        let llm_config = config.severity.llm.clone().unwrap_or_default();
        let timeout = Duration::from_secs(config.severity.timeout_secs);
        match OpenAiSeverityModel::from_config(&llm_config, timeout)? {
            Some(model) => engine = engine.with_severity_model(Arc::new(model)),
            None => log::warn!("--use-llm requested but no API key available; using heuristic"),
        }
    }
    if run_tests && !config.regression.command.is_empty() {
        engine = engine.with_test_runner(Box::new(CommandTestRunner::new(
            &config.regression,
            repo.clone(),
        )));
    }

    let request = AnalysisRequest {
        diff: diff_text,
        snapshot,
        run_regression_tests: run_tests,
    };
    let record = engine.analyze(&request)?;

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&record)?,
        OutputFormat::Text => render_text(&record),
    };
    match output {
        Some(path) => std::fs::write(&path, rendered)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{rendered}"),
    }
    Ok(())
}

fn resolve_config(repo: &Path, config_path: Option<&Path>) -> Result<EngineConfig> {
    match config_path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            config::parse_config(&contents).map_err(|e| anyhow!(e))
        }
        None => Ok(config::load_config(repo)),
    }
}

fn handle_init(force: bool) -> Result<()> {
    let path = Path::new(config::CONFIG_FILE_NAME);
    if path.exists() && !force {
        return Err(anyhow!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }
    std::fs::write(path, config::starter_config())?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn render_text(record: &AnalysisRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Risk: {:.3} ({:?})\n",
        record.risk.value, record.risk.tier
    ));
    out.push_str(&format!(
        "  churn {:.3} | depth {:.3} | severity {:.3} | core x{:.2}\n",
        record.risk.components.churn,
        record.risk.components.depth,
        record.risk.components.severity,
        record.risk.components.core_multiplier,
    ));
    out.push_str(&format!(
        "Severity ({:?}): {:.3} ({})\n",
        record.severity.source, record.severity.score, record.severity.rationale
    ));
    out.push_str(&format!(
        "Changed files: {} ({} lines)\n",
        record.change_set.len(),
        record.change_set.total_churn()
    ));
    out.push_str(&format!(
        "Graph: {} modules, {} edges, {} unresolved imports\n",
        record.graph.module_count, record.graph.edge_count, record.graph.unresolved_imports
    ));
    out.push_str(&format!("Impacted modules: {}\n", record.impact.len()));
    for entry in &record.impact {
        out.push_str(&format!(
            "  [depth {}] {}{}\n",
            entry.depth,
            entry.module.id,
            if entry.module.is_core_service {
                " (core)"
            } else {
                ""
            }
        ));
    }
    if !record.sanity.passed {
        out.push_str("Sanity issues:\n");
        for issue in &record.sanity.issues {
            out.push_str(&format!("  - {}\n", issue.message));
        }
    }
    if let Some(regression) = &record.regression {
        out.push_str(&format!(
            "Regression tests: {:?} ({} ms)\n",
            regression.status, regression.duration_ms
        ));
        for case in &regression.failed_cases {
            out.push_str(&format!("  failed: {case}\n"));
        }
    }
    out
}
