use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "impactmap")]
#[command(about = "Change impact analysis: blast radius and risk for a code change")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a diff against a repository snapshot
    Analyze {
        /// Repository root at the change's head state
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Unified diff file to analyze
        #[arg(long)]
        diff: PathBuf,

        /// Config file (defaults to .impactmap.toml under the repo root)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Write the record here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Route severity through the configured LLM endpoint
        #[arg(long)]
        use_llm: bool,

        /// Run the configured regression command after analysis
        #[arg(long)]
        run_tests: bool,
    },
    /// Write a starter .impactmap.toml
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
