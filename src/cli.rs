use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::evaluation::client::DEFAULT_API_BASE_URL;

#[derive(Parser, Debug)]
#[command(
    name = "interview-insights",
    version,
    about = "Discovery interview aggregation and interviewer-agent evaluation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Analyze(AnalyzeArgs),
    Simulate(SimulateArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(long, default_value = "data/conversations.json")]
    pub input: PathBuf,

    #[arg(long, default_value = "data/analysis-report.md")]
    pub output: PathBuf,

    #[arg(long)]
    pub summary_json: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    #[arg(long)]
    pub scenario: Option<u32>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[arg(long, default_value_t = false)]
    pub verbose: bool,

    #[arg(long, default_value = "data/simulation-results.json")]
    pub results_path: PathBuf,

    #[arg(long, env = "INTERVIEW_AGENT_ID")]
    pub agent_id: Option<String>,

    #[arg(long, env = "ELEVENLABS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "ELEVENLABS_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    #[arg(long, default_value = "fr")]
    pub language: String,

    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,
}
