use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "scorebox",
    version,
    about = "Sandboxed model execution and scoring engine for innings-total prediction contests"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a sample settings file
    Init(InitArgs),
    /// Check the docker daemon, base image and database
    Doctor(CommonArgs),
    /// Manage match fixtures and ground truth
    Match(MatchArgs),
    /// Register a team's prediction script as its active submission
    Submit(SubmitArgs),
    /// Evaluate one match across all active submissions
    Evaluate(EvaluateArgs),
    /// List the stored predictions for a match
    Predictions(PredictionsArgs),
    /// Print the ranked leaderboard
    Leaderboard(LeaderboardArgs),
    /// Scan for completed, unevaluated matches and evaluate them
    Sweep(SweepArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CommonArgs {
    #[arg(long, default_value = ".scorebox/scorebox.db")]
    pub db: PathBuf,

    #[arg(long, default_value = "scorebox.yaml")]
    pub config: PathBuf,
}

#[derive(clap::Args, Debug, Clone)]
pub struct InitArgs {
    #[arg(long, default_value = "scorebox.yaml")]
    pub config: PathBuf,
}

#[derive(Parser, Clone)]
pub struct MatchArgs {
    #[command(subcommand)]
    pub cmd: MatchSub,
}

#[derive(Subcommand, Clone)]
pub enum MatchSub {
    /// Create a match fixture
    Add(MatchAddArgs),
    /// Enter both actual innings totals (invalidates prior evaluation)
    Score(MatchScoreArgs),
    /// Attach per-innings batting/bowling enrichment
    Attach(MatchAttachArgs),
    /// List all matches
    List(CommonArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct MatchAddArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long)]
    pub id: String,

    #[arg(long)]
    pub number: u32,

    #[arg(long)]
    pub team1: String,

    #[arg(long)]
    pub team2: String,

    #[arg(long)]
    pub venue: String,

    #[arg(long, default_value = "")]
    pub toss_winner: String,

    #[arg(long, default_value = "")]
    pub toss_decision: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct MatchScoreArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long)]
    pub id: String,

    /// Actual total for innings 1
    #[arg(long)]
    pub runs_i1: i64,

    /// Actual total for innings 2
    #[arg(long)]
    pub runs_i2: i64,
}

#[derive(clap::Args, Debug, Clone)]
pub struct MatchAttachArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long)]
    pub id: String,

    #[arg(long)]
    pub i1_batting: String,

    #[arg(long)]
    pub i1_bowling: String,

    #[arg(long)]
    pub i2_batting: String,

    #[arg(long)]
    pub i2_bowling: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Team identifier
    #[arg(long)]
    pub team: String,

    /// Display name; defaults to the team identifier
    #[arg(long)]
    pub name: Option<String>,

    /// Path to the team's prediction script
    #[arg(long)]
    pub script: PathBuf,
}

#[derive(clap::Args, Debug, Clone)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long)]
    pub match_id: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct PredictionsArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long)]
    pub match_id: String,

    /// Emit JSON instead of the table
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct LeaderboardArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Emit JSON instead of the table
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SweepArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Run a single pass instead of looping
    #[arg(long)]
    pub once: bool,

    /// Override the configured sweep interval
    #[arg(long)]
    pub interval_seconds: Option<u64>,
}
