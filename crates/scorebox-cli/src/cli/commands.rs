use anyhow::Context;
use chrono::Utc;
use scorebox_core::config::{self, EvalSettings};
use scorebox_core::engine::evaluator::Evaluator;
use scorebox_core::leaderboard;
use scorebox_core::model::{InningsInfo, MatchRecord, MatchStatus, Submission, SubmissionStatus};
use scorebox_core::sandbox::DockerSandbox;
use scorebox_core::storage::store::Store;
use scorebox_core::sweep::Sweeper;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::args::{
    Cli, Command, CommonArgs, EvaluateArgs, InitArgs, LeaderboardArgs, MatchAddArgs, MatchArgs,
    MatchAttachArgs, MatchScoreArgs, MatchSub, PredictionsArgs, SubmitArgs, SweepArgs,
};

pub mod exit_codes {
    pub const OK: i32 = 0;
    /// The command ran but the request was rejected (unknown match,
    /// missing scores, no submissions, docker unreachable).
    pub const REJECTED: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Init(args) => cmd_init(args),
        Command::Doctor(args) => cmd_doctor(args).await,
        Command::Match(args) => cmd_match(args),
        Command::Submit(args) => cmd_submit(args),
        Command::Evaluate(args) => cmd_evaluate(args).await,
        Command::Predictions(args) => cmd_predictions(args),
        Command::Leaderboard(args) => cmd_leaderboard(args),
        Command::Sweep(args) => cmd_sweep(args).await,
        Command::Version => {
            println!("scorebox {}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

fn open_store(args: &CommonArgs) -> anyhow::Result<Store> {
    ensure_parent_dir(&args.db)?;
    let store = Store::open(&args.db)?;
    store.init_schema()?;
    Ok(store)
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}

fn cmd_init(args: InitArgs) -> anyhow::Result<i32> {
    if args.config.exists() {
        eprintln!("refusing to overwrite {}", args.config.display());
        return Ok(exit_codes::REJECTED);
    }
    config::write_sample_settings(&args.config)?;
    println!("wrote {}", args.config.display());
    Ok(exit_codes::OK)
}

async fn cmd_doctor(args: CommonArgs) -> anyhow::Result<i32> {
    let settings = EvalSettings::resolve(&args.config)?;
    let store = open_store(&args)?;
    let matches = store.list_matches()?.len();
    println!("database: ok ({} at {} matches)", args.db.display(), matches);

    let sandbox = match DockerSandbox::connect(settings) {
        Ok(s) => s,
        Err(e) => {
            println!("docker:   unreachable ({e})");
            return Ok(exit_codes::REJECTED);
        }
    };
    match sandbox.ping().await {
        Ok(()) => println!("docker:   ok"),
        Err(e) => {
            println!("docker:   unreachable ({e})");
            return Ok(exit_codes::REJECTED);
        }
    }
    if sandbox.has_base_image().await {
        println!("image:    ok ({})", sandbox.base_image());
        Ok(exit_codes::OK)
    } else {
        println!("image:    missing ({})", sandbox.base_image());
        Ok(exit_codes::REJECTED)
    }
}

fn cmd_match(args: MatchArgs) -> anyhow::Result<i32> {
    match args.cmd {
        MatchSub::Add(args) => cmd_match_add(args),
        MatchSub::Score(args) => cmd_match_score(args),
        MatchSub::Attach(args) => cmd_match_attach(args),
        MatchSub::List(args) => cmd_match_list(args),
    }
}

fn cmd_match_add(args: MatchAddArgs) -> anyhow::Result<i32> {
    let store = open_store(&args.common)?;
    let m = MatchRecord {
        id: args.id.clone(),
        match_number: args.number,
        team1: args.team1,
        team2: args.team2,
        venue: args.venue,
        toss_winner: args.toss_winner,
        toss_decision: args.toss_decision,
        innings1: None,
        innings2: None,
        actual_runs_i1: None,
        actual_runs_i2: None,
        status: MatchStatus::Upcoming,
        evaluated_at: None,
        created_at: Utc::now().to_rfc3339(),
    };
    store.insert_match(&m)?;
    println!("added match {} (#{}) at {}", m.id, m.match_number, m.venue);
    Ok(exit_codes::OK)
}

fn cmd_match_score(args: MatchScoreArgs) -> anyhow::Result<i32> {
    let store = open_store(&args.common)?;
    match store.set_actual_scores(&args.id, args.runs_i1, args.runs_i2) {
        Ok(invalidated) => {
            println!(
                "match {} scored {}/{} ({} stale predictions cleared)",
                args.id, args.runs_i1, args.runs_i2, invalidated
            );
            Ok(exit_codes::OK)
        }
        Err(e) => {
            eprintln!("{e}");
            Ok(exit_codes::REJECTED)
        }
    }
}

fn cmd_match_attach(args: MatchAttachArgs) -> anyhow::Result<i32> {
    let store = open_store(&args.common)?;
    let i1 = InningsInfo {
        batting_team: args.i1_batting,
        bowling_team: args.i1_bowling,
    };
    let i2 = InningsInfo {
        batting_team: args.i2_batting,
        bowling_team: args.i2_bowling,
    };
    match store.attach_match_data(&args.id, &i1, &i2) {
        Ok(invalidated) => {
            println!(
                "match {} innings attached ({} stale predictions cleared)",
                args.id, invalidated
            );
            Ok(exit_codes::OK)
        }
        Err(e) => {
            eprintln!("{e}");
            Ok(exit_codes::REJECTED)
        }
    }
}

fn cmd_match_list(args: CommonArgs) -> anyhow::Result<i32> {
    let store = open_store(&args)?;
    let matches = store.list_matches()?;
    if matches.is_empty() {
        println!("no matches");
        return Ok(exit_codes::OK);
    }
    for m in matches {
        let scores = match (m.actual_runs_i1, m.actual_runs_i2) {
            (Some(a1), Some(a2)) => format!("{a1}/{a2}"),
            _ => "-".to_string(),
        };
        let evaluated = if m.evaluated_at.is_some() { "yes" } else { "no" };
        println!(
            "#{:<3} {:<12} {} vs {} @ {} [{}] scores={} evaluated={}",
            m.match_number,
            m.id,
            m.team1,
            m.team2,
            m.venue,
            m.status.as_str(),
            scores,
            evaluated
        );
    }
    Ok(exit_codes::OK)
}

fn cmd_submit(args: SubmitArgs) -> anyhow::Result<i32> {
    if !args.script.is_file() {
        eprintln!("script not found: {}", args.script.display());
        return Ok(exit_codes::REJECTED);
    }
    // The path outlives this process; store it absolute.
    let script = std::fs::canonicalize(&args.script)
        .with_context(|| format!("failed to resolve {}", args.script.display()))?;

    let store = open_store(&args.common)?;
    let name = args.name.unwrap_or_else(|| args.team.clone());
    store.upsert_team(&args.team, &name)?;

    let sub = Submission {
        id: format!("{}-{}", args.team, Utc::now().timestamp_millis()),
        team_id: args.team.clone(),
        script_path: script.to_string_lossy().into_owned(),
        active: true,
        status: SubmissionStatus::Ready,
        submitted_at: Utc::now().to_rfc3339(),
    };
    store.activate_submission(&sub)?;
    println!("submission {} active for team {}", sub.id, args.team);
    Ok(exit_codes::OK)
}

async fn cmd_evaluate(args: EvaluateArgs) -> anyhow::Result<i32> {
    let settings = EvalSettings::resolve(&args.common.config)?;
    let store = open_store(&args.common)?;
    let sandbox = DockerSandbox::connect(settings.clone())?;
    sandbox.ping().await.context("docker daemon unreachable")?;

    let evaluator = Evaluator {
        store: store.clone(),
        runner: Arc::new(sandbox),
        settings,
    };
    match evaluator.evaluate_match(&args.match_id).await {
        Ok(report) => {
            for p in &report.predictions {
                print_prediction(p);
            }
            println!(
                "match {} evaluated ({} teams)",
                report.match_id,
                report.predictions.len()
            );
            Ok(exit_codes::OK)
        }
        Err(e) => {
            eprintln!("{e}");
            Ok(exit_codes::REJECTED)
        }
    }
}

fn cmd_predictions(args: PredictionsArgs) -> anyhow::Result<i32> {
    let store = open_store(&args.common)?;
    if store.get_match(&args.match_id)?.is_none() {
        eprintln!("unknown match {}", args.match_id);
        return Ok(exit_codes::REJECTED);
    }
    let predictions = store.predictions_for_match(&args.match_id)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&predictions)?);
        return Ok(exit_codes::OK);
    }
    if predictions.is_empty() {
        println!("no predictions for match {}", args.match_id);
        return Ok(exit_codes::OK);
    }
    for p in &predictions {
        print_prediction(p);
    }
    Ok(exit_codes::OK)
}

fn print_prediction(p: &scorebox_core::model::Prediction) {
    let fmt_opt = |v: Option<i64>| v.map_or("-".to_string(), |n| n.to_string());
    let code = p.error_code.as_deref().unwrap_or("-");
    println!(
        "{:<12} i1={:<5} i2={:<5} err={:<5} status={:<8} {}ms code={}",
        p.team_id,
        fmt_opt(p.predicted_i1),
        fmt_opt(p.predicted_i2),
        p.total_error,
        p.status.as_str(),
        p.duration_ms,
        code
    );
}

fn cmd_leaderboard(args: LeaderboardArgs) -> anyhow::Result<i32> {
    let store = open_store(&args.common)?;
    let rows = leaderboard::ranked(&store)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(exit_codes::OK);
    }
    if rows.is_empty() {
        println!("no teams");
        return Ok(exit_codes::OK);
    }
    println!("{:<5} {:<24} {:>12} {:>8}", "rank", "team", "cum. error", "matches");
    for row in rows {
        println!(
            "{:<5} {:<24} {:>12} {:>8}",
            row.rank, row.team_name, row.cumulative_error, row.matches_evaluated
        );
    }
    Ok(exit_codes::OK)
}

async fn cmd_sweep(args: SweepArgs) -> anyhow::Result<i32> {
    let mut settings = EvalSettings::resolve(&args.common.config)?;
    if let Some(secs) = args.interval_seconds {
        settings.sweep_interval_seconds = secs;
    }
    let store = open_store(&args.common)?;
    let sandbox = DockerSandbox::connect(settings.clone())?;
    sandbox.ping().await.context("docker daemon unreachable")?;

    let interval = Duration::from_secs(settings.sweep_interval_seconds);
    let sweeper = Sweeper::new(
        Evaluator {
            store,
            runner: Arc::new(sandbox),
            settings,
        },
        interval,
    );

    if args.once {
        let stats = sweeper.sweep_once().await?;
        println!(
            "sweep: {} scanned, {} evaluated, {} failed",
            stats.scanned, stats.evaluated, stats.failed
        );
        Ok(exit_codes::OK)
    } else {
        tracing::info!(
            interval_seconds = interval.as_secs(),
            "starting sweep loop"
        );
        sweeper.run().await?;
        Ok(exit_codes::OK)
    }
}
