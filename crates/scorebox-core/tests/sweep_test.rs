use async_trait::async_trait;
use scorebox_core::config::EvalSettings;
use scorebox_core::engine::evaluator::Evaluator;
use scorebox_core::model::{
    MatchRecord, MatchStatus, ParsedPrediction, RunOutcome, Submission, SubmissionStatus,
};
use scorebox_core::sandbox::ModelRunner;
use scorebox_core::storage::store::Store;
use scorebox_core::sweep::Sweeper;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Always succeeds with the same pair; counts invocations.
struct CountingRunner {
    calls: AtomicUsize,
}

#[async_trait]
impl ModelRunner for CountingRunner {
    async fn run(&self, _script_path: &Path, _input_csv: &Path) -> RunOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        RunOutcome::success(
            vec![
                ParsedPrediction {
                    id: "1".into(),
                    predicted_run: 160,
                },
                ParsedPrediction {
                    id: "2".into(),
                    predicted_run: 150,
                },
            ],
            "",
            50,
        )
    }
}

fn seed_match(store: &Store, id: &str, number: u32) {
    let m = MatchRecord {
        id: id.into(),
        match_number: number,
        team1: "Aces".into(),
        team2: "Blazers".into(),
        venue: "Garden Oval".into(),
        toss_winner: String::new(),
        toss_decision: String::new(),
        innings1: None,
        innings2: None,
        actual_runs_i1: None,
        actual_runs_i2: None,
        status: MatchStatus::Upcoming,
        evaluated_at: None,
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    store.insert_match(&m).unwrap();
}

#[tokio::test]
async fn sweep_evaluates_backlog_then_goes_idle() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;
    store.upsert_team("team-a", "Team A")?;
    store.activate_submission(&Submission {
        id: "s1".into(),
        team_id: "team-a".into(),
        script_path: "/models/team-a/model.py".into(),
        active: true,
        status: SubmissionStatus::Ready,
        submitted_at: chrono::Utc::now().to_rfc3339(),
    })?;

    seed_match(&store, "m1", 1);
    seed_match(&store, "m2", 2);
    seed_match(&store, "m3", 3);
    store.set_actual_scores("m1", 170, 150)?;
    store.set_actual_scores("m2", 140, 160)?;
    // m3 stays without ground truth; the sweep must not touch it.

    let runner = Arc::new(CountingRunner {
        calls: AtomicUsize::new(0),
    });
    let sweeper = Sweeper::new(
        Evaluator {
            store: store.clone(),
            runner: runner.clone(),
            settings: EvalSettings::default(),
        },
        Duration::from_secs(3600),
    );

    let stats = sweeper.sweep_once().await?;
    assert_eq!(stats.scanned, 2);
    assert_eq!(stats.evaluated, 2);
    assert_eq!(stats.failed, 0);
    assert_eq!(runner.calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.count_predictions("m1", "team-a")?, 1);
    assert_eq!(store.count_predictions("m2", "team-a")?, 1);

    // Both matches now stamped: a second pass finds nothing and never
    // double-submits.
    let stats = sweeper.sweep_once().await?;
    assert_eq!(stats.scanned, 0);
    assert_eq!(runner.calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn sweep_counts_per_match_failures_without_aborting() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;
    // No submissions at all: every match rejects, the sweep survives.
    seed_match(&store, "m1", 1);
    store.set_actual_scores("m1", 170, 150)?;

    let sweeper = Sweeper::new(
        Evaluator {
            store: store.clone(),
            runner: Arc::new(CountingRunner {
                calls: AtomicUsize::new(0),
            }),
            settings: EvalSettings::default(),
        },
        Duration::from_secs(3600),
    );

    let stats = sweeper.sweep_once().await?;
    assert_eq!(stats.scanned, 1);
    assert_eq!(stats.evaluated, 0);
    assert_eq!(stats.failed, 1);
    Ok(())
}
