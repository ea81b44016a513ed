use scorebox_core::model::{
    InningsInfo, MatchRecord, MatchStatus, Prediction, PredictionStatus, Submission,
    SubmissionStatus,
};
use scorebox_core::storage::store::Store;
use tempfile::tempdir;

fn sample_match(id: &str, number: u32) -> MatchRecord {
    MatchRecord {
        id: id.into(),
        match_number: number,
        team1: "Aces".into(),
        team2: "Blazers".into(),
        venue: "Garden Oval".into(),
        toss_winner: "Aces".into(),
        toss_decision: "bat".into(),
        innings1: None,
        innings2: None,
        actual_runs_i1: None,
        actual_runs_i2: None,
        status: MatchStatus::Upcoming,
        evaluated_at: None,
        created_at: chrono::Utc::now().to_rfc3339(),
    }
}

fn sample_submission(id: &str, team_id: &str) -> Submission {
    Submission {
        id: id.into(),
        team_id: team_id.into(),
        script_path: format!("/models/{}/model.py", team_id),
        active: true,
        status: SubmissionStatus::Ready,
        submitted_at: chrono::Utc::now().to_rfc3339(),
    }
}

fn sample_prediction(match_id: &str, team_id: &str, total: i64) -> Prediction {
    Prediction {
        match_id: match_id.into(),
        team_id: team_id.into(),
        submission_id: "s1".into(),
        predicted_i1: Some(160),
        predicted_i2: Some(150),
        error_i1: total / 2,
        error_i2: total - total / 2,
        total_error: total,
        duration_ms: 1200,
        status: PredictionStatus::Success,
        log_tail: String::new(),
        error_code: None,
        evaluated_at: chrono::Utc::now().to_rfc3339(),
    }
}

#[test]
fn storage_lifecycle_on_disk() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let db_path = dir.path().join("scorebox.db");

    let store = Store::open(&db_path)?;
    store.init_schema()?;

    store.upsert_team("team-a", "Team A")?;
    store.insert_match(&sample_match("m1", 1))?;

    let m = store.get_match("m1")?.expect("match present");
    assert_eq!(m.match_number, 1);
    assert!(m.actual_runs_i1.is_none());
    assert!(m.evaluated_at.is_none());

    assert!(store.get_match("nope")?.is_none());
    Ok(())
}

#[test]
fn activate_submission_swaps_atomically() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;
    store.upsert_team("team-a", "Team A")?;

    store.activate_submission(&sample_submission("s1", "team-a"))?;
    store.activate_submission(&sample_submission("s2", "team-a"))?;
    store.activate_submission(&sample_submission("s3", "team-a"))?;

    let active = store.active_ready_submissions()?;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, "s3");

    // History is retained, just inactive.
    let all = store.submissions_for_team("team-a")?;
    assert_eq!(all.len(), 3);
    assert_eq!(all.iter().filter(|s| s.active).count(), 1);
    Ok(())
}

#[test]
fn one_active_submission_per_team_across_teams() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;
    store.upsert_team("team-a", "Team A")?;
    store.upsert_team("team-b", "Team B")?;

    store.activate_submission(&sample_submission("a1", "team-a"))?;
    store.activate_submission(&sample_submission("b1", "team-b"))?;
    store.activate_submission(&sample_submission("a2", "team-a"))?;

    let active = store.active_ready_submissions()?;
    assert_eq!(active.len(), 2);
    assert!(active.iter().any(|s| s.id == "a2"));
    assert!(active.iter().any(|s| s.id == "b1"));
    Ok(())
}

#[test]
fn score_entry_invalidates_prior_evaluation() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;
    store.upsert_team("team-a", "Team A")?;
    store.insert_match(&sample_match("m1", 1))?;

    store.insert_prediction(&sample_prediction("m1", "team-a", 13))?;
    store.stamp_evaluated("m1")?;
    assert!(store.get_match("m1")?.unwrap().evaluated_at.is_some());

    let deleted = store.set_actual_scores("m1", 170, 150)?;
    assert_eq!(deleted, 1);

    let m = store.get_match("m1")?.unwrap();
    assert_eq!(m.actual_runs_i1, Some(170));
    assert_eq!(m.actual_runs_i2, Some(150));
    assert_eq!(m.status, MatchStatus::Completed);
    assert!(m.evaluated_at.is_none());
    assert_eq!(store.count_predictions("m1", "team-a")?, 0);
    Ok(())
}

#[test]
fn attaching_match_data_invalidates_too() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;
    store.upsert_team("team-a", "Team A")?;
    store.insert_match(&sample_match("m1", 1))?;
    store.set_actual_scores("m1", 170, 150)?;
    store.insert_prediction(&sample_prediction("m1", "team-a", 13))?;
    store.stamp_evaluated("m1")?;

    let i1 = InningsInfo {
        batting_team: "Blazers".into(),
        bowling_team: "Aces".into(),
    };
    let i2 = InningsInfo {
        batting_team: "Aces".into(),
        bowling_team: "Blazers".into(),
    };
    store.attach_match_data("m1", &i1, &i2)?;

    let m = store.get_match("m1")?.unwrap();
    assert!(m.evaluated_at.is_none());
    assert_eq!(m.innings1.unwrap().batting_team, "Blazers");
    assert_eq!(store.count_predictions("m1", "team-a")?, 0);
    Ok(())
}

#[test]
fn unevaluated_completed_is_the_sweep_queue() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;
    store.insert_match(&sample_match("m1", 1))?;
    store.insert_match(&sample_match("m2", 2))?;
    store.insert_match(&sample_match("m3", 3))?;

    // m1 has scores and no timestamp, m2 has scores but is stamped,
    // m3 has no scores yet.
    store.set_actual_scores("m1", 170, 150)?;
    store.set_actual_scores("m2", 140, 160)?;
    store.stamp_evaluated("m2")?;

    let pending = store.unevaluated_completed()?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, "m1");
    Ok(())
}

#[test]
fn unknown_match_rejected_on_score_entry() {
    let store = Store::memory().unwrap();
    store.init_schema().unwrap();
    assert!(store.set_actual_scores("ghost", 1, 2).is_err());
}
