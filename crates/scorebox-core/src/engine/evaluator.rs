use crate::config::EvalSettings;
use crate::input;
use crate::model::{MatchRecord, ParsedPrediction, Prediction, PredictionStatus, Submission};
use crate::sandbox::ModelRunner;
use crate::scoring::{self, ErrorBreakdown};
use crate::storage::store::Store;
use std::path::Path;
use std::sync::Arc;

/// Orchestrates one match evaluation: build the input artifact, run
/// every active submission sequentially through the sandbox, score and
/// persist one prediction per team, stamp the match, recompute the
/// leaderboard. Per-submission failures become penalty predictions and
/// never abort the loop; only match-level rejections propagate.
pub struct Evaluator {
    pub store: Store,
    pub runner: Arc<dyn ModelRunner>,
    pub settings: EvalSettings,
}

#[derive(Debug, Clone)]
pub struct MatchReport {
    pub match_id: String,
    pub predictions: Vec<Prediction>,
}

impl Evaluator {
    pub async fn evaluate_match(&self, match_id: &str) -> anyhow::Result<MatchReport> {
        let m = self
            .store
            .get_match(match_id)?
            .ok_or_else(|| anyhow::anyhow!("unknown match {}", match_id))?;

        let (actual_i1, actual_i2) = match (m.actual_runs_i1, m.actual_runs_i2) {
            (Some(a1), Some(a2)) => (a1, a2),
            _ => anyhow::bail!(
                "match {} has no actual innings scores yet; enter both scores first",
                match_id
            ),
        };

        let submissions = self.store.active_ready_submissions()?;
        if submissions.is_empty() {
            anyhow::bail!("no active submissions to evaluate");
        }

        tracing::info!(
            match_id,
            match_number = m.match_number,
            teams = submissions.len(),
            actual_i1,
            actual_i2,
            "evaluating match"
        );

        // Dropped at the end of this function on every path.
        let artifact = input::build_input_csv(&m)?;

        let mut predictions = Vec::new();
        for sub in &submissions {
            match self
                .evaluate_submission(&m, sub, actual_i1, actual_i2, artifact.csv_path())
                .await
            {
                Ok(p) => {
                    tracing::info!(
                        team_id = %sub.team_id,
                        status = p.status.as_str(),
                        total_error = p.total_error,
                        duration_ms = p.duration_ms,
                        "submission evaluated"
                    );
                    predictions.push(p);
                }
                Err(e) => {
                    // Isolate: one team's persistence failure must not
                    // starve the remaining teams of their evaluation.
                    tracing::warn!(team_id = %sub.team_id, error = %e, "submission evaluation failed");
                }
            }
        }

        self.store.stamp_evaluated(match_id)?;
        let teams = crate::leaderboard::recompute(&self.store)?;
        tracing::info!(match_id, teams, "match evaluation complete, leaderboard updated");

        Ok(MatchReport {
            match_id: match_id.to_string(),
            predictions,
        })
    }

    async fn evaluate_submission(
        &self,
        m: &MatchRecord,
        sub: &Submission,
        actual_i1: i64,
        actual_i2: i64,
        input_csv: &Path,
    ) -> anyhow::Result<Prediction> {
        // Delete-then-insert keeps (match, team) unique across re-runs.
        let stale = self.store.delete_predictions_for(&m.id, &sub.team_id)?;
        if stale > 0 {
            tracing::debug!(team_id = %sub.team_id, stale, "removed stale predictions");
        }

        let outcome = self
            .runner
            .run(Path::new(&sub.script_path), input_csv)
            .await;

        let (predicted_i1, predicted_i2) = resolve_innings(&outcome.predictions);

        let error = match (outcome.succeeded(), predicted_i1, predicted_i2) {
            (true, Some(p1), Some(p2)) => scoring::innings_error(p1, p2, actual_i1, actual_i2),
            _ => ErrorBreakdown::penalty(),
        };

        let status = match &outcome.failure {
            None => PredictionStatus::Success,
            Some(f) => f.status(),
        };
        let error_code = outcome.failure.as_ref().map(|f| f.code());

        let prediction = Prediction {
            match_id: m.id.clone(),
            team_id: sub.team_id.clone(),
            submission_id: sub.id.clone(),
            predicted_i1,
            predicted_i2,
            error_i1: error.error_i1,
            error_i2: error.error_i2,
            total_error: error.total,
            duration_ms: outcome.duration_ms,
            status,
            log_tail: log_tail(&outcome.log, self.settings.log_tail_chars),
            error_code,
            evaluated_at: chrono::Utc::now().to_rfc3339(),
        };

        self.store.insert_prediction(&prediction)?;
        Ok(prediction)
    }
}

/// Map parsed rows onto the two innings. Resolution order: recognizable
/// identifiers first ("1"/"2" or an inning1/inning2 substring), then
/// positional [first, second] when exactly nothing matched, then a lone
/// row as innings 1 only.
pub fn resolve_innings(predictions: &[ParsedPrediction]) -> (Option<i64>, Option<i64>) {
    let mut i1 = None;
    let mut i2 = None;

    for p in predictions {
        let id = p.id.trim().to_ascii_lowercase();
        if id == "1" || id.contains("inning1") || id.contains("innings1") {
            i1 = Some(p.predicted_run);
        } else if id == "2" || id.contains("inning2") || id.contains("innings2") {
            i2 = Some(p.predicted_run);
        }
    }

    if i1.is_none() && i2.is_none() {
        if predictions.len() >= 2 {
            i1 = Some(predictions[0].predicted_run);
            i2 = Some(predictions[1].predicted_run);
        } else if let Some(first) = predictions.first() {
            i1 = Some(first.predicted_run);
        }
    }

    (i1, i2)
}

fn log_tail(log: &str, max_chars: usize) -> String {
    let count = log.chars().count();
    if count <= max_chars {
        return log.to_string();
    }
    log.chars().skip(count - max_chars).collect()
}
