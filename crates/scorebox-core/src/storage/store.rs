use crate::model::{
    InningsInfo, LeaderboardRow, MatchRecord, MatchStatus, Prediction, PredictionStatus,
    Submission, SubmissionStatus, TeamStanding,
};
use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct Store {
    pub conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path).context("failed to open sqlite db")?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(crate::storage::schema::DDL)?;
        Ok(())
    }

    // matches

    pub fn insert_match(&self, m: &MatchRecord) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO matches(id, match_number, team1, team2, venue, toss_winner, toss_decision,
                                 innings1_batting, innings1_bowling, innings2_batting, innings2_bowling,
                                 actual_runs_i1, actual_runs_i2, status, evaluated_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                m.id,
                m.match_number,
                m.team1,
                m.team2,
                m.venue,
                m.toss_winner,
                m.toss_decision,
                m.innings1.as_ref().map(|i| i.batting_team.clone()),
                m.innings1.as_ref().map(|i| i.bowling_team.clone()),
                m.innings2.as_ref().map(|i| i.batting_team.clone()),
                m.innings2.as_ref().map(|i| i.bowling_team.clone()),
                m.actual_runs_i1,
                m.actual_runs_i2,
                m.status.as_str(),
                m.evaluated_at,
                m.created_at,
            ],
        )
        .context("insert match")?;
        Ok(())
    }

    pub fn get_match(&self, match_id: &str) -> anyhow::Result<Option<MatchRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, match_number, team1, team2, venue, toss_winner, toss_decision,
                    innings1_batting, innings1_bowling, innings2_batting, innings2_bowling,
                    actual_runs_i1, actual_runs_i2, status, evaluated_at, created_at
             FROM matches WHERE id = ?1",
        )?;
        let row = stmt
            .query_row(params![match_id], row_to_match)
            .optional()?;
        Ok(row)
    }

    pub fn list_matches(&self) -> anyhow::Result<Vec<MatchRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, match_number, team1, team2, venue, toss_winner, toss_decision,
                    innings1_batting, innings1_bowling, innings2_batting, innings2_bowling,
                    actual_runs_i1, actual_runs_i2, status, evaluated_at, created_at
             FROM matches ORDER BY match_number ASC",
        )?;
        let rows = stmt.query_map([], row_to_match)?;
        let mut matches = Vec::new();
        for r in rows {
            matches.push(r?);
        }
        Ok(matches)
    }

    /// Set both actual innings totals. Marks the match completed, resets
    /// its evaluation timestamp and deletes its predictions in the same
    /// transaction: stale results must never survive a score change.
    pub fn set_actual_scores(
        &self,
        match_id: &str,
        actual_i1: i64,
        actual_i2: i64,
    ) -> anyhow::Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let updated = tx.execute(
            "UPDATE matches SET actual_runs_i1 = ?1, actual_runs_i2 = ?2,
                                status = 'completed', evaluated_at = NULL
             WHERE id = ?3",
            params![actual_i1, actual_i2, match_id],
        )?;
        if updated == 0 {
            anyhow::bail!("unknown match {}", match_id);
        }
        let deleted = tx.execute(
            "DELETE FROM predictions WHERE match_id = ?1",
            params![match_id],
        )?;
        tx.commit()?;
        Ok(deleted)
    }

    /// Attach innings enrichment from an uploaded ball-by-ball source.
    /// Input data changed, so the same invalidation cascade applies.
    pub fn attach_match_data(
        &self,
        match_id: &str,
        innings1: &InningsInfo,
        innings2: &InningsInfo,
    ) -> anyhow::Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let updated = tx.execute(
            "UPDATE matches SET innings1_batting = ?1, innings1_bowling = ?2,
                                innings2_batting = ?3, innings2_bowling = ?4,
                                evaluated_at = NULL
             WHERE id = ?5",
            params![
                innings1.batting_team,
                innings1.bowling_team,
                innings2.batting_team,
                innings2.bowling_team,
                match_id
            ],
        )?;
        if updated == 0 {
            anyhow::bail!("unknown match {}", match_id);
        }
        let deleted = tx.execute(
            "DELETE FROM predictions WHERE match_id = ?1",
            params![match_id],
        )?;
        tx.commit()?;
        Ok(deleted)
    }

    pub fn stamp_evaluated(&self, match_id: &str) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE matches SET evaluated_at = ?1 WHERE id = ?2",
            params![chrono::Utc::now().to_rfc3339(), match_id],
        )?;
        Ok(())
    }

    /// Matches with ground truth present but no evaluation timestamp:
    /// the scheduled sweep's work queue.
    pub fn unevaluated_completed(&self) -> anyhow::Result<Vec<MatchRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, match_number, team1, team2, venue, toss_winner, toss_decision,
                    innings1_batting, innings1_bowling, innings2_batting, innings2_bowling,
                    actual_runs_i1, actual_runs_i2, status, evaluated_at, created_at
             FROM matches
             WHERE actual_runs_i1 IS NOT NULL AND actual_runs_i2 IS NOT NULL
               AND evaluated_at IS NULL
             ORDER BY match_number ASC",
        )?;
        let rows = stmt.query_map([], row_to_match)?;
        let mut matches = Vec::new();
        for r in rows {
            matches.push(r?);
        }
        Ok(matches)
    }

    // teams

    pub fn upsert_team(&self, team_id: &str, name: &str) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO teams(id, name) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            params![team_id, name],
        )?;
        Ok(())
    }

    // submissions

    /// Register a new submission and make it the team's only active one,
    /// atomically: deactivate-all plus insert in a single transaction.
    pub fn activate_submission(&self, sub: &Submission) -> anyhow::Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE submissions SET active = 0 WHERE team_id = ?1 AND active = 1",
            params![sub.team_id],
        )?;
        tx.execute(
            "INSERT INTO submissions(id, team_id, script_path, active, status, submitted_at)
             VALUES (?1, ?2, ?3, 1, ?4, ?5)",
            params![
                sub.id,
                sub.team_id,
                sub.script_path,
                sub.status.as_str(),
                sub.submitted_at
            ],
        )
        .context("insert submission")?;
        tx.commit()?;
        Ok(())
    }

    /// The evaluation set: one active, ready submission per team.
    pub fn active_ready_submissions(&self) -> anyhow::Result<Vec<Submission>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, team_id, script_path, active, status, submitted_at
             FROM submissions
             WHERE active = 1 AND status = 'ready'
             ORDER BY submitted_at ASC, id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Submission {
                id: row.get(0)?,
                team_id: row.get(1)?,
                script_path: row.get(2)?,
                active: row.get::<_, i64>(3)? != 0,
                status: SubmissionStatus::Ready,
                submitted_at: row.get(5)?,
            })
        })?;
        let mut subs = Vec::new();
        for r in rows {
            subs.push(r?);
        }
        Ok(subs)
    }

    pub fn submissions_for_team(&self, team_id: &str) -> anyhow::Result<Vec<Submission>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, team_id, script_path, active, status, submitted_at
             FROM submissions WHERE team_id = ?1 ORDER BY submitted_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![team_id], |row| {
            Ok(Submission {
                id: row.get(0)?,
                team_id: row.get(1)?,
                script_path: row.get(2)?,
                active: row.get::<_, i64>(3)? != 0,
                status: SubmissionStatus::Ready,
                submitted_at: row.get(5)?,
            })
        })?;
        let mut subs = Vec::new();
        for r in rows {
            subs.push(r?);
        }
        Ok(subs)
    }

    // predictions

    /// Idempotency guard: at most one prediction per (match, team) pair,
    /// enforced by deleting before every insert.
    pub fn delete_predictions_for(&self, match_id: &str, team_id: &str) -> anyhow::Result<usize> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "DELETE FROM predictions WHERE match_id = ?1 AND team_id = ?2",
            params![match_id, team_id],
        )?;
        Ok(n)
    }

    pub fn insert_prediction(&self, p: &Prediction) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO predictions(match_id, team_id, submission_id, predicted_i1, predicted_i2,
                                     error_i1, error_i2, total_error, duration_ms, status,
                                     log_tail, error_code, evaluated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                p.match_id,
                p.team_id,
                p.submission_id,
                p.predicted_i1,
                p.predicted_i2,
                p.error_i1,
                p.error_i2,
                p.total_error,
                p.duration_ms as i64,
                p.status.as_str(),
                p.log_tail,
                p.error_code,
                p.evaluated_at,
            ],
        )
        .context("insert prediction")?;
        Ok(())
    }

    pub fn predictions_for_match(&self, match_id: &str) -> anyhow::Result<Vec<Prediction>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT match_id, team_id, submission_id, predicted_i1, predicted_i2,
                    error_i1, error_i2, total_error, duration_ms, status,
                    log_tail, error_code, evaluated_at
             FROM predictions WHERE match_id = ?1
             ORDER BY total_error ASC, team_id ASC",
        )?;
        let rows = stmt.query_map(params![match_id], row_to_prediction)?;
        let mut predictions = Vec::new();
        for r in rows {
            predictions.push(r?);
        }
        Ok(predictions)
    }

    pub fn count_predictions(&self, match_id: &str, team_id: &str) -> anyhow::Result<i64> {
        let conn = self.conn.lock().unwrap();
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM predictions WHERE match_id = ?1 AND team_id = ?2",
            params![match_id, team_id],
            |r| r.get(0),
        )?;
        Ok(n)
    }

    // leaderboard aggregates

    /// Sum of total error and distinct match count over all success
    /// predictions, grouped by team.
    pub fn aggregate_success_predictions(&self) -> anyhow::Result<Vec<TeamStanding>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT team_id, SUM(total_error), COUNT(*)
             FROM predictions WHERE status = 'success'
             GROUP BY team_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(TeamStanding {
                team_id: row.get(0)?,
                cumulative_error: row.get(1)?,
                matches_evaluated: row.get(2)?,
            })
        })?;
        let mut standings = Vec::new();
        for r in rows {
            standings.push(r?);
        }
        Ok(standings)
    }

    /// Wholesale replace of every team's aggregate: teams absent from
    /// the standings reset to zero, in the same transaction.
    pub fn replace_standings(&self, standings: &[TeamStanding]) -> anyhow::Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE teams SET cumulative_error = 0, matches_evaluated = 0",
            [],
        )?;
        {
            let mut stmt = tx.prepare(
                "UPDATE teams SET cumulative_error = ?1, matches_evaluated = ?2 WHERE id = ?3",
            )?;
            for s in standings {
                stmt.execute(params![s.cumulative_error, s.matches_evaluated, s.team_id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Ranked at read time, ascending by cumulative error. Teams with no
    /// evaluated matches sort last rather than claiming rank 1 on a
    /// default zero.
    pub fn ranked_leaderboard(&self) -> anyhow::Result<Vec<LeaderboardRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, cumulative_error, matches_evaluated
             FROM teams
             ORDER BY (matches_evaluated = 0) ASC, cumulative_error ASC, name ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;
        let mut board = Vec::new();
        for (i, r) in rows.enumerate() {
            let (team_id, team_name, cumulative_error, matches_evaluated) = r?;
            board.push(LeaderboardRow {
                rank: i + 1,
                team_id,
                team_name,
                cumulative_error,
                matches_evaluated,
            });
        }
        Ok(board)
    }
}

fn row_to_match(row: &rusqlite::Row<'_>) -> rusqlite::Result<MatchRecord> {
    let innings1 = match (
        row.get::<_, Option<String>>(7)?,
        row.get::<_, Option<String>>(8)?,
    ) {
        (Some(batting_team), Some(bowling_team)) => Some(InningsInfo {
            batting_team,
            bowling_team,
        }),
        _ => None,
    };
    let innings2 = match (
        row.get::<_, Option<String>>(9)?,
        row.get::<_, Option<String>>(10)?,
    ) {
        (Some(batting_team), Some(bowling_team)) => Some(InningsInfo {
            batting_team,
            bowling_team,
        }),
        _ => None,
    };
    Ok(MatchRecord {
        id: row.get(0)?,
        match_number: row.get(1)?,
        team1: row.get(2)?,
        team2: row.get(3)?,
        venue: row.get(4)?,
        toss_winner: row.get(5)?,
        toss_decision: row.get(6)?,
        innings1,
        innings2,
        actual_runs_i1: row.get(11)?,
        actual_runs_i2: row.get(12)?,
        status: MatchStatus::parse(&row.get::<_, String>(13)?),
        evaluated_at: row.get(14)?,
        created_at: row.get(15)?,
    })
}

fn row_to_prediction(row: &rusqlite::Row<'_>) -> rusqlite::Result<Prediction> {
    Ok(Prediction {
        match_id: row.get(0)?,
        team_id: row.get(1)?,
        submission_id: row.get(2)?,
        predicted_i1: row.get(3)?,
        predicted_i2: row.get(4)?,
        error_i1: row.get(5)?,
        error_i2: row.get(6)?,
        total_error: row.get(7)?,
        duration_ms: row.get::<_, i64>(8)? as u64,
        status: PredictionStatus::parse(&row.get::<_, String>(9)?),
        log_tail: row.get(10)?,
        error_code: row.get(11)?,
        evaluated_at: row.get(12)?,
    })
}
