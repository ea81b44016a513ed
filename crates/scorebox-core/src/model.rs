use serde::{Deserialize, Serialize};

/// One match fixture. Actual innings totals stay `None` until an admin
/// enters them; evaluation is refused while either is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: String,
    pub match_number: u32,
    pub team1: String,
    pub team2: String,
    pub venue: String,
    #[serde(default)]
    pub toss_winner: String,
    #[serde(default)]
    pub toss_decision: String,
    /// Innings metadata enriched from an uploaded ball-by-ball source.
    /// When absent, the input builder falls back to team1/team2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub innings1: Option<InningsInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub innings2: Option<InningsInfo>,
    pub actual_runs_i1: Option<i64>,
    pub actual_runs_i2: Option<i64>,
    pub status: MatchStatus,
    /// RFC 3339; `None` means not yet evaluated or invalidated.
    pub evaluated_at: Option<String>,
    pub created_at: String,
}

impl MatchRecord {
    pub fn has_actual_scores(&self) -> bool {
        self.actual_runs_i1.is_some() && self.actual_runs_i2.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InningsInfo {
    pub batting_team: String,
    pub bowling_team: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Upcoming,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Upcoming => "upcoming",
            MatchStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => MatchStatus::Completed,
            _ => MatchStatus::Upcoming,
        }
    }
}

/// A team's uploaded prediction script. At most one row per team is
/// active; uploading a new script atomically deactivates the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub team_id: String,
    pub script_path: String,
    pub active: bool,
    /// Always `ready` in this design: there is no per-team build phase,
    /// scripts run inside the shared base image.
    pub status: SubmissionStatus,
    pub submitted_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Ready,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        "ready"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionStatus {
    Success,
    Timeout,
    Error,
}

impl PredictionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionStatus::Success => "success",
            PredictionStatus::Timeout => "timeout",
            PredictionStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "success" => PredictionStatus::Success,
            "timeout" => PredictionStatus::Timeout,
            _ => PredictionStatus::Error,
        }
    }
}

/// Persisted outcome of running one team's script against one match.
/// At most one row exists per (match, team) pair; re-evaluation deletes
/// the old row before inserting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub match_id: String,
    pub team_id: String,
    pub submission_id: String,
    pub predicted_i1: Option<i64>,
    pub predicted_i2: Option<i64>,
    pub error_i1: i64,
    pub error_i2: i64,
    pub total_error: i64,
    pub duration_ms: u64,
    pub status: PredictionStatus,
    /// Bounded tail of the container's log artifact.
    pub log_tail: String,
    pub error_code: Option<String>,
    pub evaluated_at: String,
}

/// One row parsed from the script's output artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPrediction {
    pub id: String,
    pub predicted_run: i64,
}

/// Classified failure of a single sandbox run. Local to one submission;
/// the orchestrator converts it into a penalty, never aborts the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunFailure {
    ModelNotFound,
    Timeout,
    ExitCode(i64),
    EmptySubmission,
    Runtime(String),
}

impl RunFailure {
    pub fn code(&self) -> String {
        match self {
            RunFailure::ModelNotFound => "MODEL_NOT_FOUND".into(),
            RunFailure::Timeout => "TIMEOUT".into(),
            RunFailure::ExitCode(n) => format!("EXIT_CODE_{}", n),
            RunFailure::EmptySubmission => "EMPTY_SUBMISSION".into(),
            RunFailure::Runtime(msg) => format!("RUNTIME_ERROR: {}", msg),
        }
    }

    pub fn status(&self) -> PredictionStatus {
        match self {
            RunFailure::Timeout => PredictionStatus::Timeout,
            _ => PredictionStatus::Error,
        }
    }
}

/// What the sandbox adapter hands back to the orchestrator. Failures are
/// carried as data, not errors: a run that went wrong still reports its
/// log tail and elapsed time.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub predictions: Vec<ParsedPrediction>,
    pub log: String,
    pub duration_ms: u64,
    pub failure: Option<RunFailure>,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    pub fn success(
        predictions: Vec<ParsedPrediction>,
        log: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            predictions,
            log: log.into(),
            duration_ms,
            failure: None,
        }
    }

    pub fn failed(failure: RunFailure, log: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            predictions: Vec::new(),
            log: log.into(),
            duration_ms,
            failure: Some(failure),
        }
    }
}

/// Derived aggregate per team, replaced wholesale by the leaderboard
/// recompute. Never authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub team_id: String,
    pub cumulative_error: i64,
    pub matches_evaluated: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub team_id: String,
    pub team_name: String,
    pub cumulative_error: i64,
    pub matches_evaluated: i64,
}
