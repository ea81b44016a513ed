pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS matches (
  id TEXT PRIMARY KEY,
  match_number INTEGER NOT NULL,
  team1 TEXT NOT NULL,
  team2 TEXT NOT NULL,
  venue TEXT NOT NULL,
  toss_winner TEXT NOT NULL DEFAULT '',
  toss_decision TEXT NOT NULL DEFAULT '',
  innings1_batting TEXT,
  innings1_bowling TEXT,
  innings2_batting TEXT,
  innings2_bowling TEXT,
  actual_runs_i1 INTEGER,
  actual_runs_i2 INTEGER,
  status TEXT NOT NULL DEFAULT 'upcoming',
  evaluated_at TEXT,
  created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS teams (
  id TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  cumulative_error INTEGER NOT NULL DEFAULT 0,
  matches_evaluated INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS submissions (
  id TEXT PRIMARY KEY,
  team_id TEXT NOT NULL REFERENCES teams(id),
  script_path TEXT NOT NULL,
  active INTEGER NOT NULL DEFAULT 0,
  status TEXT NOT NULL DEFAULT 'ready',
  submitted_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS predictions (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  match_id TEXT NOT NULL REFERENCES matches(id),
  team_id TEXT NOT NULL REFERENCES teams(id),
  submission_id TEXT NOT NULL,
  predicted_i1 INTEGER,
  predicted_i2 INTEGER,
  error_i1 INTEGER NOT NULL,
  error_i2 INTEGER NOT NULL,
  total_error INTEGER NOT NULL,
  duration_ms INTEGER NOT NULL,
  status TEXT NOT NULL,
  log_tail TEXT NOT NULL DEFAULT '',
  error_code TEXT,
  evaluated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_predictions_match_team ON predictions(match_id, team_id);
CREATE INDEX IF NOT EXISTS idx_submissions_team_active ON submissions(team_id, active);
"#;
