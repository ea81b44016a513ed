use crate::model::MatchRecord;
use anyhow::Context;
use std::path::{Path, PathBuf};

/// Scratch input artifact for one match evaluation. Lives in a
/// uniquely-named private temp directory so concurrent evaluations of
/// different matches never collide. The directory is removed on drop,
/// whatever path the evaluation took.
pub struct InputArtifact {
    dir: PathBuf,
    csv_path: PathBuf,
}

impl InputArtifact {
    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

impl Drop for InputArtifact {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            tracing::warn!(dir = %self.dir.display(), error = %e, "failed to remove input scratch dir");
        }
    }
}

/// Build the two-row test CSV for a match: one row per innings, with
/// innings metadata defaulted from the match's top-level team fields
/// when no ball-by-ball enrichment is present.
pub fn build_input_csv(m: &MatchRecord) -> anyhow::Result<InputArtifact> {
    let run_id = uuid::Uuid::new_v4().simple().to_string();
    let dir = std::env::temp_dir().join(format!("scorebox-input-{}", &run_id[..8]));
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create input scratch dir {}", dir.display()))?;
    let csv_path = dir.join("test_file.csv");

    let (i1_bat, i1_bowl) = match &m.innings1 {
        Some(i) => (i.batting_team.as_str(), i.bowling_team.as_str()),
        None => (m.team1.as_str(), m.team2.as_str()),
    };
    let (i2_bat, i2_bowl) = match &m.innings2 {
        Some(i) => (i.batting_team.as_str(), i.bowling_team.as_str()),
        None => (m.team2.as_str(), m.team1.as_str()),
    };

    let header = "id,venue,innings,batting_team,bowling_team,toss_winner,toss_decision";
    let row1 = format!(
        "1,{},1,{},{},{},{}",
        quote(&m.venue),
        quote(i1_bat),
        quote(i1_bowl),
        quote(&m.toss_winner),
        quote(&m.toss_decision),
    );
    let row2 = format!(
        "2,{},2,{},{},{},{}",
        quote(&m.venue),
        quote(i2_bat),
        quote(i2_bowl),
        quote(&m.toss_winner),
        quote(&m.toss_decision),
    );

    let content = format!("{}\n{}\n{}\n", header, row1, row2);
    std::fs::write(&csv_path, content)
        .with_context(|| format!("failed to write input csv {}", csv_path.display()))?;

    Ok(InputArtifact { dir, csv_path })
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}
