use crate::model::LeaderboardRow;
use crate::storage::store::Store;

/// Recompute every team's aggregate from the full set of success
/// predictions and replace the stored standings wholesale. Teams whose
/// predictions were all deleted fall back to zero rather than keeping a
/// stale total. Returns the number of teams with standings.
pub fn recompute(store: &Store) -> anyhow::Result<usize> {
    let standings = store.aggregate_success_predictions()?;
    store.replace_standings(&standings)?;
    Ok(standings.len())
}

/// Standings ordered ascending by cumulative error, ranks assigned at
/// read time. Teams with nothing evaluated sort last.
pub fn ranked(store: &Store) -> anyhow::Result<Vec<LeaderboardRow>> {
    store.ranked_leaderboard()
}
