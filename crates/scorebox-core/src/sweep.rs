use crate::engine::evaluator::Evaluator;
use std::time::Duration;

/// Periodic scan for matches that have ground truth but no evaluation
/// timestamp. The delete-before-insert rule in the orchestrator makes a
/// sweep that overlaps a manual trigger safe: the pair is never
/// double-recorded.
pub struct Sweeper {
    pub evaluator: Evaluator,
    pub interval: Duration,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SweepStats {
    pub scanned: usize,
    pub evaluated: usize,
    pub failed: usize,
}

impl Sweeper {
    pub fn new(evaluator: Evaluator, interval: Duration) -> Self {
        Self {
            evaluator,
            interval,
        }
    }

    /// One pass over the backlog. Per-match failures are logged and
    /// counted, never fatal for the sweep.
    pub async fn sweep_once(&self) -> anyhow::Result<SweepStats> {
        let pending = self.evaluator.store.unevaluated_completed()?;
        let mut stats = SweepStats {
            scanned: pending.len(),
            ..Default::default()
        };

        if pending.is_empty() {
            tracing::debug!("sweep found no unevaluated completed matches");
            return Ok(stats);
        }

        tracing::info!(pending = pending.len(), "sweep found unevaluated matches");
        for m in pending {
            match self.evaluator.evaluate_match(&m.id).await {
                Ok(report) => {
                    stats.evaluated += 1;
                    tracing::info!(
                        match_id = %m.id,
                        teams = report.predictions.len(),
                        "sweep evaluated match"
                    );
                }
                Err(e) => {
                    stats.failed += 1;
                    tracing::warn!(match_id = %m.id, error = %e, "sweep evaluation failed");
                }
            }
        }
        Ok(stats)
    }

    /// Run forever at the configured interval. The first tick fires
    /// immediately.
    pub async fn run(&self) -> anyhow::Result<()> {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            if let Err(e) = self.sweep_once().await {
                tracing::warn!(error = %e, "sweep pass failed");
            }
        }
    }
}
