use std::path::PathBuf;

use harvest_logging::{harvest_info, harvest_warn};
use harvester_core::{
    AbortReason, AuthorId, AuthorQueue, ConfigError, HarvestSettings, SessionReport,
    SessionState, SessionStatus,
};

use crate::client::SearchClient;
use crate::runner::SessionRunner;
use crate::sleep::Sleeper;

/// Split `authors` into consecutive queues of at most `batch_size`, after
/// dropping blanks and repeats. Batch `n` of the plan is element `n - 1`.
pub fn partition_authors(authors: Vec<AuthorId>, batch_size: usize) -> Vec<AuthorQueue> {
    let unique = AuthorQueue::new(authors);
    unique
        .remaining()
        .chunks(batch_size.max(1))
        .map(|chunk| AuthorQueue::new(chunk.iter().cloned()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlanReport {
    pub sessions: Vec<SessionReport>,
    /// Batches never started because an earlier one stopped the plan.
    pub skipped_batches: Vec<u32>,
}

impl PlanReport {
    pub fn records_pulled(&self) -> u64 {
        self.sessions.iter().map(|s| s.records_pulled).sum()
    }

    pub fn shards(&self) -> impl Iterator<Item = &PathBuf> {
        self.sessions.iter().flat_map(|s| s.shards.iter())
    }

    pub fn aborts(&self) -> impl Iterator<Item = (Option<u32>, &AbortReason)> {
        self.sessions.iter().filter_map(|s| match &s.status {
            SessionStatus::Aborted(reason) => Some((s.batch_index, reason)),
            _ => None,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.skipped_batches.is_empty() && self.aborts().next().is_none()
    }
}

/// Whether a batch outcome makes the remaining batches pointless.
fn stops_plan(status: &SessionStatus) -> bool {
    matches!(
        status,
        SessionStatus::Aborted(
            AbortReason::Fatal(_) | AbortReason::Cancelled | AbortReason::ShardWrite { .. }
        )
    )
}

/// Run one session per author batch, sequentially, each over the full range.
pub async fn run_author_plan<C: SearchClient, S: Sleeper>(
    runner: &SessionRunner<C, S>,
    settings: &HarvestSettings,
    authors: Vec<AuthorId>,
) -> Result<PlanReport, ConfigError> {
    settings.validate()?;
    let batches = partition_authors(authors, settings.batch_size);
    if batches.is_empty() {
        return Err(ConfigError::NoAuthors);
    }
    let total = batches.len();
    harvest_info!("author plan: {total} batches of up to {}", settings.batch_size);

    let mut report = PlanReport::default();
    let mut batches = batches.into_iter().zip(1u32..);
    for (queue, batch_index) in batches.by_ref() {
        let state = SessionState::for_authors(settings.clone(), batch_index, queue)?;
        let session = runner.run(state).await;
        let stop = stops_plan(&session.status);
        report.sessions.push(session);
        if stop {
            break;
        }
    }
    report.skipped_batches = batches.map(|(_, index)| index).collect();
    if !report.skipped_batches.is_empty() {
        harvest_warn!(
            "author plan stopped early; {} of {total} batches not run",
            report.skipped_batches.len()
        );
    }
    Ok(report)
}

/// Run a single keyword session over the configured range.
pub async fn run_keywords<C: SearchClient, S: Sleeper>(
    runner: &SessionRunner<C, S>,
    settings: &HarvestSettings,
    keywords: Vec<String>,
) -> Result<SessionReport, ConfigError> {
    let state = SessionState::for_keywords(settings.clone(), keywords)?;
    Ok(runner.run(state).await)
}
