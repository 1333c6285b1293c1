use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use crate::{
    AuthorBatch, AuthorId, AuthorQueue, BackoffController, ConfigError, ContentFilter, FetchQuery,
    HarvestSettings, QueryTarget, SessionView, TimeWindow, TweetRecord, WindowCursor,
};

/// Records of one successful, non-empty fetch together with where they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    /// `None` for keyword sessions.
    pub batch_index: Option<u32>,
    pub window: TimeWindow,
    pub records: Vec<TweetRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Fetching,
    Persisting,
    BackingOff,
    Pacing,
    AwaitingHorizon,
    Completed,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    Fatal(String),
    RetriesExhausted(String),
    ShardWrite {
        window: TimeWindow,
        batch_index: Option<u32>,
        records: usize,
        message: String,
    },
    InvalidQuery(String),
    Cancelled,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Fatal(message) => write!(f, "fatal provider error: {message}"),
            AbortReason::RetriesExhausted(message) => write!(f, "retries exhausted: {message}"),
            AbortReason::ShardWrite {
                window,
                batch_index,
                records,
                message,
            } => write!(
                f,
                "could not persist {records} records for batch {batch_index:?} window {} to {}: {message}",
                window.start(),
                window.end()
            ),
            AbortReason::InvalidQuery(message) => write!(f, "invalid query: {message}"),
            AbortReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Completed,
    Aborted(AbortReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Fetched { records: usize },
    RateLimited,
    Transient(String),
    Fatal(String),
}

/// One provider call made by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptReport {
    pub window: TimeWindow,
    pub batch_index: Option<u32>,
    pub authors: usize,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub status: SessionStatus,
    pub batch_index: Option<u32>,
    pub records_pulled: u64,
    pub shards: Vec<PathBuf>,
    pub attempts: Vec<AttemptReport>,
    pub cooldowns: u32,
    pub remaining_authors: Vec<AuthorId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionTarget {
    Keywords(Vec<String>),
    Authors(AuthorQueue),
}

/// Process-lifetime state of one harvest session. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub(crate) settings: HarvestSettings,
    pub(crate) target: SessionTarget,
    pub(crate) batch_index: Option<u32>,
    pub(crate) cursor: WindowCursor,
    pub(crate) backoff: BackoffController,
    pub(crate) phase: Phase,
    pub(crate) abort_reason: Option<AbortReason>,
    pub(crate) in_flight: Option<FetchQuery>,
    pub(crate) pending_shard: Option<Shard>,
    pub(crate) pending_satisfied: HashSet<AuthorId>,
    pub(crate) write_attempts: u32,
    pub(crate) records_pulled: u64,
    pub(crate) shards: Vec<PathBuf>,
    pub(crate) attempts: Vec<AttemptReport>,
}

impl SessionState {
    /// Session draining `authors`; `batch_index` ends up in shard names.
    pub fn for_authors(
        settings: HarvestSettings,
        batch_index: u32,
        authors: AuthorQueue,
    ) -> Result<Self, ConfigError> {
        if authors.is_empty() {
            return Err(ConfigError::NoAuthors);
        }
        Self::build(settings, SessionTarget::Authors(authors), Some(batch_index))
    }

    /// Session sweeping the range for posts matching any of `keywords`.
    pub fn for_keywords(
        settings: HarvestSettings,
        keywords: Vec<String>,
    ) -> Result<Self, ConfigError> {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|kw| kw.trim().to_string())
            .filter(|kw| !kw.is_empty())
            .collect();
        if keywords.is_empty() {
            return Err(ConfigError::NoKeywords);
        }
        Self::build(settings, SessionTarget::Keywords(keywords), None)
    }

    fn build(
        settings: HarvestSettings,
        target: SessionTarget,
        batch_index: Option<u32>,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let cursor = WindowCursor::new(
            settings.global_start,
            settings.global_end,
            settings.window_step,
        )?;
        let backoff = BackoffController::new(settings.backoff.clone());
        Ok(Self {
            settings,
            target,
            batch_index,
            cursor,
            backoff,
            phase: Phase::Idle,
            abort_reason: None,
            in_flight: None,
            pending_shard: None,
            pending_satisfied: HashSet::new(),
            write_attempts: 0,
            records_pulled: 0,
            shards: Vec::new(),
            attempts: Vec::new(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> SessionStatus {
        match (self.phase, &self.abort_reason) {
            (Phase::Completed, _) => SessionStatus::Completed,
            (Phase::Aborted, Some(reason)) => SessionStatus::Aborted(reason.clone()),
            (Phase::Aborted, None) => SessionStatus::Aborted(AbortReason::Cancelled),
            _ => SessionStatus::Running,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, Phase::Completed | Phase::Aborted)
    }

    pub fn current_window(&self) -> TimeWindow {
        self.cursor.current()
    }

    pub fn batch_index(&self) -> Option<u32> {
        self.batch_index
    }

    pub fn in_flight(&self) -> Option<&FetchQuery> {
        self.in_flight.as_ref()
    }

    pub fn remaining_authors(&self) -> &[AuthorId] {
        match &self.target {
            SessionTarget::Authors(queue) => queue.remaining(),
            SessionTarget::Keywords(_) => &[],
        }
    }

    pub fn records_pulled(&self) -> u64 {
        self.records_pulled
    }

    pub fn attempts(&self) -> &[AttemptReport] {
        &self.attempts
    }

    pub fn shards(&self) -> &[PathBuf] {
        &self.shards
    }

    pub fn cooldowns(&self) -> u32 {
        self.backoff.cooldowns()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            phase: self.phase,
            window: self.cursor.current(),
            batch_index: self.batch_index,
            remaining_authors: self.remaining_authors().len(),
            records_pulled: self.records_pulled,
            shards_written: self.shards.len(),
            attempts: self.attempts.len(),
            cooldowns: self.backoff.cooldowns(),
        }
    }

    pub fn into_report(self) -> SessionReport {
        let status = self.status();
        let cooldowns = self.backoff.cooldowns();
        let remaining_authors = self.remaining_authors().to_vec();
        SessionReport {
            status,
            batch_index: self.batch_index,
            records_pulled: self.records_pulled,
            shards: self.shards,
            attempts: self.attempts,
            cooldowns,
            remaining_authors,
        }
    }

    pub(crate) fn budget_left(&self) -> Option<u64> {
        self.settings
            .record_budget
            .map(|budget| budget.saturating_sub(self.records_pulled))
    }

    /// Nothing left to do regardless of the window position.
    pub(crate) fn target_satisfied(&self) -> bool {
        let queue_drained = matches!(&self.target, SessionTarget::Authors(queue) if queue.is_empty());
        queue_drained || self.budget_left() == Some(0)
    }

    pub(crate) fn build_query(&self) -> Result<FetchQuery, ConfigError> {
        let target = match &self.target {
            SessionTarget::Keywords(keywords) => QueryTarget::Keywords(keywords.clone()),
            SessionTarget::Authors(queue) => {
                QueryTarget::Authors(AuthorBatch::new(queue.batch(self.settings.batch_size))?)
            }
        };
        Ok(FetchQuery {
            window: self.cursor.current(),
            target,
            filter: self.filter().clone(),
            max_results: self.settings.max_results,
        })
    }

    fn filter(&self) -> &ContentFilter {
        &self.settings.filter
    }
}
