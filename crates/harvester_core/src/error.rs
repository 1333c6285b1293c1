use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failure of one provider call, classified by what the session should do next.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Provider throttled the credential. Retry the same query after a cooldown.
    #[error("rate limited by provider")]
    RateLimited {
        /// Provider hint for how long until the limit resets.
        retry_after: Option<Duration>,
    },
    /// Network trouble or an unreadable response. Retry a bounded number of times.
    #[error("transient failure: {0}")]
    Transient(String),
    /// Authentication, authorization, quota or a rejected query. Never retried.
    #[error("fatal failure: {0}")]
    Fatal(String),
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::Fatal(_))
    }
}

/// Session parameters rejected before the loop starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("range is empty: start {start} is not before end {end}")]
    EmptyRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("window step must be positive")]
    NonPositiveStep,
    #[error("max results {value} outside {min}..={max}")]
    MaxResults { value: u32, min: u32, max: u32 },
    #[error("batch size {size} outside 1..={max}")]
    BatchSize { size: usize, max: usize },
    #[error("author batch is empty")]
    EmptyAuthorBatch,
    #[error("no authors to harvest")]
    NoAuthors,
    #[error("no keywords to search for")]
    NoKeywords,
    #[error("transient retry attempts must be at least 1")]
    NoTransientAttempts,
    #[error("shard write attempts must be at least 1")]
    NoWriteAttempts,
    #[error("continuous poll interval must be positive")]
    ZeroPollInterval,
    #[error("horizon lag of {lag_secs}s is below the provider minimum of {min_secs}s")]
    HorizonLag { lag_secs: i64, min_secs: i64 },
    #[error("range end offset {0} minutes would end the range in the future")]
    NegativeEndOffset(i64),
    #[error("{0} is out of range")]
    RangeOverflow(&'static str),
}
