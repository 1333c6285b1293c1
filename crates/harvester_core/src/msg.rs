use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::{FetchError, TweetRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Kick off the session.
    Start,
    /// The in-flight query returned records in provider order.
    FetchSucceeded(Vec<TweetRecord>),
    /// The in-flight query failed.
    FetchFailed(FetchError),
    /// A requested sleep finished at `now`.
    SleepElapsed { now: DateTime<Utc> },
    /// The pending shard is on disk (freshly written or already present).
    ShardPersisted { path: PathBuf },
    /// The pending shard could not be written.
    ShardWriteFailed { message: String },
    /// Stop as soon as possible.
    Cancel,
}
