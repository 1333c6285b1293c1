use std::time::Duration;

use crate::{FetchQuery, SessionStatus, Shard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Run one provider call; answer with `FetchSucceeded` or `FetchFailed`.
    Fetch(FetchQuery),
    /// Wait, then answer with `SleepElapsed`.
    Sleep { duration: Duration, reason: SleepReason },
    /// Persist a non-empty shard; answer with `ShardPersisted` or `ShardWriteFailed`.
    WriteShard(Shard),
    /// The session reached a terminal state.
    Finished(SessionStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepReason {
    Cooldown,
    TransientRetry { attempt: u32 },
    Pacing,
    Horizon,
}
