//! Harvester core: pure session state machine and the values it works on.
mod backoff;
mod effect;
mod error;
mod msg;
mod query;
mod queue;
mod record;
mod settings;
mod state;
mod update;
mod view_model;
mod window;

pub use backoff::{BackoffController, BackoffDecision, BackoffPolicy, BackoffState, WaitReason};
pub use effect::{Effect, SleepReason};
pub use error::{ConfigError, FetchError};
pub use msg::Msg;
pub use query::{
    AuthorBatch, ContentFilter, FetchQuery, QueryTarget, MAX_AUTHORS_PER_QUERY,
    MAX_RESULTS_PER_CALL, MIN_RESULTS_PER_CALL, TWEET_FIELDS,
};
pub use queue::{AuthorId, AuthorQueue};
pub use record::{PublicMetrics, ReferencedTweet, TweetRecord};
pub use settings::{HarvestSettings, MIN_HORIZON_LAG};
pub use state::{
    AbortReason, AttemptOutcome, AttemptReport, Phase, SessionReport, SessionState,
    SessionStatus, Shard,
};
pub use update::update;
pub use view_model::SessionView;
pub use window::{TimeWindow, WindowCursor};
