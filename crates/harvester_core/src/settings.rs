use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::{
    BackoffPolicy, ConfigError, ContentFilter, MAX_AUTHORS_PER_QUERY, MAX_RESULTS_PER_CALL,
    MIN_RESULTS_PER_CALL,
};

/// Validated knobs for one harvest session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSettings {
    pub global_start: DateTime<Utc>,
    pub global_end: DateTime<Utc>,
    pub window_step: TimeDelta,
    /// Per-call result cap sent to the provider.
    pub max_results: u32,
    /// Authors OR-ed into one query.
    pub batch_size: usize,
    pub filter: ContentFilter,
    pub backoff: BackoffPolicy,
    /// Stop the session once this many records were pulled.
    pub record_budget: Option<u64>,
    /// Pause between successive fetches.
    pub pacing: Option<Duration>,
    /// Attempts per shard before the session aborts.
    pub max_write_attempts: u32,
    /// Keep following the clock after reaching `global_end`, polling at this interval.
    pub continuous_poll: Option<Duration>,
    /// Distance kept between the moving horizon and the clock in continuous mode.
    pub horizon_lag: TimeDelta,
}

/// Recent search rejects an `end_time` closer than this to the request time.
pub const MIN_HORIZON_LAG: TimeDelta = TimeDelta::seconds(10);

impl HarvestSettings {
    pub fn new(global_start: DateTime<Utc>, global_end: DateTime<Utc>) -> Self {
        Self {
            global_start,
            global_end,
            window_step: TimeDelta::minutes(60),
            max_results: MIN_RESULTS_PER_CALL,
            batch_size: MAX_AUTHORS_PER_QUERY,
            filter: ContentFilter::default(),
            backoff: BackoffPolicy::default(),
            record_budget: None,
            pacing: None,
            max_write_attempts: 3,
            continuous_poll: None,
            horizon_lag: TimeDelta::minutes(1),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.global_start >= self.global_end {
            return Err(ConfigError::EmptyRange {
                start: self.global_start,
                end: self.global_end,
            });
        }
        if self.window_step <= TimeDelta::zero() {
            return Err(ConfigError::NonPositiveStep);
        }
        if !(MIN_RESULTS_PER_CALL..=MAX_RESULTS_PER_CALL).contains(&self.max_results) {
            return Err(ConfigError::MaxResults {
                value: self.max_results,
                min: MIN_RESULTS_PER_CALL,
                max: MAX_RESULTS_PER_CALL,
            });
        }
        if self.batch_size == 0 || self.batch_size > MAX_AUTHORS_PER_QUERY {
            return Err(ConfigError::BatchSize {
                size: self.batch_size,
                max: MAX_AUTHORS_PER_QUERY,
            });
        }
        if self.backoff.max_transient_attempts == 0 {
            return Err(ConfigError::NoTransientAttempts);
        }
        if self.max_write_attempts == 0 {
            return Err(ConfigError::NoWriteAttempts);
        }
        if self.continuous_poll == Some(Duration::ZERO) {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.horizon_lag < MIN_HORIZON_LAG {
            return Err(ConfigError::HorizonLag {
                lag_secs: self.horizon_lag.num_seconds(),
                min_secs: MIN_HORIZON_LAG.num_seconds(),
            });
        }
        Ok(())
    }
}
