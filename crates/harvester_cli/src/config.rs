use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use harvester_core::{
    BackoffPolicy, ConfigError, ContentFilter, HarvestSettings, MIN_HORIZON_LAG,
};
use harvester_engine::ClientSettings;
use serde::{Deserialize, Serialize};

/// How far back recent search reaches.
pub fn recent_search_horizon() -> TimeDelta {
    TimeDelta::days(6) + TimeDelta::hours(20)
}

/// Global harvest range, either relative to launch time or fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeSpec {
    Lookback {
        days: i64,
        hours: i64,
        end_offset_minutes: i64,
    },
    Explicit {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl Default for RangeSpec {
    fn default() -> Self {
        RangeSpec::Lookback {
            days: 6,
            hours: 20,
            end_offset_minutes: 60,
        }
    }
}

impl RangeSpec {
    /// Absolute bounds. Lookback starts never reach past the search horizon.
    pub fn resolve(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), ConfigError> {
        match self {
            RangeSpec::Lookback {
                days,
                hours,
                end_offset_minutes,
            } => {
                if *end_offset_minutes < 0 {
                    return Err(ConfigError::NegativeEndOffset(*end_offset_minutes));
                }
                let end = minutes(*end_offset_minutes, "range end offset")
                    .and_then(|offset| checked_sub(now, offset, "range end"))?;
                let span = TimeDelta::try_days(*days)
                    .zip(TimeDelta::try_hours(*hours))
                    .and_then(|(days, hours)| days.checked_add(&hours))
                    .ok_or(ConfigError::RangeOverflow("lookback"))?;
                let start = checked_sub(end, span, "range start")?;
                let earliest = checked_sub(now, recent_search_horizon(), "range start")?;
                Ok((start.max(earliest), end))
            }
            RangeSpec::Explicit { start, end } => Ok((*start, *end)),
        }
    }

    /// Lag kept behind the clock once a continuous session catches up.
    fn horizon_lag(&self) -> Result<TimeDelta, ConfigError> {
        match self {
            RangeSpec::Lookback {
                end_offset_minutes, ..
            } => Ok(minutes(*end_offset_minutes, "range end offset")?.max(MIN_HORIZON_LAG)),
            RangeSpec::Explicit { .. } => {
                Ok(HarvestSettings::new(DateTime::UNIX_EPOCH, DateTime::UNIX_EPOCH).horizon_lag)
            }
        }
    }
}

fn minutes(value: i64, what: &'static str) -> Result<TimeDelta, ConfigError> {
    TimeDelta::try_minutes(value).ok_or(ConfigError::RangeOverflow(what))
}

fn checked_sub(
    at: DateTime<Utc>,
    delta: TimeDelta,
    what: &'static str,
) -> Result<DateTime<Utc>, ConfigError> {
    at.checked_sub_signed(delta)
        .ok_or(ConfigError::RangeOverflow(what))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub cooldown_secs: u64,
    pub transient_base_secs: u64,
    pub transient_max_secs: u64,
    pub max_transient_attempts: u32,
    pub max_cooldowns: Option<u32>,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        let policy = BackoffPolicy::default();
        Self {
            cooldown_secs: policy.cooldown.as_secs(),
            transient_base_secs: policy.transient_base_delay.as_secs(),
            transient_max_secs: policy.transient_max_delay.as_secs(),
            max_transient_attempts: policy.max_transient_attempts,
            max_cooldowns: policy.max_cooldowns,
        }
    }
}

impl From<&BackoffConfig> for BackoffPolicy {
    fn from(config: &BackoffConfig) -> Self {
        BackoffPolicy {
            cooldown: Duration::from_secs(config.cooldown_secs),
            transient_base_delay: Duration::from_secs(config.transient_base_secs),
            transient_max_delay: Duration::from_secs(config.transient_max_secs),
            max_transient_attempts: config.max_transient_attempts,
            max_cooldowns: config.max_cooldowns,
        }
    }
}

/// Session config as written in a RON file. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub output_dir: PathBuf,
    pub credentials_dir: PathBuf,
    pub range: RangeSpec,
    pub window_minutes: i64,
    pub max_results: u32,
    pub batch_size: usize,
    pub keywords: Vec<String>,
    pub filter: ContentFilter,
    pub backoff: BackoffConfig,
    pub record_budget: Option<u64>,
    pub pacing_secs: Option<u64>,
    pub max_write_attempts: u32,
    pub continuous_poll_secs: Option<u64>,
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let defaults = HarvestSettings::new(DateTime::UNIX_EPOCH, DateTime::UNIX_EPOCH);
        Self {
            output_dir: PathBuf::from("shards"),
            credentials_dir: PathBuf::from("credentials"),
            range: RangeSpec::default(),
            window_minutes: defaults.window_step.num_minutes(),
            max_results: defaults.max_results,
            batch_size: defaults.batch_size,
            keywords: Vec::new(),
            filter: ContentFilter::default(),
            backoff: BackoffConfig::default(),
            record_budget: None,
            pacing_secs: None,
            max_write_attempts: defaults.max_write_attempts,
            continuous_poll_secs: None,
            api_base_url: None,
            request_timeout_secs: None,
        }
    }
}

impl AppConfig {
    pub fn parse(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    /// Resolve against `now` and validate.
    pub fn settings(&self, now: DateTime<Utc>) -> Result<HarvestSettings, ConfigError> {
        let (start, end) = self.range.resolve(now)?;
        let settings = HarvestSettings {
            window_step: minutes(self.window_minutes, "window_minutes")?,
            max_results: self.max_results,
            batch_size: self.batch_size,
            filter: self.filter.clone(),
            backoff: BackoffPolicy::from(&self.backoff),
            record_budget: self.record_budget,
            pacing: self.pacing_secs.map(Duration::from_secs),
            max_write_attempts: self.max_write_attempts,
            continuous_poll: self.continuous_poll_secs.map(Duration::from_secs),
            horizon_lag: self.range.horizon_lag()?,
            ..HarvestSettings::new(start, end)
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn client_settings(&self) -> ClientSettings {
        let mut settings = ClientSettings::default();
        if let Some(base_url) = &self.api_base_url {
            settings.base_url = base_url.clone();
        }
        if let Some(secs) = self.request_timeout_secs {
            settings.request_timeout = Duration::from_secs(secs);
        }
        settings
    }
}

pub fn load_app_config(path: &Path) -> Result<AppConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    AppConfig::parse(&text).with_context(|| format!("cannot parse config file {}", path.display()))
}
