use std::time::Duration;

use chrono::{TimeDelta, TimeZone, Utc};
use harvester_cli::config::{load_app_config, recent_search_horizon, AppConfig, RangeSpec};
use harvester_core::{ConfigError, ContentFilter, MIN_HORIZON_LAG};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[test]
fn empty_config_uses_defaults() {
    let config = AppConfig::parse("()").unwrap();
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.window_minutes, 60);
    assert_eq!(config.max_results, 10);
    assert_eq!(config.batch_size, 10);
    assert_eq!(config.filter, ContentFilter::default());
    assert_eq!(config.backoff.cooldown_secs, 1800);
}

#[test]
fn default_range_ends_an_hour_ago_within_the_horizon() {
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
    let (start, end) = RangeSpec::default().resolve(now).unwrap();
    assert_eq!(end, now - TimeDelta::hours(1));
    assert_eq!(start, now - recent_search_horizon());
}

#[test]
fn short_lookback_is_not_clamped() {
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
    let range = RangeSpec::Lookback {
        days: 1,
        hours: 0,
        end_offset_minutes: 0,
    };
    assert_eq!(range.resolve(now), Ok((now - TimeDelta::days(1), now)));
}

#[test]
fn full_config_becomes_settings() {
    let text = r#"(
        output_dir: "out",
        range: Explicit(start: "2024-03-01T00:00:00Z", end: "2024-03-02T00:00:00Z"),
        window_minutes: 30,
        max_results: 100,
        batch_size: 5,
        keywords: ["rust", "ferris crab"],
        filter: (language: None, exclude_retweets: true, exclude_quotes: false),
        backoff: (cooldown_secs: 900, max_transient_attempts: 2),
        record_budget: Some(500),
        pacing_secs: Some(3),
        api_base_url: Some("http://localhost:9000"),
    )"#;
    let config = AppConfig::parse(text).unwrap();
    let settings = config.settings(Utc::now()).unwrap();

    assert_eq!(settings.global_start, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    assert_eq!(settings.global_end, Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap());
    assert_eq!(settings.window_step, TimeDelta::minutes(30));
    assert_eq!(settings.max_results, 100);
    assert_eq!(settings.batch_size, 5);
    assert_eq!(settings.filter.language, None);
    assert!(!settings.filter.exclude_quotes);
    assert!(settings.filter.exclude_links);
    assert_eq!(settings.backoff.cooldown, Duration::from_secs(900));
    assert_eq!(settings.backoff.max_transient_attempts, 2);
    assert_eq!(settings.record_budget, Some(500));
    assert_eq!(settings.pacing, Some(Duration::from_secs(3)));
    assert_eq!(settings.continuous_poll, None);
    assert_eq!(settings.horizon_lag, TimeDelta::minutes(1));
    assert_eq!(config.keywords, vec!["rust", "ferris crab"]);
    assert_eq!(config.client_settings().base_url, "http://localhost:9000");
}

#[test]
fn invalid_values_are_rejected() {
    let config = AppConfig::parse("(batch_size: 11)").unwrap();
    assert_eq!(
        config.settings(Utc::now()),
        Err(ConfigError::BatchSize { size: 11, max: 10 })
    );

    let config = AppConfig::parse("(max_results: 5)").unwrap();
    assert!(matches!(
        config.settings(Utc::now()),
        Err(ConfigError::MaxResults { value: 5, .. })
    ));

    let inverted = r#"(range: Explicit(start: "2024-03-02T00:00:00Z", end: "2024-03-01T00:00:00Z"))"#;
    let config = AppConfig::parse(inverted).unwrap();
    assert!(matches!(
        config.settings(Utc::now()),
        Err(ConfigError::EmptyRange { .. })
    ));
}

#[test]
fn oversized_values_are_config_errors() {
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();

    let config = AppConfig::parse("(window_minutes: 9223372036854775807)").unwrap();
    assert_eq!(
        config.settings(now),
        Err(ConfigError::RangeOverflow("window_minutes"))
    );

    let far_back = "(range: Lookback(days: 100000000000, hours: 0, end_offset_minutes: 60))";
    let config = AppConfig::parse(far_back).unwrap();
    assert!(matches!(
        config.settings(now),
        Err(ConfigError::RangeOverflow(_))
    ));

    let far_offset = "(range: Lookback(days: 1, hours: 0, end_offset_minutes: 9223372036854775807))";
    let config = AppConfig::parse(far_offset).unwrap();
    assert!(matches!(
        config.settings(now),
        Err(ConfigError::RangeOverflow(_))
    ));
}

#[test]
fn range_ending_in_the_future_is_rejected() {
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
    let config =
        AppConfig::parse("(range: Lookback(days: 1, hours: 0, end_offset_minutes: -30))").unwrap();
    assert_eq!(config.settings(now), Err(ConfigError::NegativeEndOffset(-30)));
}

#[test]
fn continuous_settings_keep_a_lag_behind_the_clock() {
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();

    let config = AppConfig::parse("(continuous_poll_secs: Some(300))").unwrap();
    let settings = config.settings(now).unwrap();
    assert_eq!(settings.continuous_poll, Some(Duration::from_secs(300)));
    assert_eq!(settings.horizon_lag, TimeDelta::minutes(60));

    let no_offset = "(range: Lookback(days: 1, hours: 0, end_offset_minutes: 0), continuous_poll_secs: Some(300))";
    let settings = AppConfig::parse(no_offset).unwrap().settings(now).unwrap();
    assert_eq!(settings.horizon_lag, MIN_HORIZON_LAG);

    let config = AppConfig::parse("(continuous_poll_secs: Some(0))").unwrap();
    assert_eq!(config.settings(now), Err(ConfigError::ZeroPollInterval));
}

#[test]
fn load_reports_path_on_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("session.ron");
    std::fs::write(&path, "(window_minutes: \"soon\")").unwrap();
    let err = load_app_config(&path).unwrap_err();
    assert!(format!("{err:#}").contains("session.ron"));

    let missing = load_app_config(&temp.path().join("missing.ron")).unwrap_err();
    assert!(format!("{missing:#}").contains("missing.ron"));
}

#[test]
fn example_config_matches_defaults() {
    let config = AppConfig::parse(include_str!("../session.example.ron")).unwrap();
    assert_eq!(config, AppConfig::default());
}
