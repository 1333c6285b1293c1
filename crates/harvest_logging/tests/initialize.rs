use harvest_logging::{harvest_info, initialize, initialize_for_tests, LevelFilter, LogDestination};
use tempfile::TempDir;

#[test]
fn file_logger_creates_log_and_later_init_is_rejected() {
    let temp = TempDir::new().unwrap();
    let log_path = temp.path().join("harvest.log");

    assert!(initialize(LogDestination::File, LevelFilter::Info, &log_path));
    assert!(log_path.is_file());

    harvest_info!("window={} outcome={}", "2024-01-01", "fetched 3");
    let written = std::fs::read_to_string(&log_path).unwrap();
    assert!(written.contains("fetched 3"));

    // A logger is already installed; neither initializer replaces it.
    assert!(!initialize(
        LogDestination::Terminal,
        LevelFilter::Debug,
        &log_path
    ));
    initialize_for_tests();
}
