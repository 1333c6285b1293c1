use chrono::{DateTime, Utc};
use harvester_core::TimeWindow;

pub const SHARD_EXTENSION: &str = "csv";

/// Deterministic shard name: `{batch}_tweets_{start}_to_{end}.csv`.
///
/// Timestamps render as `2024-03-01_060000Z` so names stay free of `:` on every
/// filesystem. Keyword sessions have no batch and drop the prefix.
pub fn shard_filename(batch_index: Option<u32>, window: &TimeWindow) -> String {
    let start = compact_timestamp(window.start());
    let end = compact_timestamp(window.end());
    match batch_index {
        Some(index) => format!("{index}_tweets_{start}_to_{end}.{SHARD_EXTENSION}"),
        None => format!("tweets_{start}_to_{end}.{SHARD_EXTENSION}"),
    }
}

fn compact_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d_%H%M%SZ").to_string()
}
