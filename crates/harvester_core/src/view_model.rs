use crate::{Phase, TimeWindow};

/// Snapshot used for progress reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub phase: Phase,
    pub window: TimeWindow,
    pub batch_index: Option<u32>,
    pub remaining_authors: usize,
    pub records_pulled: u64,
    pub shards_written: usize,
    pub attempts: usize,
    pub cooldowns: u32,
}
