use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use harvester_core::{AttemptReport, SessionStatus, SessionView, SleepReason};

/// Progress of a running session, streamed as it happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestEvent {
    SessionStarted { batch_index: Option<u32>, authors: usize },
    Attempt(AttemptReport),
    /// Snapshot taken whenever an attempt is recorded or a shard persisted.
    Progress(SessionView),
    ShardWritten { batch_index: Option<u32>, path: PathBuf },
    ShardAlreadyPresent { batch_index: Option<u32>, path: PathBuf },
    Sleeping { duration: Duration, reason: SleepReason },
    SessionFinished { batch_index: Option<u32>, status: SessionStatus },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: HarvestEvent);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: HarvestEvent) {}
}

/// Forwards events to a channel; a dropped receiver is not an error.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: mpsc::Sender<HarvestEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<HarvestEvent>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::Receiver<HarvestEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: HarvestEvent) {
        let _ = self.tx.send(event);
    }
}
