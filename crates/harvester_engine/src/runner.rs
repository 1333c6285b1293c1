use std::collections::VecDeque;
use std::sync::Arc;

use harvest_logging::{harvest_debug, harvest_error, harvest_info, harvest_warn};
use harvester_core::{
    update, AttemptOutcome, AttemptReport, Effect, FetchQuery, Msg, SessionReport, SessionState,
    SessionStatus, Shard, SleepReason,
};
use tokio_util::sync::CancellationToken;

use crate::client::SearchClient;
use crate::events::{EventSink, HarvestEvent, NullEventSink};
use crate::executor::FetchExecutor;
use crate::shard::{ShardWrite, ShardWriter};
use crate::sleep::{system_clock, Clock, Sleeper, TokioSleeper};

/// Drives one `SessionState` to a terminal status by executing the effects
/// `update` asks for and feeding the outcomes back as messages.
///
/// Fetches and sleeps race the cancellation token, so a cancelled session stops
/// without waiting out a cooldown.
pub struct SessionRunner<C, S = TokioSleeper> {
    executor: FetchExecutor<C>,
    writer: ShardWriter,
    sleeper: S,
    clock: Clock,
    events: Arc<dyn EventSink>,
    cancel: CancellationToken,
}

impl<C: SearchClient> SessionRunner<C, TokioSleeper> {
    pub fn new(client: C, writer: ShardWriter) -> Self {
        Self::with_sleeper(client, writer, TokioSleeper)
    }
}

impl<C: SearchClient, S: Sleeper> SessionRunner<C, S> {
    pub fn with_sleeper(client: C, writer: ShardWriter, sleeper: S) -> Self {
        Self {
            executor: FetchExecutor::new(client),
            writer,
            sleeper,
            clock: system_clock(),
            events: Arc::new(NullEventSink),
            cancel: CancellationToken::new(),
        }
    }

    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn client(&self) -> &C {
        self.executor.client()
    }

    pub async fn run(&self, state: SessionState) -> SessionReport {
        let batch_index = state.batch_index();
        let authors = state.remaining_authors().len();
        harvest_info!(
            "session {} starting at {} ({} authors)",
            batch_label(batch_index),
            state.current_window().start(),
            authors
        );
        self.events.emit(HarvestEvent::SessionStarted {
            batch_index,
            authors,
        });

        let mut state = state;
        let mut inbox = VecDeque::from([Msg::Start]);
        while let Some(msg) = inbox.pop_front() {
            let seen = state.attempts().len();
            let persisted = state.shards().len();
            let (next, effects) = update(state, msg);
            state = next;

            for attempt in &state.attempts()[seen..] {
                log_attempt(attempt);
                self.events.emit(HarvestEvent::Attempt(attempt.clone()));
            }
            if state.attempts().len() > seen || state.shards().len() > persisted {
                let view = state.view();
                harvest_debug!(
                    "session {}: {} posts, {} shards, {} authors left",
                    batch_label(batch_index),
                    view.records_pulled,
                    view.shards_written,
                    view.remaining_authors
                );
                self.events.emit(HarvestEvent::Progress(view));
            }
            for effect in effects {
                if let Some(reply) = self.execute(batch_index, effect).await {
                    inbox.push_back(reply);
                }
            }
        }

        state.into_report()
    }

    async fn execute(&self, batch_index: Option<u32>, effect: Effect) -> Option<Msg> {
        match effect {
            Effect::Fetch(query) => Some(self.fetch(&query).await),
            Effect::Sleep { duration, reason } => {
                log_sleep(batch_index, duration, reason);
                self.events.emit(HarvestEvent::Sleeping { duration, reason });
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => Some(Msg::Cancel),
                    _ = self.sleeper.sleep(duration) => Some(Msg::SleepElapsed { now: (self.clock)() }),
                }
            }
            Effect::WriteShard(shard) => Some(self.write(&shard)),
            Effect::Finished(status) => {
                match &status {
                    SessionStatus::Aborted(reason) => {
                        harvest_error!("session {} aborted: {reason}", batch_label(batch_index))
                    }
                    _ => harvest_info!("session {} completed", batch_label(batch_index)),
                }
                self.events.emit(HarvestEvent::SessionFinished {
                    batch_index,
                    status,
                });
                None
            }
        }
    }

    async fn fetch(&self, query: &FetchQuery) -> Msg {
        harvest_debug!("query: {}", query.query_string());
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Msg::Cancel,
            result = self.executor.fetch(query) => match result {
                Ok(records) => Msg::FetchSucceeded(records),
                Err(err) => Msg::FetchFailed(err),
            },
        }
    }

    fn write(&self, shard: &Shard) -> Msg {
        let batch_index = shard.batch_index;
        match self.writer.write(shard) {
            Ok(ShardWrite::Written(path)) => {
                self.events.emit(HarvestEvent::ShardWritten {
                    batch_index,
                    path: path.clone(),
                });
                Msg::ShardPersisted { path }
            }
            Ok(ShardWrite::AlreadyPresent(path)) => {
                self.events.emit(HarvestEvent::ShardAlreadyPresent {
                    batch_index,
                    path: path.clone(),
                });
                Msg::ShardPersisted { path }
            }
            Ok(ShardWrite::SkippedEmpty) => Msg::ShardWriteFailed {
                message: "refusing to persist an empty shard".to_string(),
            },
            Err(err) => {
                harvest_error!(
                    "could not write shard for session {}: {err}",
                    batch_label(batch_index)
                );
                Msg::ShardWriteFailed {
                    message: err.to_string(),
                }
            }
        }
    }
}

fn batch_label(batch_index: Option<u32>) -> String {
    match batch_index {
        Some(index) => format!("batch {index}"),
        None => "keywords".to_string(),
    }
}

fn log_attempt(attempt: &AttemptReport) {
    let label = batch_label(attempt.batch_index);
    let start = attempt.window.start();
    let end = attempt.window.end();
    match &attempt.outcome {
        AttemptOutcome::Fetched { records } => {
            harvest_info!("{label} {start} to {end}: fetched {records} posts")
        }
        AttemptOutcome::RateLimited => harvest_warn!("{label} {start} to {end}: rate limited"),
        AttemptOutcome::Transient(message) => {
            harvest_warn!("{label} {start} to {end}: transient failure: {message}")
        }
        AttemptOutcome::Fatal(message) => {
            harvest_error!("{label} {start} to {end}: fatal failure: {message}")
        }
    }
}

fn log_sleep(batch_index: Option<u32>, duration: std::time::Duration, reason: SleepReason) {
    let label = batch_label(batch_index);
    match reason {
        SleepReason::Cooldown => {
            harvest_warn!("{label}: cooling down for {}s", duration.as_secs())
        }
        SleepReason::TransientRetry { attempt } => harvest_warn!(
            "{label}: retry {attempt} in {}s",
            duration.as_secs()
        ),
        SleepReason::Pacing => harvest_debug!("{label}: pacing {}ms", duration.as_millis()),
        SleepReason::Horizon => harvest_debug!(
            "{label}: caught up with the horizon, polling again in {}s",
            duration.as_secs()
        ),
    }
}
