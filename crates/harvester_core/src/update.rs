use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::state::SessionTarget;
use crate::{
    AbortReason, AttemptOutcome, AttemptReport, BackoffDecision, Effect, FetchError, Msg, Phase,
    SessionState, Shard, SleepReason, TweetRecord, WaitReason,
};

/// Pure update function: applies a message to the session and returns the effects to run.
///
/// Messages that do not fit the current phase are ignored. Terminal sessions ignore
/// everything.
pub fn update(mut state: SessionState, msg: Msg) -> (SessionState, Vec<Effect>) {
    if state.is_terminal() {
        return (state, Vec::new());
    }

    let effects = match (state.phase, msg) {
        (_, Msg::Cancel) => abort(&mut state, AbortReason::Cancelled),
        (Phase::Idle, Msg::Start) => schedule(&mut state, None),
        (Phase::Fetching, Msg::FetchSucceeded(records)) => on_fetched(&mut state, records),
        (Phase::Fetching, Msg::FetchFailed(error)) => on_fetch_failed(&mut state, error),
        (Phase::BackingOff, Msg::SleepElapsed { .. }) => {
            state.backoff.on_wait_elapsed();
            match state.in_flight.clone() {
                Some(query) => {
                    state.phase = Phase::Fetching;
                    vec![Effect::Fetch(query)]
                }
                None => schedule(&mut state, None),
            }
        }
        (Phase::Pacing | Phase::AwaitingHorizon, Msg::SleepElapsed { now }) => {
            schedule(&mut state, Some(now))
        }
        (Phase::Persisting, Msg::ShardPersisted { path }) => {
            state.shards.push(path);
            let satisfied = std::mem::take(&mut state.pending_satisfied);
            if let SessionTarget::Authors(queue) = &mut state.target {
                queue.mark_satisfied(&satisfied);
            }
            state.pending_shard = None;
            state.write_attempts = 0;
            finish_window(&mut state)
        }
        (Phase::Persisting, Msg::ShardWriteFailed { message }) => {
            on_write_failed(&mut state, message)
        }
        _ => Vec::new(),
    };

    (state, effects)
}

fn schedule(state: &mut SessionState, now: Option<DateTime<Utc>>) -> Vec<Effect> {
    if state.target_satisfied() {
        return complete(state);
    }

    if let (Some(now), Some(_)) = (now, state.settings.continuous_poll) {
        let horizon = now
            .checked_sub_signed(state.settings.horizon_lag)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        state.cursor.rearm(horizon);
    }
    if state.cursor.is_done() {
        return match state.settings.continuous_poll {
            Some(poll) => {
                state.phase = Phase::AwaitingHorizon;
                vec![Effect::Sleep {
                    duration: poll,
                    reason: SleepReason::Horizon,
                }]
            }
            None => complete(state),
        };
    }

    match state.build_query() {
        Ok(query) => {
            state.in_flight = Some(query.clone());
            state.phase = Phase::Fetching;
            vec![Effect::Fetch(query)]
        }
        Err(err) => abort(state, AbortReason::InvalidQuery(err.to_string())),
    }
}

fn on_fetched(state: &mut SessionState, mut records: Vec<TweetRecord>) -> Vec<Effect> {
    state.backoff.on_success();
    if let Some(left) = state.budget_left() {
        let left = usize::try_from(left).unwrap_or(usize::MAX);
        records.truncate(left);
    }

    let kept = records.len();
    record_attempt(state, AttemptOutcome::Fetched { records: kept });
    state.records_pulled += kept as u64;

    if records.is_empty() {
        return finish_window(state);
    }

    state.pending_satisfied = records
        .iter()
        .map(|record| record.author_id.clone())
        .collect::<HashSet<_>>();
    let shard = Shard {
        batch_index: state.batch_index,
        window: state.cursor.current(),
        records,
    };
    state.pending_shard = Some(shard.clone());
    state.write_attempts = 1;
    state.phase = Phase::Persisting;
    vec![Effect::WriteShard(shard)]
}

fn on_fetch_failed(state: &mut SessionState, error: FetchError) -> Vec<Effect> {
    let outcome = match &error {
        FetchError::RateLimited { .. } => AttemptOutcome::RateLimited,
        FetchError::Transient(message) => AttemptOutcome::Transient(message.clone()),
        FetchError::Fatal(message) => AttemptOutcome::Fatal(message.clone()),
    };
    record_attempt(state, outcome);

    match state.backoff.on_failure(&error) {
        BackoffDecision::Retry { delay, reason } => {
            state.phase = Phase::BackingOff;
            let reason = match reason {
                WaitReason::RateLimit => SleepReason::Cooldown,
                WaitReason::Transient { attempt } => SleepReason::TransientRetry { attempt },
            };
            vec![Effect::Sleep {
                duration: delay,
                reason,
            }]
        }
        BackoffDecision::GiveUp { reason } => match error {
            FetchError::Fatal(_) => abort(state, AbortReason::Fatal(reason)),
            _ => abort(state, AbortReason::RetriesExhausted(reason)),
        },
    }
}

fn on_write_failed(state: &mut SessionState, message: String) -> Vec<Effect> {
    let Some(shard) = state.pending_shard.clone() else {
        return Vec::new();
    };
    if state.write_attempts < state.settings.max_write_attempts {
        state.write_attempts += 1;
        return vec![Effect::WriteShard(shard)];
    }
    abort(
        state,
        AbortReason::ShardWrite {
            window: shard.window,
            batch_index: shard.batch_index,
            records: shard.records.len(),
            message,
        },
    )
}

/// The current window is covered; move on, optionally pausing first.
fn finish_window(state: &mut SessionState) -> Vec<Effect> {
    state.in_flight = None;
    state.cursor.advance();

    let more_to_fetch = !state.target_satisfied() && !state.cursor.is_done();
    match state.settings.pacing {
        Some(pacing) if more_to_fetch => {
            state.phase = Phase::Pacing;
            vec![Effect::Sleep {
                duration: pacing,
                reason: SleepReason::Pacing,
            }]
        }
        _ => schedule(state, None),
    }
}

fn record_attempt(state: &mut SessionState, outcome: AttemptOutcome) {
    let (window, authors) = match &state.in_flight {
        Some(query) => (query.window, query.authors().len()),
        None => (state.cursor.current(), 0),
    };
    state.attempts.push(AttemptReport {
        window,
        batch_index: state.batch_index,
        authors,
        outcome,
    });
}

fn complete(state: &mut SessionState) -> Vec<Effect> {
    state.phase = Phase::Completed;
    state.in_flight = None;
    vec![Effect::Finished(state.status())]
}

fn abort(state: &mut SessionState, reason: AbortReason) -> Vec<Effect> {
    state.phase = Phase::Aborted;
    state.abort_reason = Some(reason);
    vec![Effect::Finished(state.status())]
}
