use std::time::Duration;

use harvester_core::{
    BackoffController, BackoffDecision, BackoffPolicy, BackoffState, FetchError, WaitReason,
};

fn policy() -> BackoffPolicy {
    BackoffPolicy {
        cooldown: Duration::from_secs(1800),
        transient_base_delay: Duration::from_secs(2),
        transient_max_delay: Duration::from_secs(10),
        max_transient_attempts: 4,
        max_cooldowns: None,
    }
}

#[test]
fn rate_limit_waits_fixed_cooldown_then_returns_to_idle() {
    let mut backoff = BackoffController::new(policy());
    let decision = backoff.on_failure(&FetchError::RateLimited { retry_after: None });

    assert_eq!(
        decision,
        BackoffDecision::Retry {
            delay: Duration::from_secs(1800),
            reason: WaitReason::RateLimit
        }
    );
    assert!(matches!(backoff.state(), BackoffState::Waiting { .. }));
    assert_eq!(backoff.cooldowns(), 1);

    backoff.on_wait_elapsed();
    assert_eq!(backoff.state(), BackoffState::Idle);
}

#[test]
fn reset_hint_shortens_but_never_extends_cooldown() {
    let mut backoff = BackoffController::new(policy());

    let short = backoff.on_failure(&FetchError::RateLimited {
        retry_after: Some(Duration::from_secs(90)),
    });
    assert!(matches!(short, BackoffDecision::Retry { delay, .. } if delay == Duration::from_secs(90)));

    let long = backoff.on_failure(&FetchError::RateLimited {
        retry_after: Some(Duration::from_secs(7200)),
    });
    assert!(matches!(long, BackoffDecision::Retry { delay, .. } if delay == Duration::from_secs(1800)));

    let already_reset = backoff.on_failure(&FetchError::RateLimited {
        retry_after: Some(Duration::ZERO),
    });
    assert!(matches!(already_reset, BackoffDecision::Retry { delay, .. } if delay == Duration::from_secs(1)));
}

#[test]
fn transient_failures_back_off_exponentially_and_are_bounded() {
    let mut backoff = BackoffController::new(policy());
    let error = FetchError::Transient("connection reset".to_string());

    let delays: Vec<_> = (0..4)
        .map(|_| match backoff.on_failure(&error) {
            BackoffDecision::Retry { delay, .. } => delay,
            other => panic!("expected retry, got {other:?}"),
        })
        .collect();
    assert_eq!(
        delays,
        vec![
            Duration::from_secs(2),
            Duration::from_secs(4),
            Duration::from_secs(8),
            Duration::from_secs(10),
        ]
    );

    assert!(matches!(
        backoff.on_failure(&error),
        BackoffDecision::GiveUp { .. }
    ));
}

#[test]
fn success_resets_transient_streak() {
    let mut backoff = BackoffController::new(policy());
    let error = FetchError::Transient("timeout".to_string());
    backoff.on_failure(&error);
    backoff.on_failure(&error);
    assert_eq!(backoff.consecutive_transient(), 2);

    backoff.on_success();
    assert_eq!(backoff.consecutive_transient(), 0);
    assert!(matches!(
        backoff.on_failure(&error),
        BackoffDecision::Retry { reason: WaitReason::Transient { attempt: 1 }, .. }
    ));
}

#[test]
fn fatal_is_never_retried() {
    let mut backoff = BackoffController::new(policy());
    let decision = backoff.on_failure(&FetchError::Fatal("401 Unauthorized".to_string()));
    assert_eq!(
        decision,
        BackoffDecision::GiveUp {
            reason: "401 Unauthorized".to_string()
        }
    );
    assert_eq!(backoff.state(), BackoffState::Idle);
    assert!(!FetchError::Fatal(String::new()).is_retryable());
}

#[test]
fn optional_cooldown_cap_gives_up() {
    let mut backoff = BackoffController::new(BackoffPolicy {
        max_cooldowns: Some(1),
        ..policy()
    });
    let limited = FetchError::RateLimited { retry_after: None };
    assert!(matches!(backoff.on_failure(&limited), BackoffDecision::Retry { .. }));
    assert!(matches!(backoff.on_failure(&limited), BackoffDecision::GiveUp { .. }));
}
