use std::time::Duration;

use crate::FetchError;

/// Shortest cooldown taken from a provider reset hint.
const MIN_HINTED_COOLDOWN: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Fixed pause after a rate-limit response.
    pub cooldown: Duration,
    /// Delay before the first transient retry; doubles per consecutive failure.
    pub transient_base_delay: Duration,
    pub transient_max_delay: Duration,
    /// Consecutive transient failures tolerated for one query before giving up.
    pub max_transient_attempts: u32,
    /// Cooldowns tolerated over the session. `None` waits out every rate limit.
    pub max_cooldowns: Option<u32>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(30 * 60),
            transient_base_delay: Duration::from_secs(5),
            transient_max_delay: Duration::from_secs(5 * 60),
            max_transient_attempts: 5,
            max_cooldowns: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitReason {
    RateLimit,
    Transient { attempt: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackoffState {
    #[default]
    Idle,
    Waiting { reason: WaitReason, delay: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackoffDecision {
    /// Wait `delay`, then repeat the same query.
    Retry { delay: Duration, reason: WaitReason },
    /// Stop the session.
    GiveUp { reason: String },
}

/// `Idle -> Waiting -> Idle` retry governor for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffController {
    policy: BackoffPolicy,
    state: BackoffState,
    consecutive_transient: u32,
    cooldowns: u32,
}

impl BackoffController {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            state: BackoffState::Idle,
            consecutive_transient: 0,
            cooldowns: 0,
        }
    }

    pub fn state(&self) -> BackoffState {
        self.state
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Cooldowns entered so far in this session.
    pub fn cooldowns(&self) -> u32 {
        self.cooldowns
    }

    pub fn consecutive_transient(&self) -> u32 {
        self.consecutive_transient
    }

    pub fn on_failure(&mut self, error: &FetchError) -> BackoffDecision {
        match error {
            FetchError::Fatal(message) => {
                self.state = BackoffState::Idle;
                BackoffDecision::GiveUp {
                    reason: message.clone(),
                }
            }
            FetchError::RateLimited { retry_after } => {
                if let Some(max) = self.policy.max_cooldowns {
                    if self.cooldowns >= max {
                        self.state = BackoffState::Idle;
                        return BackoffDecision::GiveUp {
                            reason: format!("rate limited after {max} cooldowns"),
                        };
                    }
                }
                self.cooldowns += 1;
                let delay = match retry_after {
                    Some(hint) => (*hint).max(MIN_HINTED_COOLDOWN).min(self.policy.cooldown),
                    None => self.policy.cooldown,
                };
                self.enter_wait(WaitReason::RateLimit, delay)
            }
            FetchError::Transient(message) => {
                if self.consecutive_transient >= self.policy.max_transient_attempts {
                    self.state = BackoffState::Idle;
                    return BackoffDecision::GiveUp {
                        reason: format!(
                            "gave up after {} transient failures: {message}",
                            self.consecutive_transient
                        ),
                    };
                }
                self.consecutive_transient += 1;
                let attempt = self.consecutive_transient;
                let delay = self.transient_delay(attempt);
                self.enter_wait(WaitReason::Transient { attempt }, delay)
            }
        }
    }

    /// The wait finished; the caller is about to retry.
    pub fn on_wait_elapsed(&mut self) {
        self.state = BackoffState::Idle;
    }

    /// A call went through; transient failures start counting from zero again.
    pub fn on_success(&mut self) {
        self.state = BackoffState::Idle;
        self.consecutive_transient = 0;
    }

    fn transient_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.policy
            .transient_base_delay
            .saturating_mul(factor)
            .min(self.policy.transient_max_delay)
    }

    fn enter_wait(&mut self, reason: WaitReason, delay: Duration) -> BackoffDecision {
        self.state = BackoffState::Waiting { reason, delay };
        BackoffDecision::Retry { delay, reason }
    }
}
