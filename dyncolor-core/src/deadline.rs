//! Deadline guard for in-flight operations.
//!
//! The guard races an operation against a fixed deadline. Whichever finishes
//! first decides the outcome: the operation either completes naturally or is
//! dropped at the deadline, which closes any connection or buffer it owns.
//! Exactly one of the two happens per run.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

/// Default deadline for image loads
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// Stand-in for deadlines too large to represent as an instant
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// How a guarded operation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome<T> {
    /// The operation finished before the deadline
    Completed(T),
    /// The deadline elapsed and the operation was dropped
    Disposed,
}

impl<T> GuardOutcome<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            GuardOutcome::Completed(value) => Some(value),
            GuardOutcome::Disposed => None,
        }
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self, GuardOutcome::Disposed)
    }
}

/// Races operations against a deadline, optionally logging a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineGuard {
    deadline: Duration,
    tick: Option<Duration>,
}

impl Default for DeadlineGuard {
    fn default() -> Self {
        Self::new(DEFAULT_DEADLINE)
    }
}

impl DeadlineGuard {
    pub fn new(deadline: Duration) -> Self {
        Self {
            deadline,
            tick: None,
        }
    }

    /// Log the remaining time every `interval` while waiting. Ticks are
    /// informational only and never change the outcome.
    pub fn with_tick(mut self, interval: Duration) -> Self {
        self.tick = (!interval.is_zero()).then_some(interval);
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn tick(&self) -> Option<Duration> {
        self.tick
    }

    /// Run `operation` under the deadline.
    pub async fn run<F>(&self, operation: F) -> GuardOutcome<F::Output>
    where
        F: Future,
    {
        let outcome = match self.tick {
            None => match tokio::time::timeout(self.deadline, operation).await {
                Ok(value) => GuardOutcome::Completed(value),
                Err(_) => GuardOutcome::Disposed,
            },
            Some(interval) => {
                let operation = std::pin::pin!(operation);
                run_with_ticks(operation, self.deadline, interval).await
            }
        };

        if outcome.is_disposed() {
            tracing::debug!(
                deadline_ms = self.deadline.as_millis() as u64,
                "deadline elapsed, operation disposed"
            );
        }

        outcome
    }
}

/// `now + duration`, clamped far into the future instead of overflowing
fn instant_after(now: Instant, duration: Duration) -> Instant {
    now.checked_add(duration).unwrap_or_else(|| now + FAR_FUTURE)
}

async fn run_with_ticks<F>(
    mut operation: std::pin::Pin<&mut F>,
    deadline: Duration,
    interval: Duration,
) -> GuardOutcome<F::Output>
where
    F: Future,
{
    let now = Instant::now();
    let expires_at = instant_after(now, deadline);
    let mut ticker =
        tokio::time::interval_at(instant_after(now, interval), interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let expiry = tokio::time::sleep_until(expires_at);
    tokio::pin!(expiry);

    loop {
        tokio::select! {
            biased;

            value = &mut operation => return GuardOutcome::Completed(value),
            _ = &mut expiry => return GuardOutcome::Disposed,
            now = ticker.tick() => {
                let remaining = expires_at.saturating_duration_since(now);
                tracing::debug!(
                    remaining_ms = remaining.as_millis() as u64,
                    "waiting for operation"
                );
            }
        }
    }
}

/// Race `operation` against `duration`. Returns `None` if the deadline
/// elapsed first, in which case the operation has been dropped.
pub async fn with_timeout<F>(
    duration: Duration,
    operation: F,
) -> Option<F::Output>
where
    F: Future,
{
    DeadlineGuard::new(duration).run(operation).await.into_option()
}
