use std::time::Duration;

use crate::recognition::domain::provider_error::{ErrorClass, ProviderError};
use crate::recognition::domain::retry_policy::RetryPolicy;
use crate::recognition::infrastructure::sleeper::{Sleeper, ThreadSleeper};

/// Classified result of a single provider call.
#[derive(Debug, PartialEq)]
pub enum Attempt<T> {
    Success(T),
    Retryable { class: ErrorClass, message: String },
    Terminal { message: String },
}

impl<T> Attempt<T> {
    pub fn from_result(result: Result<T, ProviderError>) -> Self {
        match result {
            Ok(value) => Attempt::Success(value),
            Err(err) => {
                let class = err.class();
                let message = err.to_string();
                if class.is_retryable() {
                    Attempt::Retryable { class, message }
                } else {
                    Attempt::Terminal { message }
                }
            }
        }
    }
}

/// Final result of an executor-wrapped operation.
///
/// `Exhausted` means the request effectively did not happen. It must not be
/// read as "the provider found nothing".
#[derive(Debug, PartialEq)]
pub enum CallOutcome<T> {
    Success(T),
    InvalidResource(String),
    Exhausted { attempts: u32, last_error: String },
}

impl<T> CallOutcome<T> {
    /// Collapses every failure into "no result".
    pub fn into_result(self) -> Option<T> {
        match self {
            CallOutcome::Success(value) => Some(value),
            CallOutcome::InvalidResource(_) | CallOutcome::Exhausted { .. } => None,
        }
    }
}

/// Running counters over every call made through one executor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecutorStats {
    pub calls: u32,
    pub successes: u32,
    pub retries: u32,
    pub invalid: u32,
    pub exhausted: u32,
}

/// Paces, retries and classifies provider calls.
///
/// Strictly sequential: `execute` takes `&mut self`, so one executor never
/// has two requests in flight. Each processing run owns its own executor.
pub struct ResilientExecutor {
    policy: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
    stats: ExecutorStats,
}

impl ResilientExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_sleeper(policy, Box::new(ThreadSleeper))
    }

    pub fn with_sleeper(policy: RetryPolicy, sleeper: Box<dyn Sleeper>) -> Self {
        Self {
            policy,
            sleeper,
            stats: ExecutorStats::default(),
        }
    }

    pub fn stats(&self) -> ExecutorStats {
        self.stats
    }

    /// Blocking wait on the same clock the executor paces with.
    pub fn pause(&mut self, duration: Duration) {
        self.sleeper.sleep(duration);
    }

    /// Runs `operation` until it succeeds, hits an invalid resource, or
    /// `max_attempts` calls have been made.
    pub fn execute<T, F>(&mut self, name: &str, mut operation: F) -> CallOutcome<T>
    where
        F: FnMut() -> Result<T, ProviderError>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                self.stats.retries += 1;
                self.sleeper.sleep(self.policy.backoff_delay(attempt - 1));
            }
            self.sleeper.sleep(self.policy.pre_call_delay);
            self.stats.calls += 1;

            match Attempt::from_result(operation()) {
                Attempt::Success(value) => {
                    log::info!("{name}: attempt {attempt}/{max_attempts} ok");
                    self.stats.successes += 1;
                    self.sleeper.sleep(self.policy.post_success_delay);
                    return CallOutcome::Success(value);
                }
                Attempt::Terminal { message } => {
                    log::warn!("{name}: attempt {attempt}/{max_attempts} invalid resource: {message}");
                    self.stats.invalid += 1;
                    return CallOutcome::InvalidResource(message);
                }
                Attempt::Retryable { class, message } => {
                    log::warn!("{name}: attempt {attempt}/{max_attempts} failed ({class:?}): {message}");
                    last_error = message;
                }
            }
        }

        log::warn!("{name}: no result after {max_attempts} attempts");
        self.stats.exhausted += 1;
        CallOutcome::Exhausted {
            attempts: max_attempts,
            last_error,
        }
    }
}
