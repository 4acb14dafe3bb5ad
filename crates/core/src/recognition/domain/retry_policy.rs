use std::time::Duration;

use crate::shared::constants::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_MAX_ATTEMPTS, DEFAULT_POST_SUCCESS_DELAY,
    DEFAULT_PRE_CALL_DELAY, DEFAULT_RETRY_DELAY, MAX_RETRY_DELAY,
};

/// Pacing and retry budget for one executor. A plain value: each run owns
/// its own copy.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Wait before every attempt.
    pub pre_call_delay: Duration,
    /// Wait after every successful call.
    pub post_success_delay: Duration,
    /// Wait before the first retry; later retries grow by `backoff_factor`.
    pub retry_delay: Duration,
    pub backoff_factor: f64,
    /// Total provider calls allowed per operation, first attempt included.
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based), saturating at
    /// `MAX_RETRY_DELAY`.
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        if self.retry_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.retry_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .map_or(MAX_RETRY_DELAY, |delay| delay.min(MAX_RETRY_DELAY))
    }

    /// Same retry budget with every wait removed.
    pub fn without_delays(self) -> Self {
        Self {
            pre_call_delay: Duration::ZERO,
            post_success_delay: Duration::ZERO,
            retry_delay: Duration::ZERO,
            ..self
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            pre_call_delay: DEFAULT_PRE_CALL_DELAY,
            post_success_delay: DEFAULT_POST_SUCCESS_DELAY,
            retry_delay: DEFAULT_RETRY_DELAY,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 1000)]
    #[case(2, 2000)]
    #[case(3, 4000)]
    #[case(4, 8000)]
    fn test_backoff_grows_geometrically(#[case] retry: u32, #[case] expected_ms: u64) {
        let policy = RetryPolicy {
            retry_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff_delay(retry), Duration::from_millis(expected_ms));
    }

    #[test]
    fn test_factor_one_is_constant() {
        let policy = RetryPolicy {
            retry_delay: Duration::from_millis(250),
            backoff_factor: 1.0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff_delay(5), Duration::from_millis(250));
    }

    #[rstest]
    #[case::many_retries(99)]
    #[case::overflowing_exponent(1100)]
    #[case::max_retry(u32::MAX)]
    fn test_backoff_saturates_instead_of_overflowing(#[case] retry: u32) {
        let policy = RetryPolicy {
            max_attempts: 100,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff_delay(retry), MAX_RETRY_DELAY);
    }

    #[test]
    fn test_zero_retry_delay_stays_zero_for_huge_exponents() {
        let policy = RetryPolicy::default().without_delays();
        assert_eq!(policy.backoff_delay(2000), Duration::ZERO);
    }

    #[test]
    fn test_post_success_delay_exceeds_pre_call_delay_by_default() {
        let policy = RetryPolicy::default();
        assert!(policy.post_success_delay > policy.pre_call_delay);
    }

    #[test]
    fn test_without_delays_keeps_budget() {
        let policy = RetryPolicy::default().without_delays();
        assert_eq!(policy.pre_call_delay, Duration::ZERO);
        assert_eq!(policy.retry_delay, Duration::ZERO);
        assert_eq!(policy.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }
}
