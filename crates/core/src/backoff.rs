//! Exponential backoff for rate-limited chain nodes.
//!
//! The policy carries no mutable state. A worker counts the retries of the
//! node it is executing and asks the policy for the delay of the next one;
//! the count starts from zero again for every node of a chain.

use std::time::Duration;

use crate::error::{ConfigError, JobError};

/// Exponential backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub initial: Duration,
    /// Upper bound for any single delay.
    pub max: Duration,
    /// Growth factor applied per retry.
    pub multiplier: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(60),
            multiplier: 2.0,
        }
    }
}

impl BackoffPolicy {
    /// Create a doubling policy with the given bounds.
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            multiplier: 2.0,
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Delay before retry number `attempt` (1-indexed).
    ///
    /// `initial * multiplier^(attempt - 1)`, capped at `max`. Attempt 0 means
    /// no retry has happened yet and has no delay.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base_ms = self.initial.as_millis() as f64;
        let max_ms = self.max.as_millis() as f64;

        let exp = self
            .multiplier
            .powi(i32::try_from(attempt - 1).unwrap_or(i32::MAX));
        // inf * 0 is NaN; f64::min picks the cap in that case.
        let delay_ms = (base_ms * exp).min(max_ms);

        Duration::from_millis(delay_ms as u64)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial.is_zero() {
            return Err(ConfigError::Backoff("initial interval must be non-zero".into()));
        }
        if self.max < self.initial {
            return Err(ConfigError::Backoff(
                "maximum interval is shorter than the initial interval".into(),
            ));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ConfigError::Backoff(format!(
                "multiplier must be a finite number >= 1, got {}",
                self.multiplier
            )));
        }
        Ok(())
    }
}

/// Whether a failed attempt should be retried.
///
/// `retries_so_far` counts retries already performed for the current chain
/// node. Only rate-limit errors qualify, and `max_retries == 0` disables
/// retry entirely.
pub fn should_retry(error: &JobError, retries_so_far: u32, max_retries: u32) -> bool {
    error.is_rate_limited() && max_retries > 0 && retries_so_far < max_retries
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn exponential_backoff_calculates_correctly() {
        let policy = BackoffPolicy::new(Duration::from_millis(100), Duration::from_secs(10));

        assert_eq!(policy.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(800));
    }

    #[test]
    fn default_policy_caps_at_one_minute() {
        let policy = BackoffPolicy::default();

        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(6), Duration::from_secs(32));
        assert_eq!(policy.delay_for_attempt(7), Duration::from_secs(60));
        assert_eq!(policy.delay_for_attempt(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn custom_multiplier() {
        let policy = BackoffPolicy::new(Duration::from_millis(10), Duration::from_secs(1))
            .with_multiplier(3.0);

        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(30));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(90));
    }

    #[test]
    fn validate_rejects_bad_policies() {
        assert!(BackoffPolicy::default().validate().is_ok());
        assert!(
            BackoffPolicy::new(Duration::ZERO, Duration::from_secs(1))
                .validate()
                .is_err()
        );
        assert!(
            BackoffPolicy::new(Duration::from_secs(2), Duration::from_secs(1))
                .validate()
                .is_err()
        );
        assert!(
            BackoffPolicy::default()
                .with_multiplier(0.5)
                .validate()
                .is_err()
        );
        assert!(
            BackoffPolicy::default()
                .with_multiplier(f64::NAN)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn should_retry_respects_budget_and_classification() {
        let throttled = JobError::rate_limited("slow down");

        assert!(should_retry(&throttled, 0, 2));
        assert!(should_retry(&throttled, 1, 2));
        assert!(!should_retry(&throttled, 2, 2));
        assert!(!should_retry(&throttled, 0, 0));
        assert!(!should_retry(&JobError::other("access denied"), 0, 10));
        assert!(!should_retry(&JobError::Cancelled, 0, 10));
    }

    proptest! {
        #[test]
        fn delays_are_non_decreasing_and_capped(
            initial_ms in 1u64..5_000,
            extra_ms in 0u64..120_000,
            attempt in 1u32..64,
        ) {
            let policy = BackoffPolicy::new(
                Duration::from_millis(initial_ms),
                Duration::from_millis(initial_ms + extra_ms),
            );

            let current = policy.delay_for_attempt(attempt);
            let next = policy.delay_for_attempt(attempt + 1);

            prop_assert!(current <= next);
            prop_assert!(next <= policy.max);
            prop_assert!(current >= policy.initial.min(policy.max));
        }
    }
}
