//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Lower bound of the jitter multiplier.
pub const JITTER_MIN: f64 = 0.8;

/// Upper bound of the jitter multiplier.
pub const JITTER_MAX: f64 = 1.2;

/// Delay schedule between attempts of one logical request.
///
/// The un-jittered delay after attempt `n` (1-based) is
/// `min(base_delay * 2^(n-1), max_delay)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Cap applied before jitter.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
        }
    }
}

impl RetryPolicy {
    /// Un-jittered delay after the given 1-based attempt.
    #[must_use]
    pub fn base_delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Jittered delay after the given 1-based attempt.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = rand::thread_rng().gen_range(JITTER_MIN..=JITTER_MAX);
        scale(self.base_delay_for_attempt(attempt), multiplier)
    }

    /// Upper bound of any delay this policy can produce.
    #[must_use]
    pub fn max_jittered_delay(&self) -> Duration {
        scale(self.max_delay, JITTER_MAX)
    }
}

// Saturates instead of panicking when a configured delay is near `Duration::MAX`.
fn scale(delay: Duration, multiplier: f64) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() * multiplier).unwrap_or(Duration::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_doubles_then_caps() {
        let policy = RetryPolicy::default();
        let millis: Vec<u128> = (1..=7)
            .map(|n| policy.base_delay_for_attempt(n).as_millis())
            .collect();
        assert_eq!(millis, vec![1000, 2000, 4000, 8000, 16000, 30000, 30000]);
    }

    #[test]
    fn first_retry_waits_about_one_second() {
        let policy = RetryPolicy::default();
        for _ in 0..50 {
            let delay = policy.delay_for_attempt(1).as_millis();
            assert!((800..=1200).contains(&delay), "delay {delay}");
        }
    }

    #[test]
    fn huge_attempt_numbers_saturate() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_delay_for_attempt(u32::MAX), policy.max_delay);
    }

    #[test]
    fn jitter_saturates_near_duration_max() {
        let policy = RetryPolicy {
            base_delay: Duration::MAX,
            max_delay: Duration::MAX,
        };
        assert_eq!(policy.max_jittered_delay(), Duration::MAX);
        assert!(policy.delay_for_attempt(1) >= Duration::from_secs(u64::MAX / 2));
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn base_delays_non_decreasing(attempt in 1_u32..64) {
                let policy = RetryPolicy::default();
                prop_assert!(
                    policy.base_delay_for_attempt(attempt)
                        <= policy.base_delay_for_attempt(attempt + 1)
                );
            }

            #[test]
            fn jittered_delay_within_bounds(attempt in 1_u32..64) {
                let policy = RetryPolicy::default();
                let base = policy.base_delay_for_attempt(attempt);
                let delay = policy.delay_for_attempt(attempt);
                prop_assert!(delay >= base.mul_f64(JITTER_MIN));
                prop_assert!(delay <= base.mul_f64(JITTER_MAX));
                prop_assert!(delay <= Duration::from_millis(36_000));
            }
        }
    }
}
