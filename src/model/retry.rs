use std::time::Duration;

/// Backoff schedule for retrying lock-contended write attempts.
///
/// Attempt 0 is the initial try and carries no delay; attempt `n` waits
/// `initial_delay * backoff_multiplier^(n-1)`. The schedule is
/// deterministic — no jitter — so tests can assert exact delays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the initial try
    pub max_retries: u32,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Multiplier applied to the delay for each further retry
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration, backoff_multiplier: f64) -> Self {
        Self {
            max_retries,
            initial_delay,
            backoff_multiplier,
        }
    }

    /// No retries: a single attempt only.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO, 1.0)
    }

    /// 3 retries, 0.5s initial delay, exponential x2 backoff.
    pub fn standard() -> Self {
        Self::new(3, Duration::from_millis(500), 2.0)
    }

    /// 5 retries, 0.2s initial delay, x1.5 backoff.
    pub fn aggressive() -> Self {
        Self::new(5, Duration::from_millis(200), 1.5)
    }

    /// Delay before attempt `attempt` (1-indexed; attempt 0 is free).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = self.backoff_multiplier.powi(attempt as i32 - 1);
        self.initial_delay.mul_f64(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Display for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RetryPolicy(max_retries: {}, delay: {:?}, backoff: {}x)",
            self.max_retries, self.initial_delay, self.backoff_multiplier
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_schedule_doubles() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1), 2.0);
        assert_eq!(policy.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(4));
    }

    #[test]
    fn test_none_policy_has_no_delay() {
        let policy = RetryPolicy::none();
        assert_eq!(policy.max_retries, 0);
        assert_eq!(policy.delay_for_attempt(1), Duration::ZERO);
    }

    #[test]
    fn test_aggressive_schedule() {
        let policy = RetryPolicy::aggressive();
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(300));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(450));
    }
}
