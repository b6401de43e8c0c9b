use crate::errors::DeliveryError;

#[derive(Clone, Debug, PartialEq)]
pub struct RetryBackoffConfig {
    pub initial_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_delay_ms: u64,
    pub jitter: bool,
}

impl Default for RetryBackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 200,
            backoff_factor: 2.0,
            max_delay_ms: 2_000,
            jitter: true,
        }
    }
}

/// How commit records and hydration loads are delivered to the store.
#[derive(Clone, Debug, PartialEq)]
pub struct DeliveryPolicy {
    pub max_attempts: u32,
    pub attempt_timeout_ms: u64,
    pub backoff: RetryBackoffConfig,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout_ms: 3_000,
            backoff: RetryBackoffConfig::default(),
        }
    }
}

pub fn should_retry(error: &DeliveryError) -> bool {
    match error {
        DeliveryError::Timeout { .. } => true,
        DeliveryError::Store(error) => error.is_retryable(),
        DeliveryError::Exhausted { .. }
        | DeliveryError::InFlight { .. }
        | DeliveryError::Runtime(_) => false,
    }
}

pub fn delay_for_attempt_ms(attempt: u32, config: &RetryBackoffConfig, jitter_seed: u64) -> u64 {
    let exp = (attempt.saturating_sub(1)) as i32;
    let base = (config.initial_delay_ms as f64) * config.backoff_factor.powi(exp);
    let mut delay = base.min(config.max_delay_ms as f64);
    if config.jitter {
        let factor = jitter_factor(attempt, jitter_seed);
        delay *= factor;
    }
    delay.round().max(0.0) as u64
}

fn jitter_factor(attempt: u32, jitter_seed: u64) -> f64 {
    let mut x = jitter_seed ^ ((attempt as u64) << 32) ^ 0x9E3779B97F4A7C15;
    x ^= x >> 12;
    x ^= x << 25;
    x ^= x >> 27;
    let r = x.wrapping_mul(0x2545F4914F6CDD1D);
    let unit = (r as f64) / (u64::MAX as f64);
    0.5 + unit
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorm_trackstore::TrackingStoreError;

    #[test]
    fn delivery_policy_defaults_expected_three_attempts() {
        let policy = DeliveryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.attempt_timeout_ms, 3_000);
        assert_eq!(policy.backoff.initial_delay_ms, 200);
        assert_eq!(policy.backoff.max_delay_ms, 2_000);
    }

    #[test]
    fn delay_for_attempt_ms_no_jitter_expected_capped_exponential_sequence() {
        let config = RetryBackoffConfig {
            jitter: false,
            ..RetryBackoffConfig::default()
        };
        assert_eq!(delay_for_attempt_ms(1, &config, 0), 200);
        assert_eq!(delay_for_attempt_ms(2, &config, 0), 400);
        assert_eq!(delay_for_attempt_ms(3, &config, 0), 800);
        assert_eq!(delay_for_attempt_ms(6, &config, 0), 2_000);
    }

    #[test]
    fn delay_for_attempt_ms_with_jitter_expected_within_bounds_and_stable() {
        let config = RetryBackoffConfig::default();
        for seed in [1_u64, 7, 42, 1_000] {
            let delay = delay_for_attempt_ms(2, &config, seed);
            assert!((200..=600).contains(&delay), "delay {delay} out of bounds");
            assert_eq!(delay, delay_for_attempt_ms(2, &config, seed));
        }
    }

    #[test]
    fn should_retry_expected_conflicts_final() {
        assert!(should_retry(&DeliveryError::Timeout { timeout_ms: 10 }));
        assert!(should_retry(&DeliveryError::Store(
            TrackingStoreError::Backend("reset".to_string())
        )));
        assert!(!should_retry(&DeliveryError::Store(
            TrackingStoreError::Conflict("stale".to_string())
        )));
    }
}
