//! Retry delay calculation.
//!
//! The only supported strategy is exponential: `backoff_sec.powi(attempts)`.
//! There is deliberately no maximum-delay cap and no jitter — see
//! SPEC_FULL.md §9 for why this mirrors the reference implementation
//! rather than the more configurable policy a generic retry layer would
//! offer.

/// Delay, in seconds, before a job should next be attempted after its
/// `attempts`-th failure.
pub fn delay_for_attempt(backoff_sec: f64, attempts: u32) -> f64 {
    backoff_sec.powi(attempts as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_exponentially_with_attempts() {
        assert_eq!(delay_for_attempt(1.5, 1), 1.5);
        assert_eq!(delay_for_attempt(1.5, 2), 2.25);
        assert_eq!(delay_for_attempt(1.5, 0), 1.0);
    }

    #[test]
    fn delay_is_uncapped_for_large_attempt_counts() {
        let huge = delay_for_attempt(2.0, 40);
        assert!(huge > 1_000_000_000.0);
    }
}
