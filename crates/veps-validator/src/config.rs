use chrono::Duration;

/// Configuration for the validation pipeline.
#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    /// Ceiling for a single `payment_processed` amount.
    pub max_payment_amount: f64,
    /// Daily ceiling for a single `withdrawal` amount.
    pub max_withdrawal_amount: f64,
    /// Events older than this fail the temporal check.
    pub max_event_age: Duration,
    /// Allowance for producer clock skew; events further in the future
    /// fail the temporal check.
    pub clock_skew_allowance: Duration,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_payment_amount: 1_000_000.0,
            max_withdrawal_amount: 10_000.0,
            max_event_age: Duration::hours(1),
            clock_skew_allowance: Duration::minutes(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits() {
        let config = ValidatorConfig::default();
        assert_eq!(config.max_payment_amount, 1_000_000.0);
        assert_eq!(config.max_withdrawal_amount, 10_000.0);
        assert_eq!(config.max_event_age, Duration::hours(1));
        assert_eq!(config.clock_skew_allowance, Duration::minutes(5));
    }
}
