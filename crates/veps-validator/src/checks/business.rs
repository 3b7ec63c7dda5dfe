use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use veps_store::ContextStore;
use veps_types::Event;

use crate::check::{CheckDecision, EventCheck};
use crate::config::ValidatorConfig;
use crate::error::ValidatorResult;

/// A business rule bound to one event type.
///
/// Rules are local decisions over the event itself; anything that needs
/// store state belongs in a dedicated [`EventCheck`] instead.
pub trait TypeRule: Send + Sync {
    fn evaluate(&self, event: &Event) -> CheckDecision;
}

impl<F> TypeRule for F
where
    F: Fn(&Event) -> CheckDecision + Send + Sync,
{
    fn evaluate(&self, event: &Event) -> CheckDecision {
        self(event)
    }
}

/// Type-dispatched business rules.
///
/// Built-in rules cover `payment_processed` and `withdrawal`; `user_login`
/// and unknown types pass (open policy). Additional rules are pluggable
/// per type and take precedence over the built-ins.
pub struct BusinessRulesCheck {
    max_payment_amount: f64,
    max_withdrawal_amount: f64,
    rules: HashMap<String, Arc<dyn TypeRule>>,
}

impl BusinessRulesCheck {
    pub fn new(config: &ValidatorConfig) -> Self {
        Self {
            max_payment_amount: config.max_payment_amount,
            max_withdrawal_amount: config.max_withdrawal_amount,
            rules: HashMap::new(),
        }
    }

    /// Register a rule for an event type, overriding any built-in.
    pub fn with_rule(mut self, event_type: impl Into<String>, rule: Arc<dyn TypeRule>) -> Self {
        self.rules.insert(event_type.into(), rule);
        self
    }

    fn validate_payment(&self, event: &Event) -> CheckDecision {
        let Some(amount) = event.evidence_number("amount") else {
            return CheckDecision::fail("payment amount is missing or invalid");
        };
        if amount <= 0.0 {
            return CheckDecision::fail(format!(
                "payment amount must be positive, got: {amount:.2}"
            ));
        }
        if amount > self.max_payment_amount {
            return CheckDecision::fail(format!("payment amount exceeds limit: {amount:.2}"));
        }
        CheckDecision::Pass
    }

    fn validate_withdrawal(&self, event: &Event) -> CheckDecision {
        let Some(amount) = event.evidence_number("amount") else {
            return CheckDecision::fail("withdrawal amount is missing or invalid");
        };
        if amount <= 0.0 {
            return CheckDecision::fail("withdrawal amount must be positive");
        }
        if amount > self.max_withdrawal_amount {
            return CheckDecision::fail(format!(
                "withdrawal amount exceeds daily limit: {amount:.2}"
            ));
        }
        CheckDecision::Pass
    }
}

#[async_trait]
impl EventCheck for BusinessRulesCheck {
    fn name(&self) -> &'static str {
        "business_rules"
    }

    async fn evaluate(
        &self,
        event: &Event,
        _store: &dyn ContextStore,
    ) -> ValidatorResult<CheckDecision> {
        if let Some(rule) = self.rules.get(&event.event_type) {
            return Ok(rule.evaluate(event));
        }

        let decision = match event.event_type.as_str() {
            "payment_processed" => self.validate_payment(event),
            "withdrawal" => self.validate_withdrawal(event),
            "user_login" => CheckDecision::Pass,
            other => {
                debug!(event_type = %other, "no specific business rules for type");
                CheckDecision::Pass
            }
        };
        Ok(decision)
    }
}
