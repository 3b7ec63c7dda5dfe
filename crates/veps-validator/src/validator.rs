use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use veps_store::ContextStore;
use veps_types::{CheckResult, Event, ValidationOutcome};

use crate::check::{CheckDecision, EventCheck};
use crate::checks::actor::ActorCheck;
use crate::checks::business::BusinessRulesCheck;
use crate::checks::causality::CausalityCheck;
use crate::checks::temporal::TemporalCheck;
use crate::config::ValidatorConfig;
use crate::error::ValidatorResult;

/// The validation pipeline: every event on the integrity path runs through
/// all registered checks against the persisted context.
///
/// The pipeline is **exhaustive**, not fail-fast: a failing check never
/// short-circuits the ones after it, so a veto always carries the complete
/// list of failed checks and reasons.
pub struct Validator {
    checks: Vec<Box<dyn EventCheck>>,
    store: Arc<dyn ContextStore>,
}

impl Validator {
    /// Create a validator with an empty check list. Use [`Self::add_check`]
    /// to register checks, or [`Self::with_default_checks`] for the
    /// standard pipeline.
    pub fn new(store: Arc<dyn ContextStore>) -> Self {
        Self {
            checks: Vec::new(),
            store,
        }
    }

    /// Create a validator with the standard pipeline:
    /// causality -> actor existence -> business rules -> temporal.
    pub fn with_default_checks(store: Arc<dyn ContextStore>, config: &ValidatorConfig) -> Self {
        let mut validator = Self::new(store);
        validator.add_check(Box::new(CausalityCheck));
        validator.add_check(Box::new(ActorCheck::permissive()));
        validator.add_check(Box::new(BusinessRulesCheck::new(config)));
        validator.add_check(Box::new(TemporalCheck::new(config)));
        validator
    }

    /// Append a check to the end of the pipeline.
    pub fn add_check(&mut self, check: Box<dyn EventCheck>) {
        self.checks.push(check);
    }

    /// Number of registered checks.
    pub fn check_count(&self) -> usize {
        self.checks.len()
    }

    /// Run every check over the event and aggregate the results.
    ///
    /// `Err` means a check could not run at all (store unreachable); a
    /// veto is an `Ok` outcome with `passed() == false`.
    pub async fn validate(&self, event: &Event) -> ValidatorResult<ValidationOutcome> {
        let pipeline_start = Instant::now();
        debug!(event_id = %event.id, event_type = %event.event_type, "starting validation");

        let mut results = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            let decision = check.evaluate(event, self.store.as_ref()).await?;
            results.push(match decision {
                CheckDecision::Pass => CheckResult::pass(check.name()),
                CheckDecision::Fail { reason } => CheckResult::fail(check.name(), reason),
            });
        }

        let outcome = ValidationOutcome {
            checks: results,
            duration: pipeline_start.elapsed(),
        };

        info!(
            event_id = %event.id,
            passed = outcome.passed(),
            duration_us = outcome.duration.as_micros() as u64,
            "validation complete"
        );
        Ok(outcome)
    }
}
