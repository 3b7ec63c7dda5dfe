use async_trait::async_trait;
use chrono::{Duration, Utc};

use veps_store::ContextStore;
use veps_types::Event;

use crate::check::{CheckDecision, EventCheck};
use crate::config::ValidatorConfig;
use crate::error::ValidatorResult;

/// Timestamp sanity check.
///
/// Accepts events stamped within `[now - max_age, now + skew]`. The
/// forward allowance is the documented clock-skew budget for producers.
pub struct TemporalCheck {
    max_age: Duration,
    skew: Duration,
}

impl TemporalCheck {
    pub fn new(config: &ValidatorConfig) -> Self {
        Self {
            max_age: config.max_event_age,
            skew: config.clock_skew_allowance,
        }
    }
}

#[async_trait]
impl EventCheck for TemporalCheck {
    fn name(&self) -> &'static str {
        "temporal"
    }

    async fn evaluate(
        &self,
        event: &Event,
        _store: &dyn ContextStore,
    ) -> ValidatorResult<CheckDecision> {
        let now = Utc::now();

        if event.timestamp < now - self.max_age {
            return Ok(CheckDecision::fail(
                "event timestamp is too old (more than 1 hour in the past)",
            ));
        }

        if event.timestamp > now + self.skew {
            return Ok(CheckDecision::fail("event timestamp is in the future"));
        }

        Ok(CheckDecision::Pass)
    }
}
