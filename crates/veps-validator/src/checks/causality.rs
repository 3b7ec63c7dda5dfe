use async_trait::async_trait;
use tracing::debug;

use veps_store::ContextStore;
use veps_types::Event;

use crate::check::{CheckDecision, EventCheck};
use crate::error::{ValidatorError, ValidatorResult};

/// Verifies that every causal dependency carried in the event's vector
/// clock is backed by an already-persisted event.
///
/// A clock with at most one entry names no foreign dependencies and is
/// skipped without touching the store.
pub struct CausalityCheck;

#[async_trait]
impl EventCheck for CausalityCheck {
    fn name(&self) -> &'static str {
        "causality"
    }

    async fn evaluate(
        &self,
        event: &Event,
        store: &dyn ContextStore,
    ) -> ValidatorResult<CheckDecision> {
        if event.vector_clock.len() <= 1 {
            return Ok(CheckDecision::Pass);
        }

        let status = store
            .check_causality(&event.vector_clock)
            .await
            .map_err(|e| ValidatorError::store(self.name(), e))?;

        if status.satisfied {
            return Ok(CheckDecision::Pass);
        }

        debug!(event_id = %event.id, missing = ?status.missing_nodes, "causality check failed");
        Ok(CheckDecision::fail(format!(
            "causal dependencies not satisfied, missing nodes: [{}]",
            status.missing_nodes.join(", ")
        )))
    }
}
