use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use veps_store::ContextStore;
use veps_types::Event;

use crate::check::{CheckDecision, EventCheck};
use crate::error::ValidatorResult;

/// Policy seam for the actor-existence check.
///
/// The baseline deployment is permissive; operators that want to require
/// prior activity (or any other actor-level rule) supply their own policy
/// at validator construction.
#[async_trait]
pub trait ActorPolicy: Send + Sync {
    async fn assess(&self, event: &Event, store: &dyn ContextStore)
        -> ValidatorResult<CheckDecision>;
}

/// Baseline policy: accept every actor, leaving a trace for audit.
pub struct PermissiveActorPolicy;

#[async_trait]
impl ActorPolicy for PermissiveActorPolicy {
    async fn assess(
        &self,
        event: &Event,
        _store: &dyn ContextStore,
    ) -> ValidatorResult<CheckDecision> {
        debug!(actor_id = %event.actor.id, "actor check: accepting (permissive policy)");
        Ok(CheckDecision::Pass)
    }
}

/// The actor-existence check, delegating to the configured policy.
pub struct ActorCheck {
    policy: Arc<dyn ActorPolicy>,
}

impl ActorCheck {
    pub fn new(policy: Arc<dyn ActorPolicy>) -> Self {
        Self { policy }
    }

    /// The baseline permissive check.
    pub fn permissive() -> Self {
        Self::new(Arc::new(PermissiveActorPolicy))
    }
}

#[async_trait]
impl EventCheck for ActorCheck {
    fn name(&self) -> &'static str {
        "actor_existence"
    }

    async fn evaluate(
        &self,
        event: &Event,
        store: &dyn ContextStore,
    ) -> ValidatorResult<CheckDecision> {
        self.policy.assess(event, store).await
    }
}
