use async_trait::async_trait;

use veps_types::{Event, EventId, VectorClock};

use crate::error::StoreResult;
use crate::filter::EventFilter;

/// Result of a causality query against the persisted context.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CausalityStatus {
    pub satisfied: bool,
    /// Node identifiers that produced no qualifying record.
    pub missing_nodes: Vec<String>,
}

impl CausalityStatus {
    pub fn satisfied() -> Self {
        Self {
            satisfied: true,
            missing_nodes: Vec::new(),
        }
    }

    pub fn missing(missing_nodes: Vec<String>) -> Self {
        Self {
            satisfied: false,
            missing_nodes,
        }
    }
}

/// Typed facade over the persisted event store.
///
/// All implementations must satisfy these invariants:
/// - `upsert` is keyed on `event.id`; the update path replaces every column
///   and sets `processed_at` to now when the event does not carry one.
/// - Two upserts of the same event are observationally equivalent to one.
/// - A `(node, ts)` pair in a causality query is satisfied when at least
///   one persisted event was produced by `node` (its `boundary_node`) with
///   its own clock entry for `node` at most `ts`. Adding events can never
///   flip a satisfied query back to unsatisfied.
/// - Reads never mutate state.
///
/// Calls run inside the caller's task and honor its cancellation; network
/// implementations additionally bound each call with their own transport
/// timeout.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Insert-or-update an event keyed on its id.
    async fn upsert(&self, event: &Event) -> StoreResult<()>;

    /// Fetch the full event, or `Ok(None)` if it was never persisted.
    async fn get_by_id(&self, id: &EventId) -> StoreResult<Option<Event>>;

    /// Check whether every `(node, ts)` entry in the clock is backed by a
    /// persisted event.
    async fn check_causality(&self, clock: &VectorClock) -> StoreResult<CausalityStatus>;

    /// Liveness ping.
    async fn health(&self) -> StoreResult<()>;

    /// Filtered read path used by retrieval surfaces. No pipeline
    /// semantics depend on it.
    async fn query(&self, filter: &EventFilter) -> StoreResult<Vec<Event>>;
}
