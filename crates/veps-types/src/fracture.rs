use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::VectorClock;
use crate::event::Event;

/// Unique identifier for a fracture record.
///
/// Fresh per recording call; replays therefore produce duplicates, and
/// consumers deduplicate on `(event.id, failed_checks)` if they need to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FractureId(uuid::Uuid);

impl FractureId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }

    /// Short representation (first 8 characters of the UUID).
    pub fn short_id(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for FractureId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FractureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FractureId({})", self.short_id())
    }
}

impl fmt::Display for FractureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why an event was vetoed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RejectionDetails {
    pub failed_checks: Vec<String>,
    pub reasons: Vec<String>,
    /// Node that produced the veto decision.
    pub veto_node: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_duration: Option<String>,
}

/// Contextual information captured for later investigation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FractureContext {
    pub veps_node_id: String,
    pub correlation_id: String,
    pub vector_clock: VectorClock,
    pub original_source: String,
    pub received_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Immutable audit record for a vetoed event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FracturedEvent {
    pub fracture_id: FractureId,
    pub timestamp: DateTime<Utc>,
    pub event: Event,
    pub rejection: RejectionDetails,
    pub context: FractureContext,
}

impl FracturedEvent {
    /// Build a fracture record from a vetoed event, stamping a fresh
    /// `fracture_id` and the current UTC time. The context block is
    /// derived from the event's own metadata.
    pub fn capture(
        event: Event,
        rejection: RejectionDetails,
        extra_metadata: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        let context = FractureContext {
            veps_node_id: event.metadata.boundary_node.clone(),
            correlation_id: event.metadata.correlation_id.clone(),
            vector_clock: event.vector_clock.clone(),
            original_source: event.source.clone(),
            received_at: event.metadata.received_at,
            metadata: extra_metadata,
        };

        Self {
            fracture_id: FractureId::new(),
            timestamp: Utc::now(),
            event,
            rejection,
            context,
        }
    }
}
