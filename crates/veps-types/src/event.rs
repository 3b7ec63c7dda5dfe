use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::VectorClock;

/// Schema version stamped into every normalized event.
pub const SCHEMA_VERSION: &str = "1.0";

/// Unique identifier for a normalized event.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(uuid::Uuid);

impl EventId {
    /// Generate a fresh random event ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }

    /// Short representation (first 8 characters of the UUID).
    pub fn short_id(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", self.short_id())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// The entity that triggered an event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
    /// e.g. "user", "service", "system". Defaults to "user" at normalization.
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Actor {
    /// Create an actor with the given id, name defaulted to the id and
    /// kind defaulted to "user".
    pub fn user(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind: "user".into(),
            metadata: BTreeMap::new(),
        }
    }
}

/// Tracking and debugging context attached to every normalized event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub received_at: DateTime<Utc>,
    /// Set by the context writer on upsert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    /// Which pipeline instance normalized this event.
    pub boundary_node: String,
    /// Caller-supplied or generated at normalization; used for tracing.
    pub correlation_id: String,
    #[serde(default)]
    pub retry_count: u32,
    pub schema_version: String,
}

/// Canonical record produced by the normalizer.
///
/// Shared read-only between the integrity and context paths; neither path
/// mutates it. Ownership ends when the pipeline returns or the fracture
/// write completes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    #[serde(rename = "type")]
    pub event_type: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub actor: Actor,
    /// Type-specific payload; everything from the submission that the
    /// normalizer did not consume as metadata.
    pub evidence: BTreeMap<String, serde_json::Value>,
    pub vector_clock: VectorClock,
    #[serde(default)]
    pub metadata: EventMetadata,
}

impl Event {
    /// Convenience accessor for a numeric evidence entry.
    pub fn evidence_number(&self, key: &str) -> Option<f64> {
        self.evidence.get(key).and_then(|value| value.as_f64())
    }
}

/// A client submission before normalization.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawEvent {
    pub source: String,
    /// Caller-supplied wall-clock time; stamped at normalization if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Untyped payload. Must be a JSON object containing at least `type`.
    #[serde(default)]
    pub data: serde_json::Value,
}
