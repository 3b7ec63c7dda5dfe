use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use veps_types::{Actor, Event, EventId, EventMetadata, RawEvent, VectorClock, SCHEMA_VERSION};

use crate::error::NormalizeError;

/// Keys of the submission payload the normalizer consumes as metadata.
/// Everything else is copied into `evidence` verbatim.
const RESERVED_KEYS: [&str; 8] = [
    "type",
    "actor",
    "user_id",
    "user_name",
    "actor_id",
    "actor_name",
    "vector_clock",
    "correlation_id",
];

/// Canonicalizes raw submissions and assigns vector-clock timestamps.
///
/// The normalizer never does I/O; every decision is local. For a valid
/// input the produced `type`, `source`, `actor`, `evidence`, and
/// `correlation_id` are deterministic; the event id and `received_at` are
/// fresh each call.
pub struct Normalizer {
    node_id: String,
}

impl Normalizer {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
        }
    }

    /// The node identifier this instance stamps into vector clocks.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Check schema rules without transforming.
    ///
    /// Batch entry uses this to report a precise index before any event
    /// is routed.
    pub fn validate_schema(&self, raw: &RawEvent) -> Result<(), NormalizeError> {
        if raw.source.is_empty() {
            return Err(NormalizeError::MissingSource);
        }
        let data = raw.data.as_object().ok_or(NormalizeError::DataNotObject)?;
        match data.get("type").and_then(Value::as_str) {
            Some(event_type) if !event_type.is_empty() => {}
            _ => return Err(NormalizeError::MissingType),
        }
        extract_actor(data)?;
        Ok(())
    }

    /// Transform a raw submission into a canonical [`Event`].
    pub fn normalize(&self, raw: &RawEvent) -> Result<Event, NormalizeError> {
        self.validate_schema(raw)?;
        let data = raw.data.as_object().expect("schema validated");
        let event_type = data
            .get("type")
            .and_then(Value::as_str)
            .expect("schema validated")
            .to_string();
        let actor = extract_actor(data)?;

        // Caller-provided wall-clock time wins; otherwise stamp now.
        let timestamp = raw.timestamp.unwrap_or_else(Utc::now);

        // Seed this node's entry with a nanosecond stamp, fold in any
        // incoming clock, then tick our own entry past everything merged.
        let now_ns = Utc::now().timestamp_nanos_opt().unwrap_or(0);
        let mut vector_clock = VectorClock::seeded(self.node_id.clone(), now_ns);
        if let Some(incoming) = data.get("vector_clock").and_then(VectorClock::from_json) {
            vector_clock.merge(&incoming);
        }
        vector_clock.increment(&self.node_id);

        let event = Event {
            id: EventId::new(),
            event_type,
            source: raw.source.clone(),
            timestamp,
            actor,
            evidence: extract_evidence(data),
            vector_clock,
            metadata: EventMetadata {
                received_at: Utc::now(),
                processed_at: None,
                boundary_node: self.node_id.clone(),
                correlation_id: extract_correlation_id(data),
                retry_count: 0,
                schema_version: SCHEMA_VERSION.into(),
            },
        };

        debug!(event_id = %event.id, event_type = %event.event_type, source = %event.source,
               "normalized event");
        Ok(event)
    }
}

/// Pull actor information out of the payload.
///
/// A nested `actor` object wins; otherwise the flat `user_id`/`actor_id`
/// and `user_name`/`actor_name` keys are consulted. Name defaults to the
/// id, type to "user".
fn extract_actor(data: &serde_json::Map<String, Value>) -> Result<Actor, NormalizeError> {
    let mut actor = Actor::default();

    if let Some(nested) = data.get("actor").and_then(Value::as_object) {
        if let Some(id) = nested.get("id").and_then(Value::as_str) {
            actor.id = id.to_string();
        }
        if let Some(name) = nested.get("name").and_then(Value::as_str) {
            actor.name = name.to_string();
        }
        if let Some(kind) = nested.get("type").and_then(Value::as_str) {
            actor.kind = kind.to_string();
        }
    } else {
        if let Some(id) = string_key(data, "user_id").or_else(|| string_key(data, "actor_id")) {
            actor.id = id;
        }
        if let Some(name) =
            string_key(data, "user_name").or_else(|| string_key(data, "actor_name"))
        {
            actor.name = name;
        }
    }

    if actor.id.is_empty() {
        return Err(NormalizeError::MissingActorId);
    }
    if actor.name.is_empty() {
        actor.name = actor.id.clone();
    }
    if actor.kind.is_empty() {
        actor.kind = "user".into();
    }
    Ok(actor)
}

fn string_key(data: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}

fn extract_evidence(data: &serde_json::Map<String, Value>) -> BTreeMap<String, Value> {
    data.iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn extract_correlation_id(data: &serde_json::Map<String, Value>) -> String {
    match data.get("correlation_id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => uuid::Uuid::new_v4().to_string(),
    }
}
