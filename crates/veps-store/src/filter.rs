use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use veps_types::Event;

/// Filter for the batch read path.
///
/// All set fields must match; an empty filter matches every event.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Only events with `timestamp >= since`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
    /// Only events with `timestamp < until`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
    /// Cap on returned rows; implementations may clamp further.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl EventFilter {
    /// Returns `true` if the event satisfies every set field.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(ref event_type) = self.event_type {
            if &event.event_type != event_type {
                return false;
            }
        }
        if let Some(ref source) = self.source {
            if &event.source != source {
                return false;
            }
        }
        if let Some(ref actor_id) = self.actor_id {
            if &event.actor.id != actor_id {
                return false;
            }
        }
        if let Some(ref correlation_id) = self.correlation_id {
            if &event.metadata.correlation_id != correlation_id {
                return false;
            }
        }
        if let Some(since) = self.since {
            if event.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if event.timestamp >= until {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use veps_types::{Actor, EventId, EventMetadata, VectorClock, SCHEMA_VERSION};

    fn event(event_type: &str, source: &str, actor: &str) -> Event {
        Event {
            id: EventId::new(),
            event_type: event_type.into(),
            source: source.into(),
            timestamp: Utc::now(),
            actor: Actor::user(actor),
            evidence: BTreeMap::new(),
            vector_clock: VectorClock::new(),
            metadata: EventMetadata {
                received_at: Utc::now(),
                processed_at: None,
                boundary_node: "n1".into(),
                correlation_id: "c1".into(),
                retry_count: 0,
                schema_version: SCHEMA_VERSION.into(),
            },
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = EventFilter::default();
        assert!(filter.matches(&event("user_login", "web", "u1")));
    }

    #[test]
    fn type_and_actor_filters() {
        let filter = EventFilter {
            event_type: Some("withdrawal".into()),
            actor_id: Some("u2".into()),
            ..Default::default()
        };
        assert!(filter.matches(&event("withdrawal", "web", "u2")));
        assert!(!filter.matches(&event("withdrawal", "web", "u1")));
        assert!(!filter.matches(&event("user_login", "web", "u2")));
    }

    #[test]
    fn time_window_filter() {
        let sample = event("user_login", "web", "u1");
        let filter = EventFilter {
            since: Some(sample.timestamp - chrono::Duration::minutes(1)),
            until: Some(sample.timestamp + chrono::Duration::minutes(1)),
            ..Default::default()
        };
        assert!(filter.matches(&sample));

        let past_only = EventFilter {
            until: Some(sample.timestamp - chrono::Duration::minutes(5)),
            ..Default::default()
        };
        assert!(!past_only.matches(&sample));
    }
}
