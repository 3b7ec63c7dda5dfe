use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use veps_types::{Event, RejectionDetails, VectorClock};

/// Millisecond timing breakdown attached to every ingest response.
///
/// `veps_internal_ms` is normalization + routing — the latency the
/// pipeline itself is accountable for, excluding the client round trip.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct PerformanceBreakdown {
    pub total_ms: f64,
    pub parsing_ms: f64,
    pub normalization_ms: f64,
    pub routing_ms: f64,
    pub veps_internal_ms: f64,
}

/// `data` payload of an accepted ingest response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IngestData {
    pub event: Event,
    pub integrity_success: bool,
    pub context_success: bool,
    pub routing_duration: String,
    pub performance_breakdown: PerformanceBreakdown,
}

/// `data` payload of a batch ingest response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub avg_duration: String,
}

/// Body of `POST /validate`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub event: Event,
    /// Routing tag set by the boundary router; informational.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
}

/// `data` payload of a validation verdict (200 pass / 412 veto).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerdictData {
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_checks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

impl VerdictData {
    pub fn passed() -> Self {
        Self {
            passed: true,
            failed_checks: Vec::new(),
            reasons: Vec::new(),
        }
    }

    pub fn vetoed(failed_checks: Vec<String>, reasons: Vec<String>) -> Self {
        Self {
            passed: false,
            failed_checks,
            reasons,
        }
    }
}

/// Body of `POST /update`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub event: Event,
    /// Currently only "upsert"; reserved for future operations.
    pub operation: String,
}

impl UpdateRequest {
    pub fn upsert(event: Event) -> Self {
        Self {
            event,
            operation: "upsert".into(),
        }
    }
}

/// Body of `POST /causality`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CausalityRequest {
    pub vector_clock: VectorClock,
}

/// `data` payload of a causality response (200 satisfied / 412 missing).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CausalityData {
    pub satisfied: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_nodes: Vec<String>,
}

/// Body of `POST /fracture` (and each element of `POST /fracture/batch`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FractureRequest {
    pub event: Event,
    pub failed_checks: Vec<String>,
    pub reasons: Vec<String>,
    pub veto_node: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl FractureRequest {
    /// The rejection details this request describes.
    pub fn rejection(&self) -> RejectionDetails {
        RejectionDetails {
            failed_checks: self.failed_checks.clone(),
            reasons: self.reasons.clone(),
            veto_node: self.veto_node.clone(),
            validation_duration: self.duration.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Map;
    use chrono::Utc;
    use serde_json::json;
    use veps_types::{Actor, EventId, EventMetadata, SCHEMA_VERSION};

    fn event() -> Event {
        Event {
            id: EventId::new(),
            event_type: "payment_processed".into(),
            source: "test".into(),
            timestamp: Utc::now(),
            actor: Actor::user("u1"),
            evidence: Map::from([("amount".to_string(), json!(100.0))]),
            vector_clock: VectorClock::seeded("node-a", 1),
            metadata: EventMetadata {
                received_at: Utc::now(),
                processed_at: None,
                boundary_node: "node-a".into(),
                correlation_id: "c1".into(),
                retry_count: 0,
                schema_version: SCHEMA_VERSION.into(),
            },
        }
    }

    #[test]
    fn verdict_data_omits_empty_lists() {
        let value = serde_json::to_value(VerdictData::passed()).unwrap();
        assert_eq!(value, json!({"passed": true}));

        let vetoed = VerdictData::vetoed(
            vec!["business_rules".into()],
            vec!["business_rules: payment amount exceeds limit: 5000000.00".into()],
        );
        let value = serde_json::to_value(vetoed).unwrap();
        assert_eq!(value["passed"], false);
        assert_eq!(value["failed_checks"][0], "business_rules");
    }

    #[test]
    fn update_request_defaults_to_upsert() {
        let request = UpdateRequest::upsert(event());
        assert_eq!(request.operation, "upsert");
    }

    #[test]
    fn fracture_request_to_rejection() {
        let request = FractureRequest {
            event: event(),
            failed_checks: vec!["temporal".into()],
            reasons: vec!["temporal: event timestamp is too old".into()],
            veto_node: "veto-1".into(),
            duration: Some("1.5ms".into()),
            correlation_id: None,
            metadata: Map::new(),
        };
        let rejection = request.rejection();
        assert_eq!(rejection.failed_checks, vec!["temporal"]);
        assert_eq!(rejection.veto_node, "veto-1");
        assert_eq!(rejection.validation_duration.as_deref(), Some("1.5ms"));
    }

    #[test]
    fn validate_request_roundtrip() {
        let request = ValidateRequest {
            event: event(),
            route: Some("veto_service".into()),
        };
        let text = serde_json::to_string(&request).unwrap();
        let decoded: ValidateRequest = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded.route.as_deref(), Some("veto_service"));
        assert_eq!(decoded.event.event_type, "payment_processed");
    }

    #[test]
    fn causality_data_shapes() {
        let satisfied = serde_json::to_value(CausalityData {
            satisfied: true,
            missing_nodes: Vec::new(),
        })
        .unwrap();
        assert_eq!(satisfied, json!({"satisfied": true}));

        let missing = serde_json::to_value(CausalityData {
            satisfied: false,
            missing_nodes: vec!["nodeX".into()],
        })
        .unwrap();
        assert_eq!(missing["missing_nodes"][0], "nodeX");
    }
}
