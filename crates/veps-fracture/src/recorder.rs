use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{error, info};

use veps_types::{Event, FractureId, FracturedEvent, RejectionDetails, ValidationOutcome};

use crate::archive::FractureArchive;

/// Captures rejected events into the archive without blocking the caller.
///
/// The archive write runs on a background task; a write failure is logged
/// at error level and dropped — the upstream router has already surfaced
/// the user-visible rejection, and the archive is an at-least-once log.
pub struct FractureRecorder {
    archive: Arc<dyn FractureArchive>,
    node_id: String,
}

impl FractureRecorder {
    pub fn new(archive: Arc<dyn FractureArchive>, node_id: impl Into<String>) -> Self {
        Self {
            archive,
            node_id: node_id.into(),
        }
    }

    /// The node identifier stamped as `veto_node` on every capture.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Capture a rejection produced by the validation pipeline.
    ///
    /// Returns the fresh fracture id immediately; the archive write
    /// completes in the background.
    pub fn record_outcome(&self, event: Event, outcome: &ValidationOutcome) -> FractureId {
        let rejection = RejectionDetails {
            failed_checks: outcome.failed_checks(),
            reasons: outcome.reasons(),
            veto_node: self.node_id.clone(),
            validation_duration: Some(format!("{:?}", outcome.duration)),
        };
        self.record(event, rejection, BTreeMap::new())
    }

    /// Capture an explicit rejection (used by the archive's own HTTP
    /// surface, where the rejection details arrive over the wire).
    pub fn record(
        &self,
        event: Event,
        rejection: RejectionDetails,
        extra_metadata: BTreeMap<String, serde_json::Value>,
    ) -> FractureId {
        let fracture = FracturedEvent::capture(event, rejection, extra_metadata);
        let fracture_id = fracture.fracture_id;

        info!(
            fracture_id = %fracture_id,
            event_id = %fracture.event.id,
            failed_checks = ?fracture.rejection.failed_checks,
            "recording fracture"
        );

        let archive = Arc::clone(&self.archive);
        tokio::spawn(async move {
            if let Err(err) = archive.append(&fracture).await {
                // No retry loop: the rejection already reached the caller.
                error!(fracture_id = %fracture_id, error = %err, "fracture archive write failed");
            }
        });

        fracture_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Map;
    use std::time::Duration;
    use chrono::Utc;
    use veps_types::{Actor, CheckResult, EventId, EventMetadata, VectorClock, SCHEMA_VERSION};

    use crate::memory::InMemoryArchive;

    fn vetoed_event() -> Event {
        Event {
            id: EventId::new(),
            event_type: "payment_processed".into(),
            source: "test".into(),
            timestamp: Utc::now(),
            actor: Actor::user("u1"),
            evidence: Map::new(),
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

    async fn wait_for_records(archive: &InMemoryArchive, count: usize) {
        for _ in 0..100 {
            if archive.len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("archive never reached {count} records");
    }

    #[tokio::test]
    async fn record_outcome_archives_in_background() {
        let archive = Arc::new(InMemoryArchive::new());
        let recorder = FractureRecorder::new(archive.clone(), "node-a");

        let event = vetoed_event();
        let event_id = event.id;
        let outcome = ValidationOutcome {
            checks: vec![
                CheckResult::pass("causality"),
                CheckResult::fail("business_rules", "payment amount exceeds limit: 5000000.00"),
            ],
            duration: Duration::from_millis(1),
        };

        let fracture_id = recorder.record_outcome(event, &outcome);
        wait_for_records(&archive, 1).await;

        let found = archive.find_by_event(&event_id);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].fracture_id, fracture_id);
        assert_eq!(found[0].rejection.failed_checks, vec!["business_rules"]);
        assert_eq!(found[0].rejection.veto_node, "node-a");
        assert!(found[0]
            .rejection
            .reasons[0]
            .ends_with("exceeds limit: 5000000.00"));
    }

    #[tokio::test]
    async fn fracture_ids_are_fresh_per_record() {
        let archive = Arc::new(InMemoryArchive::new());
        let recorder = FractureRecorder::new(archive.clone(), "node-a");
        let rejection = RejectionDetails {
            failed_checks: vec!["temporal".into()],
            reasons: vec!["temporal: event timestamp is too old".into()],
            veto_node: "node-a".into(),
            validation_duration: None,
        };

        let a = recorder.record(vetoed_event(), rejection.clone(), Map::new());
        let b = recorder.record(vetoed_event(), rejection, Map::new());
        assert_ne!(a, b);
        wait_for_records(&archive, 2).await;
    }
}
