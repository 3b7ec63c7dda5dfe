//! HTTP surfaces for VEPS.
//!
//! One crate hosts all four service roles — boundary (ingest), validator,
//! context store, and fracture archive — as axum routers over a shared
//! [`AppState`](runtime::AppState). A process serves one role (or all of
//! them standalone) depending on its configuration; remote collaborators
//! are wired in automatically when their URLs are configured.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod runtime;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use router::{
    build_fracture_router, build_ingest_router, build_standalone_router, build_store_router,
    build_validator_router,
};
pub use runtime::{AppState, LocalIntegrityHandler, SharedState, StoreContextHandler};
pub use server::{ServerRole, VepsServer};

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use chrono::{Timelike, Utc};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use veps_client::TokenCache;
    use veps_fracture::{fracture_bucket, FractureArchive, FractureRecorder, InMemoryArchive};
    use veps_pipeline::testing::MockContextHandler;
    use veps_pipeline::{ContextHandler, IntegrityHandler, IntegrityVerdict, PipelineError};
    use veps_store::{ContextStore, InMemoryContextStore};
    use veps_types::Event;
    use veps_validator::{Validator, ValidatorConfig};

    use super::config::ServerConfig;
    use super::router::build_standalone_router;
    use super::runtime::{AppState, LocalIntegrityHandler, SharedState, StoreContextHandler};

    // -----------------------------------------------------------------------
    // Harness
    // -----------------------------------------------------------------------

    struct Fixture {
        state: SharedState,
        store: Arc<InMemoryContextStore>,
        archive: Arc<InMemoryArchive>,
    }

    impl Fixture {
        fn app(&self) -> Router {
            build_standalone_router(Arc::clone(&self.state))
        }
    }

    fn test_config() -> ServerConfig {
        ServerConfig {
            node_id: "node-test".into(),
            ..Default::default()
        }
    }

    /// Standalone state over in-memory collaborators, with the concrete
    /// store and archive kept for inspection.
    fn standalone_fixture() -> Fixture {
        let config = test_config();
        let store = Arc::new(InMemoryContextStore::new());
        let archive = Arc::new(InMemoryArchive::new());
        let validator = Arc::new(Validator::with_default_checks(
            store.clone() as Arc<dyn ContextStore>,
            &ValidatorConfig::default(),
        ));
        let recorder = Arc::new(FractureRecorder::new(
            archive.clone() as Arc<dyn FractureArchive>,
            config.node_id.clone(),
        ));
        let integrity = Arc::new(LocalIntegrityHandler::new(
            Arc::clone(&validator),
            Arc::clone(&recorder),
        ));
        let context = Arc::new(StoreContextHandler::new(store.clone() as Arc<dyn ContextStore>));
        let state = AppState::assemble(
            config,
            store.clone(),
            archive.clone(),
            validator,
            recorder,
            integrity,
            context,
            Arc::new(TokenCache::unauthenticated()),
        );
        Fixture {
            state,
            store,
            archive,
        }
    }

    /// Same as [`standalone_fixture`] but with scripted router paths.
    fn scripted_fixture(
        integrity: Arc<dyn IntegrityHandler>,
        context: Arc<dyn ContextHandler>,
    ) -> Fixture {
        let config = test_config();
        let store = Arc::new(InMemoryContextStore::new());
        let archive = Arc::new(InMemoryArchive::new());
        let validator = Arc::new(Validator::with_default_checks(
            store.clone() as Arc<dyn ContextStore>,
            &ValidatorConfig::default(),
        ));
        let recorder = Arc::new(FractureRecorder::new(
            archive.clone() as Arc<dyn FractureArchive>,
            config.node_id.clone(),
        ));
        let state = AppState::assemble(
            config,
            store.clone(),
            archive.clone(),
            validator,
            recorder,
            integrity,
            context,
            Arc::new(TokenCache::unauthenticated()),
        );
        Fixture {
            state,
            store,
            archive,
        }
    }

    async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn get_raw(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    fn payment_submission(amount: f64) -> Value {
        json!({
            "source": "test",
            "data": {
                "type": "payment_processed",
                "actor": {"id": "u1", "name": "Alice", "type": "user"},
                "amount": amount,
                "currency": "USD"
            }
        })
    }

    /// Bounded grace window for the fire-and-forget archive write.
    async fn wait_for_fracture(archive: &InMemoryArchive, count: usize) {
        for _ in 0..200 {
            if archive.len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("archive never reached {count} records");
    }

    // -----------------------------------------------------------------------
    // Accepted submissions
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn accepted_payment_reports_timing_breakdown() {
        let fixture = standalone_fixture();
        let (status, body) = post(fixture.app(), "/ingest", payment_submission(100.0)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        // event_id is a UUID.
        let event_id = body["event_id"].as_str().unwrap();
        assert!(event_id.parse::<uuid::Uuid>().is_ok());

        let data = &body["data"];
        assert_eq!(data["integrity_success"], true);
        let internal = data["performance_breakdown"]["veps_internal_ms"]
            .as_f64()
            .unwrap();
        assert!(internal < 50.0, "veps_internal_ms = {internal}");
        assert_eq!(data["event"]["type"], "payment_processed");
        assert_eq!(data["event"]["actor"]["id"], "u1");
    }

    // -----------------------------------------------------------------------
    // Vetoed submissions + fracture durability
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn high_value_payment_is_vetoed_and_archived() {
        let fixture = standalone_fixture();
        let (status, body) =
            post(fixture.app(), "/ingest", payment_submission(5_000_000.0)).await;

        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(body["success"], false);
        let failed_checks: Vec<&str> = body["data"]["failed_checks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|check| check.as_str().unwrap())
            .collect();
        assert!(failed_checks.contains(&"business_rules"));
        let reasons = body["data"]["reasons"].as_array().unwrap();
        assert!(reasons
            .iter()
            .any(|reason| reason.as_str().unwrap().ends_with("exceeds limit: 5000000.00")));

        // The fracture record lands in the archive within a bounded grace
        // window, with matching event id and failed checks.
        wait_for_fracture(&fixture.archive, 1).await;
        let event_id: veps_types::EventId = body["event_id"].as_str().unwrap().parse().unwrap();
        let fractures = fixture.archive.find_by_event(&event_id);
        assert_eq!(fractures.len(), 1);
        assert!(fractures[0]
            .rejection
            .failed_checks
            .contains(&"business_rules".to_string()));

        // Bucketed under the hour of the event's timestamp.
        let hour = fractures[0].event.timestamp.hour();
        assert!(fracture_bucket(&fractures[0]).ends_with(&format!("fractures-{hour:02}.jsonl")));
        assert_eq!(
            fixture.archive.bucket_paths(),
            vec![fracture_bucket(&fractures[0])]
        );
    }

    // -----------------------------------------------------------------------
    // Stale submissions
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn stale_event_is_vetoed() {
        let fixture = standalone_fixture();
        let stale = Utc::now() - chrono::Duration::hours(2);
        let submission = json!({
            "source": "test",
            "timestamp": stale.to_rfc3339(),
            "data": {
                "type": "payment_processed",
                "actor": {"id": "u1", "name": "Alice", "type": "user"},
                "amount": 100.0
            }
        });
        let (status, body) = post(fixture.app(), "/ingest", submission).await;

        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        let failed_checks = body["data"]["failed_checks"].as_array().unwrap();
        assert!(failed_checks.iter().any(|check| check == "temporal"));
        let reasons = body["data"]["reasons"].as_array().unwrap();
        assert!(reasons
            .iter()
            .any(|reason| reason.as_str().unwrap().contains("too old")));

        // The audit record is bucketed by the stale event time, two hours
        // behind the capture time.
        wait_for_fracture(&fixture.archive, 1).await;
        let bucket = &fixture.archive.bucket_paths()[0];
        assert!(bucket.ends_with(&format!("fractures-{:02}.jsonl", stale.hour())));
    }

    // -----------------------------------------------------------------------
    // Causal dependencies
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn unmet_causal_dependency_is_vetoed() {
        let fixture = standalone_fixture();

        // Seed history for this boundary node so only nodeX is missing.
        let (seed_status, _) = post(fixture.app(), "/ingest", payment_submission(10.0)).await;
        assert_eq!(seed_status, StatusCode::OK);
        // The seed's context write must be durable before validation reads.
        for _ in 0..200 {
            if !fixture.store.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let submission = json!({
            "source": "test",
            "data": {
                "type": "user_login",
                "user_id": "u1",
                "vector_clock": {"nodeX": 999_999_999}
            }
        });
        let (status, body) = post(fixture.app(), "/ingest", submission).await;

        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        let failed_checks = body["data"]["failed_checks"].as_array().unwrap();
        assert!(failed_checks.iter().any(|check| check == "causality"));
        let reasons = body["data"]["reasons"].as_array().unwrap();
        assert!(reasons
            .iter()
            .any(|reason| reason.as_str().unwrap().contains("missing nodes: [nodeX]")));
    }

    // -----------------------------------------------------------------------
    // Context-path degradation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn degraded_context_store_never_blocks_an_accept() {
        // Real integrity path, failing context store.
        let store = Arc::new(InMemoryContextStore::new());
        let archive = Arc::new(InMemoryArchive::new());
        let validator = Arc::new(Validator::with_default_checks(
            store.clone() as Arc<dyn ContextStore>,
            &ValidatorConfig::default(),
        ));
        let recorder = Arc::new(FractureRecorder::new(
            archive.clone() as Arc<dyn FractureArchive>,
            "node-test",
        ));
        let integrity = Arc::new(LocalIntegrityHandler::new(validator.clone(), recorder.clone()));
        let fixture = scripted_fixture(integrity, Arc::new(MockContextHandler::failing()));

        let (status, body) = post(fixture.app(), "/ingest", payment_submission(100.0)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["integrity_success"], true);
        assert_eq!(body["data"]["context_success"], false);
    }

    // -----------------------------------------------------------------------
    // Router deadline
    // -----------------------------------------------------------------------

    /// Wraps the real integrity handler with an artificial delay.
    struct DelayedIntegrity {
        inner: LocalIntegrityHandler,
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl IntegrityHandler for DelayedIntegrity {
        async fn check_integrity(
            &self,
            event: &Event,
        ) -> Result<IntegrityVerdict, PipelineError> {
            tokio::time::sleep(self.delay).await;
            self.inner.check_integrity(event).await
        }
    }

    #[tokio::test]
    async fn slow_integrity_path_times_out_and_retry_succeeds() {
        let store = Arc::new(InMemoryContextStore::new());
        let archive = Arc::new(InMemoryArchive::new());
        let validator = Arc::new(Validator::with_default_checks(
            store.clone() as Arc<dyn ContextStore>,
            &ValidatorConfig::default(),
        ));
        let recorder = Arc::new(FractureRecorder::new(
            archive.clone() as Arc<dyn FractureArchive>,
            "node-test",
        ));
        let delayed = Arc::new(DelayedIntegrity {
            inner: LocalIntegrityHandler::new(validator.clone(), recorder.clone()),
            delay: Duration::from_millis(200),
        });
        let fixture = scripted_fixture(delayed, Arc::new(MockContextHandler::succeeding()));

        let (status, body) = post(fixture.app(), "/ingest", payment_submission(100.0)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("timeout"));

        // Timeouts are not vetoes: even after the detached integrity task
        // finishes, no fracture is written for this valid event. The
        // recorder writes to `archive`, not the fixture's own.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(archive.is_empty());

        // A retry with the delay removed succeeds.
        let integrity = Arc::new(LocalIntegrityHandler::new(validator, recorder));
        let retry = scripted_fixture(integrity, Arc::new(MockContextHandler::succeeding()));
        let (status, body) = post(retry.app(), "/ingest", payment_submission(100.0)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["integrity_success"], true);
    }

    // -----------------------------------------------------------------------
    // Input errors
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn malformed_json_is_a_400() {
        let fixture = standalone_fixture();
        let response = fixture
            .app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/ingest")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn schema_violation_is_a_400_with_field_message() {
        let fixture = standalone_fixture();
        let submission = json!({"source": "test", "data": {"type": "user_login"}});
        let (status, body) = post(fixture.app(), "/ingest", submission).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("actor ID is required"));
    }

    // -----------------------------------------------------------------------
    // Batch entry
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn batch_mixed_results_return_207() {
        let fixture = standalone_fixture();
        let batch = json!([
            payment_submission(100.0),
            payment_submission(5_000_000.0),
            payment_submission(20.0),
        ]);
        let (status, body) = post(fixture.app(), "/ingest/batch", batch).await;

        assert_eq!(status, StatusCode::MULTI_STATUS);
        assert_eq!(body["success"], false);
        assert_eq!(body["data"]["total"], 3);
        assert_eq!(body["data"]["succeeded"], 2);
        assert_eq!(body["data"]["failed"], 1);
        assert!(body["data"]["avg_duration"].is_string());
    }

    #[tokio::test]
    async fn batch_all_accepted_returns_200() {
        let fixture = standalone_fixture();
        let batch = json!([payment_submission(1.0), payment_submission(2.0)]);
        let (status, body) = post(fixture.app(), "/ingest/batch", batch).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["failed"], 0);
    }

    #[tokio::test]
    async fn batch_bounds_are_rejected() {
        let fixture = standalone_fixture();
        let (status, body) = post(fixture.app(), "/ingest/batch", json!([])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("empty"));

        let oversize: Vec<Value> = (0..101).map(|_| payment_submission(1.0)).collect();
        let (status, body) = post(fixture.app(), "/ingest/batch", json!(oversize)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("maximum"));
    }

    // -----------------------------------------------------------------------
    // Validator surface
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn validate_endpoint_passes_and_vetoes() {
        let fixture = standalone_fixture();

        // Normalize an event through the pipeline's own normalizer.
        let raw: veps_types::RawEvent =
            serde_json::from_value(payment_submission(100.0)).unwrap();
        let event = fixture
            .state
            .pipeline
            .normalizer()
            .normalize(&raw)
            .unwrap();

        let (status, body) = post(
            fixture.app(),
            "/validate",
            json!({"event": &event, "route": "veto_service"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["passed"], true);

        let mut vetoed = event.clone();
        vetoed
            .evidence
            .insert("amount".into(), json!(5_000_000.0));
        let (status, body) = post(fixture.app(), "/validate", json!({"event": vetoed})).await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(body["data"]["passed"], false);
        assert!(body["data"]["failed_checks"]
            .as_array()
            .unwrap()
            .iter()
            .any(|check| check == "business_rules"));

        // The veto surface records the fracture itself.
        wait_for_fracture(&fixture.archive, 1).await;
    }

    // -----------------------------------------------------------------------
    // Store surface
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn store_update_get_and_causality() {
        let fixture = standalone_fixture();
        let raw: veps_types::RawEvent =
            serde_json::from_value(payment_submission(50.0)).unwrap();
        let event = fixture
            .state
            .pipeline
            .normalizer()
            .normalize(&raw)
            .unwrap();

        let (status, body) = post(
            fixture.app(),
            "/update",
            json!({"event": &event, "operation": "upsert"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["event_id"], event.id.to_string());

        let (status, body) =
            get_raw(fixture.app(), &format!("/event?id={}", event.id)).await;
        assert_eq!(status, StatusCode::OK);
        let envelope: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(envelope["data"]["id"], event.id.to_string());

        let (status, _) = get_raw(
            fixture.app(),
            &format!("/event?id={}", veps_types::EventId::new()),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Satisfied causality: the upserted event backs its own node.
        let (status, body) = post(
            fixture.app(),
            "/causality",
            json!({"vector_clock": event.vector_clock}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["satisfied"], true);

        // Unsatisfied: a node with no history answers 412.
        let (status, body) = post(
            fixture.app(),
            "/causality",
            json!({"vector_clock": {"nodeX": 12}}),
        )
        .await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(body["data"]["satisfied"], false);
        assert_eq!(body["data"]["missing_nodes"][0], "nodeX");

        let (status, body) = post(
            fixture.app(),
            "/update",
            json!({"event": &event, "operation": "append"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("unsupported operation"));
    }

    // -----------------------------------------------------------------------
    // Fracture surface
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn fracture_log_and_read_by_date() {
        let fixture = standalone_fixture();
        let raw: veps_types::RawEvent =
            serde_json::from_value(payment_submission(99.0)).unwrap();
        let event = fixture
            .state
            .pipeline
            .normalizer()
            .normalize(&raw)
            .unwrap();

        let (status, body) = post(
            fixture.app(),
            "/fracture",
            json!({
                "event": &event,
                "failed_checks": ["business_rules"],
                "reasons": ["business_rules: payment amount exceeds limit: 5000000.00"],
                "veto_node": "veto-1",
                "duration": "1.2ms"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["fracture_id"].is_string());

        wait_for_fracture(&fixture.archive, 1).await;

        let date = event.timestamp.format("%Y-%m-%d").to_string();
        let (status, body) = get_raw(fixture.app(), &format!("/fractures?date={date}")).await;
        assert_eq!(status, StatusCode::OK);
        let lines: Vec<&str> = body.lines().filter(|line| !line.is_empty()).collect();
        assert_eq!(lines.len(), 1);
        let record: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(record["event"]["id"], event.id.to_string());
        assert_eq!(record["rejection"]["veto_node"], "veto-1");
    }

    #[tokio::test]
    async fn fracture_requires_failed_checks() {
        let fixture = standalone_fixture();
        let raw: veps_types::RawEvent =
            serde_json::from_value(payment_submission(10.0)).unwrap();
        let event = fixture
            .state
            .pipeline
            .normalizer()
            .normalize(&raw)
            .unwrap();

        let (status, body) = post(
            fixture.app(),
            "/fracture",
            json!({
                "event": &event,
                "failed_checks": [],
                "reasons": [],
                "veto_node": "veto-1"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("failed_checks"));
    }

    #[tokio::test]
    async fn fracture_batch_is_queued() {
        let fixture = standalone_fixture();
        let raw: veps_types::RawEvent =
            serde_json::from_value(payment_submission(10.0)).unwrap();
        let event = fixture
            .state
            .pipeline
            .normalizer()
            .normalize(&raw)
            .unwrap();
        let entry = json!({
            "event": &event,
            "failed_checks": ["temporal"],
            "reasons": ["temporal: event timestamp is too old"],
            "veto_node": "veto-1"
        });

        let (status, body) = post(
            fixture.app(),
            "/fracture/batch",
            json!([entry.clone(), entry]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["queued"], 2);
        wait_for_fracture(&fixture.archive, 2).await;
    }

    // -----------------------------------------------------------------------
    // Health / warmup
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn health_endpoint() {
        let fixture = standalone_fixture();
        let (status, body) = get_raw(fixture.app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("healthy"));
    }

    #[tokio::test]
    async fn warmup_without_downstreams_is_ok() {
        let fixture = standalone_fixture();
        let (status, body) = post(fixture.app(), "/warmup", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().contains("Warmup complete"));
    }
}
