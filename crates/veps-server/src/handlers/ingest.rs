use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::{info, warn};

use veps_pipeline::{BatchError, RouteOutcome};
use veps_protocol::{BatchSummary, Envelope, IngestData, PerformanceBreakdown, VerdictData};
use veps_types::RawEvent;

use crate::handlers::{bad_request, internal_error, reply, Reply};
use crate::runtime::SharedState;

fn millis(duration: std::time::Duration) -> f64 {
    duration.as_micros() as f64 / 1000.0
}

/// `POST /ingest` — decode, normalize, route, and answer with the full
/// timing breakdown.
pub async fn ingest(State(state): State<SharedState>, body: Bytes) -> Reply {
    let received = Instant::now();

    // Decode inside the handler so parse time is part of the breakdown.
    let raw: RawEvent = match serde_json::from_slice(&body) {
        Ok(raw) => raw,
        Err(err) => return bad_request(format!("invalid JSON: {err}")),
    };
    let parse = received.elapsed();

    let report = match state.pipeline.ingest(&raw).await {
        Ok(report) => report,
        Err(err) => return bad_request(format!("schema validation failed: {err}")),
    };

    let result = &report.result;
    let event_id = result.event.id;
    let total = received.elapsed();
    let breakdown = PerformanceBreakdown {
        total_ms: millis(total),
        parsing_ms: millis(parse),
        normalization_ms: millis(report.timings.normalize),
        routing_ms: millis(report.timings.route),
        veps_internal_ms: millis(report.timings.internal()),
    };

    match &result.outcome {
        RouteOutcome::Accepted => {
            let data = IngestData {
                event: (*result.event).clone(),
                integrity_success: true,
                context_success: result.context_success(),
                routing_duration: format!("{:?}", result.duration),
                performance_breakdown: breakdown,
            };
            info!(event_id = %event_id, internal_ms = breakdown.veps_internal_ms,
                  "event ingested and routed");
            reply(
                StatusCode::OK,
                Envelope::ok("Event ingested and routed successfully")
                    .with_event_id(event_id)
                    .with_duration(total)
                    .with_data(serde_json::to_value(data).unwrap_or_default()),
            )
        }
        RouteOutcome::Rejected {
            failed_checks,
            reasons,
        } => {
            warn!(event_id = %event_id, failed_checks = ?failed_checks, "event vetoed");
            let verdict = VerdictData::vetoed(failed_checks.clone(), reasons.clone());
            reply(
                StatusCode::PRECONDITION_FAILED,
                Envelope::failure("Event validation failed - VETOED")
                    .with_event_id(event_id)
                    .with_duration(total)
                    .with_data(serde_json::to_value(verdict).unwrap_or_default()),
            )
        }
        RouteOutcome::TimedOut => internal_error(format!(
            "event processing failed: integrity path timeout exceeded after {:?}",
            state.config.router_timeout
        )),
        RouteOutcome::Failed { message } => {
            internal_error(format!("event processing failed: {message}"))
        }
    }
}

/// `POST /ingest/batch` — up to the configured cap of submissions, all
/// processed; 207 when any failed.
pub async fn ingest_batch(State(state): State<SharedState>, body: Bytes) -> Reply {
    let started = Instant::now();

    let raws: Vec<RawEvent> = match serde_json::from_slice(&body) {
        Ok(raws) => raws,
        Err(err) => return bad_request(format!("invalid JSON: {err}")),
    };

    let report = match state.pipeline.ingest_batch(&raws).await {
        Ok(report) => report,
        Err(err @ (BatchError::Empty | BatchError::TooLarge { .. })) => {
            return bad_request(err.to_string());
        }
        Err(BatchError::Normalize { index, source }) => {
            return bad_request(format!("event {index} schema validation failed: {source}"));
        }
    };

    let total = raws.len();
    let succeeded = report.succeeded();
    let failed = report.failed();
    let duration = started.elapsed();
    let summary = BatchSummary {
        total,
        succeeded,
        failed,
        avg_duration: format!("{:?}", duration / total.max(1) as u32),
    };

    let status = if failed > 0 {
        StatusCode::MULTI_STATUS
    } else {
        StatusCode::OK
    };

    info!(total, succeeded, failed, "batch ingested");
    let envelope = Envelope {
        success: failed == 0,
        ..Envelope::ok(format!(
            "Batch processing complete: {succeeded} succeeded, {failed} failed"
        ))
    }
    .with_duration(duration)
    .with_data(serde_json::to_value(summary).unwrap_or_default());

    reply(status, envelope)
}

/// `GET /health` — liveness.
pub async fn health() -> Reply {
    reply(StatusCode::OK, Envelope::ok("VEPS boundary is healthy"))
}

/// `POST /warmup` — pre-fetch bearer tokens for the configured
/// downstream audiences so first requests skip the token round trip.
pub async fn warmup(State(state): State<SharedState>) -> Reply {
    let audiences = state.downstream_audiences();
    match state.tokens.warm(&audiences).await {
        Ok(warmed) => reply(
            StatusCode::OK,
            Envelope::ok(format!(
                "Warmup complete - {warmed} tokens cached, connections established"
            )),
        ),
        Err(err) => internal_error(format!("warmup failed: {err}")),
    }
}
