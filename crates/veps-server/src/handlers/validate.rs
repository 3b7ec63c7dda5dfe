use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::{info, warn};

use veps_protocol::{Envelope, ValidateRequest, VerdictData};

use crate::handlers::{bad_request, internal_error, reply, Reply};
use crate::runtime::SharedState;

/// `POST /validate` — run the check pipeline over one event.
///
/// 200 on pass, 412 on veto with the complete failure list, 500 when the
/// pipeline itself could not run. A veto is also handed to the fracture
/// recorder here, so remote boundary deployments get audit capture from
/// the validating node.
pub async fn validate(State(state): State<SharedState>, body: Bytes) -> Reply {
    let started = Instant::now();

    let request: ValidateRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => return bad_request(format!("invalid JSON: {err}")),
    };

    if request.event.event_type.is_empty() {
        return bad_request("event type is required");
    }

    let event = request.event;
    let outcome = match state.validator.validate(&event).await {
        Ok(outcome) => outcome,
        Err(err) => return internal_error(format!("validation failed: {err}")),
    };
    let duration = started.elapsed();

    if !outcome.passed() {
        let failed_checks = outcome.failed_checks();
        let reasons = outcome.reasons();
        warn!(event_id = %event.id, failed_checks = ?failed_checks, "event vetoed");

        let event_id = event.id;
        state.recorder.record_outcome(event, &outcome);

        return reply(
            StatusCode::PRECONDITION_FAILED,
            Envelope::failure("Event validation failed - VETOED")
                .with_event_id(event_id)
                .with_duration(duration)
                .with_data(
                    serde_json::to_value(VerdictData::vetoed(failed_checks, reasons))
                        .unwrap_or_default(),
                ),
        );
    }

    info!(event_id = %event.id, duration_us = duration.as_micros() as u64,
          "event passed validation");
    reply(
        StatusCode::OK,
        Envelope::ok("Event validation passed")
            .with_event_id(event.id)
            .with_duration(duration)
            .with_data(serde_json::to_value(VerdictData::passed()).unwrap_or_default()),
    )
}

/// `GET /health` for the validator surface.
pub async fn health() -> Reply {
    reply(StatusCode::OK, Envelope::ok("VEPS validator is healthy"))
}
