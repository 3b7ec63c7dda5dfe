use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use veps_fracture::CONTENT_TYPE;
use veps_protocol::{Envelope, FractureRequest};
use veps_types::FracturedEvent;

use crate::handlers::{bad_request, internal_error, reply, Reply};
use crate::runtime::SharedState;

/// `POST /fracture` — queue one rejection for archival, answer
/// immediately (fire-and-forget).
pub async fn log_fracture(State(state): State<SharedState>, body: Bytes) -> Reply {
    let request: FractureRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => return bad_request(format!("invalid JSON: {err}")),
    };

    if request.failed_checks.is_empty() {
        return bad_request("failed_checks is required");
    }

    let event_id = request.event.id;
    let failed_checks = request.failed_checks.clone();
    let rejection = request.rejection();
    let fracture_id = state
        .recorder
        .record(request.event, rejection, request.metadata);

    reply(
        StatusCode::OK,
        Envelope::ok("Fracture logged successfully").with_data(json!({
            "fracture_id": fracture_id.to_string(),
            "event_id": event_id.to_string(),
            "failed_checks": failed_checks,
        })),
    )
}

/// `POST /fracture/batch` — up to 100 rejections, grouped by hour before
/// writing; the write itself happens on a background task.
pub async fn log_fracture_batch(State(state): State<SharedState>, body: Bytes) -> Reply {
    let requests: Vec<FractureRequest> = match serde_json::from_slice(&body) {
        Ok(requests) => requests,
        Err(err) => return bad_request(format!("invalid JSON: {err}")),
    };

    if requests.is_empty() {
        return bad_request("batch cannot be empty");
    }
    if requests.len() > 100 {
        return bad_request("batch size exceeds maximum of 100 entries");
    }
    if let Some(index) = requests.iter().position(|req| req.failed_checks.is_empty()) {
        return bad_request(format!("entry {index}: failed_checks is required"));
    }

    let fractures: Vec<FracturedEvent> = requests
        .into_iter()
        .map(|request| {
            let rejection = request.rejection();
            let metadata = request.metadata.clone();
            FracturedEvent::capture(request.event, rejection, metadata)
        })
        .collect();
    let count = fractures.len();

    let archive = Arc::clone(&state.archive);
    tokio::spawn(async move {
        if let Err(err) = archive.append_batch(fractures).await {
            error!(error = %err, "fracture batch archive write failed");
        }
    });

    info!(count, "fracture batch queued");
    reply(
        StatusCode::OK,
        Envelope::ok(format!("Batch of {count} fractures queued")).with_data(json!({
            "queued": count,
        })),
    )
}

#[derive(Deserialize)]
pub struct FractureQuery {
    date: String,
}

/// `GET /fractures?date=YYYY-MM-DD` — the day's hour files concatenated,
/// one JSON object per line.
pub async fn read_fractures(
    State(state): State<SharedState>,
    Query(query): Query<FractureQuery>,
) -> Response {
    let date = match NaiveDate::parse_from_str(&query.date, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => {
            return bad_request(format!("invalid date: {} (expected YYYY-MM-DD)", query.date))
                .into_response();
        }
    };

    match state.archive.read_date(date).await {
        Ok(records) => {
            let mut body = String::new();
            for record in &records {
                match serde_json::to_string(record) {
                    Ok(line) => {
                        body.push_str(&line);
                        body.push('\n');
                    }
                    Err(err) => {
                        return internal_error(format!("encode failed: {err}")).into_response();
                    }
                }
            }
            ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response()
        }
        Err(err) => internal_error(format!("archive read failed: {err}")).into_response(),
    }
}

/// `GET /health` for the fracture surface.
pub async fn health() -> Reply {
    reply(
        StatusCode::OK,
        Envelope::ok("VEPS fracture archive is healthy"),
    )
}
