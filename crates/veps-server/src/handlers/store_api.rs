use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use tracing::info;

use veps_protocol::{CausalityData, CausalityRequest, Envelope, UpdateRequest};
use veps_store::EventFilter;
use veps_types::EventId;

use crate::handlers::{bad_request, internal_error, reply, Reply};
use crate::runtime::SharedState;

/// `POST /update` — upsert an event into the context store.
pub async fn update(State(state): State<SharedState>, body: Bytes) -> Reply {
    let request: UpdateRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => return bad_request(format!("invalid JSON: {err}")),
    };

    if request.operation != "upsert" {
        return bad_request(format!("unsupported operation: {}", request.operation));
    }

    match state.store.upsert(&request.event).await {
        Ok(()) => {
            info!(event_id = %request.event.id, "event upserted");
            reply(
                StatusCode::OK,
                Envelope::ok("Event upserted successfully").with_event_id(request.event.id),
            )
        }
        Err(err) => internal_error(format!("upsert failed: {err}")),
    }
}

#[derive(Deserialize)]
pub struct EventQuery {
    id: String,
}

/// `GET /event?id=<uuid>` — fetch one event.
pub async fn get_event(State(state): State<SharedState>, Query(query): Query<EventQuery>) -> Reply {
    let id: EventId = match query.id.parse() {
        Ok(id) => id,
        Err(_) => return bad_request(format!("invalid event id: {}", query.id)),
    };

    match state.store.get_by_id(&id).await {
        Ok(Some(event)) => reply(
            StatusCode::OK,
            Envelope::ok("Event found")
                .with_event_id(id)
                .with_data(serde_json::to_value(event).unwrap_or_default()),
        ),
        Ok(None) => reply(StatusCode::NOT_FOUND, Envelope::failure("event not found")),
        Err(err) => internal_error(format!("query failed: {err}")),
    }
}

/// `POST /causality` — 200 when satisfied, 412 with the missing nodes
/// otherwise.
pub async fn causality(State(state): State<SharedState>, body: Bytes) -> Reply {
    let request: CausalityRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => return bad_request(format!("invalid JSON: {err}")),
    };

    match state.store.check_causality(&request.vector_clock).await {
        Ok(status) => {
            let data = CausalityData {
                satisfied: status.satisfied,
                missing_nodes: status.missing_nodes,
            };
            let http_status = if data.satisfied {
                StatusCode::OK
            } else {
                StatusCode::PRECONDITION_FAILED
            };
            let envelope = Envelope {
                success: data.satisfied,
                ..Envelope::ok("Causality checked")
            }
            .with_data(serde_json::to_value(data).unwrap_or_default());
            reply(http_status, envelope)
        }
        Err(err) => internal_error(format!("causality check failed: {err}")),
    }
}

/// `POST /events/query` — filtered read path for retrieval surfaces.
pub async fn query_events(State(state): State<SharedState>, body: Bytes) -> Reply {
    let filter: EventFilter = match serde_json::from_slice(&body) {
        Ok(filter) => filter,
        Err(err) => return bad_request(format!("invalid JSON: {err}")),
    };

    match state.store.query(&filter).await {
        Ok(events) => reply(
            StatusCode::OK,
            Envelope::ok(format!("{} events matched", events.len()))
                .with_data(serde_json::to_value(events).unwrap_or_default()),
        ),
        Err(err) => internal_error(format!("query failed: {err}")),
    }
}

/// `GET /health` for the store surface — pings the backing store.
pub async fn health(State(state): State<SharedState>) -> Reply {
    match state.store.health().await {
        Ok(()) => reply(StatusCode::OK, Envelope::ok("VEPS context store is healthy")),
        Err(err) => internal_error(format!("store unhealthy: {err}")),
    }
}
