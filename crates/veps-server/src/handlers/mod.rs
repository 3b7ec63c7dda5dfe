//! HTTP handlers for the four VEPS surfaces.

pub mod fracture_api;
pub mod ingest;
pub mod store_api;
pub mod validate;

use axum::http::StatusCode;
use axum::response::Json;

use veps_protocol::Envelope;

/// An envelope response with an explicit status code.
pub type Reply = (StatusCode, Json<Envelope>);

pub(crate) fn reply(status: StatusCode, envelope: Envelope) -> Reply {
    (status, Json(envelope))
}

pub(crate) fn bad_request(message: impl Into<String>) -> Reply {
    reply(StatusCode::BAD_REQUEST, Envelope::failure(message))
}

pub(crate) fn internal_error(message: impl Into<String>) -> Reply {
    reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        Envelope::failure(message),
    )
}
