//! Wire types for the VEPS HTTP surfaces.
//!
//! Defines the standard response envelope shared by every service role and
//! the request/response bodies of the ingest, validator, context-store, and
//! fracture-archive endpoints. Both the axum handlers (`veps-server`) and
//! the outbound clients (`veps-client`) speak these types, so the two sides
//! cannot drift.

pub mod envelope;
pub mod messages;

pub use envelope::Envelope;
pub use messages::{
    BatchSummary, CausalityData, CausalityRequest, FractureRequest, IngestData,
    PerformanceBreakdown, UpdateRequest, ValidateRequest, VerdictData,
};
