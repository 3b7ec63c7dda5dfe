//! Foundation types for the Verification and Event Processing Service (VEPS).
//!
//! This crate provides the canonical event model, the vector-clock algebra
//! used for causal ordering, and the validation/fracture record types shared
//! across the pipeline. Every other VEPS crate depends on `veps-types`.
//!
//! # Key Types
//!
//! - [`Event`] — Canonical record produced by the normalizer
//! - [`VectorClock`] — Node-id → logical-counter map for causal ordering
//! - [`RawEvent`] — Semi-structured client submission, pre-normalization
//! - [`ValidationOutcome`] — Aggregated result of the layered check pipeline
//! - [`FracturedEvent`] — Immutable audit record for a vetoed event

pub mod clock;
pub mod event;
pub mod fracture;
pub mod outcome;

pub use clock::VectorClock;
pub use event::{Actor, Event, EventId, EventMetadata, RawEvent, SCHEMA_VERSION};
pub use fracture::{FractureContext, FractureId, FracturedEvent, RejectionDetails};
pub use outcome::{CheckResult, ValidationOutcome};
