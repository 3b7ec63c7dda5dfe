//! Context store facade for VEPS.
//!
//! The context store holds every event the pipeline has persisted and is
//! the ground truth for causality queries. This crate defines the
//! [`ContextStore`] trait the validator and router depend on, plus an
//! in-memory reference implementation used in tests and embedded
//! deployments. The HTTP-backed implementation lives in `veps-client`.

pub mod error;
pub mod filter;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use filter::EventFilter;
pub use memory::InMemoryContextStore;
pub use traits::{CausalityStatus, ContextStore};
