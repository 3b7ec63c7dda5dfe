//! The VEPS event-certification pipeline.
//!
//! Turns a raw client submission into a causally-stamped, validated event:
//! the [`Normalizer`] canonicalizes input and assigns vector-clock
//! timestamps, and the [`BoundaryRouter`] performs the concurrent split
//! into a blocking integrity path and a detached context path. The
//! [`Pipeline`] entry ties the two together and measures each phase.
//!
//! The router depends only on the [`IntegrityHandler`] and
//! [`ContextHandler`] capability traits, supplied at construction, so test
//! doubles and the real validator/store implementations plug in without
//! type coupling.

pub mod config;
pub mod entry;
pub mod error;
pub mod normalizer;
pub mod router;
pub mod testing;

pub use config::PipelineConfig;
pub use entry::{BatchReport, IngestReport, Pipeline, Timings};
pub use error::{BatchError, NormalizeError, PipelineError};
pub use normalizer::Normalizer;
pub use router::{
    BoundaryRouter, ContextHandler, ContextState, IntegrityHandler, IntegrityVerdict,
    RouteOutcome, RouteResult,
};
