use thiserror::Error;

/// Schema violations surfaced before any I/O happens.
///
/// Each variant names the first missing or ill-typed required field, in
/// the words the caller sees at the 400 boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("source is required")]
    MissingSource,

    #[error("data must be a JSON object")]
    DataNotObject,

    #[error("event type is required in data")]
    MissingType,

    #[error("actor ID is required")]
    MissingActorId,
}

/// Failures inside the integrity path that are not vetoes: the check
/// pipeline could not run at all.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("downstream unavailable: {0}")]
    Downstream(String),

    #[error("internal pipeline error: {0}")]
    Internal(String),
}

/// Batch-entry bound violations and per-record normalization failures.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("batch cannot be empty")]
    Empty,

    #[error("batch size exceeds maximum of {max} events")]
    TooLarge { max: usize },

    #[error("event {index} failed normalization: {source}")]
    Normalize {
        index: usize,
        #[source]
        source: NormalizeError,
    },
}
