use async_trait::async_trait;

use veps_store::ContextStore;
use veps_types::Event;

use crate::error::ValidatorResult;

/// The outcome of a single check evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckDecision {
    /// The check passed.
    Pass,
    /// The check failed; the event should be vetoed.
    Fail { reason: String },
}

impl CheckDecision {
    pub fn fail(reason: impl Into<String>) -> Self {
        Self::Fail {
            reason: reason.into(),
        }
    }

    /// Returns `true` if the decision is `Pass`.
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// A single evaluation check in the validation pipeline.
///
/// Checks are evaluated in registration order and each one runs regardless
/// of earlier failures. A check may issue store reads but must not mutate
/// state. The trait is object-safe and `Send + Sync` so checks can be
/// stored in a `Vec<Box<dyn EventCheck>>`.
#[async_trait]
pub trait EventCheck: Send + Sync {
    /// Stable name of this check, e.g. "causality" or "business_rules".
    /// Surfaced verbatim in `failed_checks` so callers can react
    /// programmatically.
    fn name(&self) -> &'static str;

    /// Evaluate the event and return a decision.
    ///
    /// `Err` means the check itself could not run (e.g. the store was
    /// unreachable) and aborts the whole validation, which is distinct
    /// from a veto.
    async fn evaluate(&self, event: &Event, store: &dyn ContextStore)
        -> ValidatorResult<CheckDecision>;
}
