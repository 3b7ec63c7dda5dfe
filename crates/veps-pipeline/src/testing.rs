//! Test doubles for the boundary router's collaborators.
//!
//! Used by this crate's own tests and by downstream endpoint tests that
//! need a delayed or failing path (e.g. exercising the router deadline or
//! a degraded context store).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use veps_types::Event;

use crate::error::PipelineError;
use crate::router::{ContextHandler, IntegrityHandler, IntegrityVerdict};

/// Scripted integrity handler: optional delay, fixed verdict or failure.
pub struct MockIntegrityHandler {
    delay: Duration,
    response: Result<IntegrityVerdict, String>,
    calls: Arc<AtomicUsize>,
}

impl MockIntegrityHandler {
    /// A handler that passes every event.
    pub fn passing() -> Self {
        Self {
            delay: Duration::ZERO,
            response: Ok(IntegrityVerdict::Passed),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A handler that vetoes every event with the given failure list.
    pub fn vetoing(failed_checks: Vec<String>, reasons: Vec<String>) -> Self {
        Self {
            delay: Duration::ZERO,
            response: Ok(IntegrityVerdict::Vetoed {
                failed_checks,
                reasons,
            }),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A handler whose check pipeline cannot run at all.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            delay: Duration::ZERO,
            response: Err(message.into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sleep before answering, to exercise deadlines.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Shared call counter, incremented when a verdict is produced.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl IntegrityHandler for MockIntegrityHandler {
    async fn check_integrity(&self, _event: &Event) -> Result<IntegrityVerdict, PipelineError> {
        if self.delay > Duration::ZERO {
            tokio::time::sleep(self.delay).await;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            Ok(verdict) => Ok(verdict.clone()),
            Err(message) => Err(PipelineError::Downstream(message.clone())),
        }
    }
}

/// Scripted context handler: optional delay, success or failure.
pub struct MockContextHandler {
    delay: Duration,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl MockContextHandler {
    pub fn succeeding() -> Self {
        Self {
            delay: Duration::ZERO,
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            delay: Duration::ZERO,
            fail: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Shared call counter, incremented after the (possibly delayed)
    /// upsert attempt finishes.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl ContextHandler for MockContextHandler {
    async fn persist_context(&self, _event: &Event) -> Result<(), PipelineError> {
        if self.delay > Duration::ZERO {
            tokio::time::sleep(self.delay).await;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(PipelineError::Downstream("mock context store failure".into()))
        } else {
            Ok(())
        }
    }
}
