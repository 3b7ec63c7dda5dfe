use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{oneshot, Semaphore};
use tokio::time::timeout;
use tracing::{debug, warn};

use veps_types::Event;

use crate::error::PipelineError;

/// Verdict returned by the integrity path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntegrityVerdict {
    /// Every check passed; the event is eligible for downstream sealing.
    Passed,
    /// One or more checks vetoed the event. The handler has already
    /// forwarded the rejection to the fracture recorder.
    Vetoed {
        failed_checks: Vec<String>,
        reasons: Vec<String>,
    },
}

/// The blocking branch of the split: validation against persisted context.
#[async_trait]
pub trait IntegrityHandler: Send + Sync {
    /// Run the check pipeline over the event.
    ///
    /// `Err` means the checks could not run (validator unreachable,
    /// internal failure) — distinct from a veto, which is an
    /// `Ok(Vetoed { .. })` verdict.
    async fn check_integrity(&self, event: &Event) -> Result<IntegrityVerdict, PipelineError>;
}

/// The non-blocking branch of the split: persist the event as context.
#[async_trait]
pub trait ContextHandler: Send + Sync {
    async fn persist_context(&self, event: &Event) -> Result<(), PipelineError>;
}

/// Terminal outcome of routing one event, as observed by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteOutcome {
    Accepted,
    Rejected {
        failed_checks: Vec<String>,
        reasons: Vec<String>,
    },
    /// The integrity path missed the router deadline. Not a veto: both
    /// paths keep running and no fracture is written for the timeout.
    TimedOut,
    /// The integrity path failed outright (downstream unreachable, task
    /// panic).
    Failed { message: String },
}

impl RouteOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// State of the context path at the moment the route call returned.
/// Recorded for observability; never part of the terminal outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextState {
    /// The upsert completed before the integrity verdict landed.
    Completed,
    /// The upsert failed; logged, never propagated.
    Failed,
    /// Still in flight when the route call returned.
    Pending,
}

/// Outcome of routing a single event.
#[derive(Debug)]
pub struct RouteResult {
    pub event: Arc<Event>,
    pub outcome: RouteOutcome,
    pub context: ContextState,
    /// Wall-clock time spent inside the router.
    pub duration: Duration,
}

impl RouteResult {
    /// Did the integrity path accept the event?
    pub fn integrity_success(&self) -> bool {
        self.outcome.is_accepted()
    }

    /// Had the context path completed successfully when the route call
    /// returned?
    pub fn context_success(&self) -> bool {
        self.context == ContextState::Completed
    }
}

/// Couples the integrity and context paths with asymmetric delivery
/// semantics inside a bounded time budget.
///
/// The caller blocks on the integrity path alone, subject to the router
/// deadline. The context path runs on a detached task whose lifetime is
/// independent of the request: an integrity failure or a router timeout
/// never cancels an in-flight upsert, because even a rejected event yields
/// useful state for analysis and retry.
#[derive(Clone)]
pub struct BoundaryRouter {
    integrity: Arc<dyn IntegrityHandler>,
    context: Arc<dyn ContextHandler>,
    timeout: Duration,
}

impl BoundaryRouter {
    pub fn new(
        integrity: Arc<dyn IntegrityHandler>,
        context: Arc<dyn ContextHandler>,
        timeout: Duration,
    ) -> Self {
        Self {
            integrity,
            context,
            timeout,
        }
    }

    /// The router deadline for the integrity path.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Route one event through the concurrent split.
    ///
    /// Returns no earlier than the integrity verdict and no later than the
    /// router deadline. The returned context state is a poll, not a wait:
    /// a context task that has not finished yet reports `Pending` and its
    /// eventual outcome is only logged.
    pub async fn route(&self, event: Event) -> RouteResult {
        let started = Instant::now();
        let event = Arc::new(event);

        // Context path: detached task, deliberately not tied to the
        // request deadline.
        let (context_tx, mut context_rx) = oneshot::channel();
        {
            let event = Arc::clone(&event);
            let handler = Arc::clone(&self.context);
            tokio::spawn(async move {
                match handler.persist_context(&event).await {
                    Ok(()) => {
                        debug!(event_id = %event.id, "context path completed");
                        let _ = context_tx.send(true);
                    }
                    Err(err) => {
                        warn!(event_id = %event.id, error = %err,
                              "context path failed (non-blocking)");
                        let _ = context_tx.send(false);
                    }
                }
            });
        }

        // Integrity path: gates the reply.
        let integrity_task = {
            let event = Arc::clone(&event);
            let handler = Arc::clone(&self.integrity);
            tokio::spawn(async move { handler.check_integrity(&event).await })
        };

        let outcome = match timeout(self.timeout, integrity_task).await {
            // Dropping the join handle detaches the task; downstream
            // calls are bounded by their own transport deadlines.
            Err(_elapsed) => {
                warn!(event_id = %event.id, timeout = ?self.timeout,
                      "integrity path timeout exceeded");
                RouteOutcome::TimedOut
            }
            Ok(Err(join_err)) => RouteOutcome::Failed {
                message: format!("integrity task aborted: {join_err}"),
            },
            Ok(Ok(Err(err))) => {
                warn!(event_id = %event.id, error = %err, "integrity path failed");
                RouteOutcome::Failed {
                    message: err.to_string(),
                }
            }
            Ok(Ok(Ok(IntegrityVerdict::Passed))) => RouteOutcome::Accepted,
            Ok(Ok(Ok(IntegrityVerdict::Vetoed {
                failed_checks,
                reasons,
            }))) => RouteOutcome::Rejected {
                failed_checks,
                reasons,
            },
        };

        let context = match context_rx.try_recv() {
            Ok(true) => ContextState::Completed,
            Ok(false) => ContextState::Failed,
            Err(oneshot::error::TryRecvError::Empty) => ContextState::Pending,
            Err(oneshot::error::TryRecvError::Closed) => ContextState::Failed,
        };

        RouteResult {
            event,
            outcome,
            context,
            duration: started.elapsed(),
        }
    }

    /// Route a batch with bounded concurrency.
    ///
    /// Results are positional; no ordering between events is implied. The
    /// call returns after every slot has drained.
    pub async fn route_batch(&self, events: Vec<Event>, max_concurrent: usize) -> Vec<RouteResult> {
        let width = if max_concurrent == 0 { 10 } else { max_concurrent };
        let semaphore = Arc::new(Semaphore::new(width));

        let mut slots = Vec::with_capacity(events.len());
        for event in events {
            let router = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let fallback = event.clone();
            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                router.route(event).await
            });
            slots.push((fallback, handle));
        }

        let mut results = Vec::with_capacity(slots.len());
        for (fallback, handle) in slots {
            match handle.await {
                Ok(result) => results.push(result),
                Err(join_err) => results.push(RouteResult {
                    event: Arc::new(fallback),
                    outcome: RouteOutcome::Failed {
                        message: format!("routing task aborted: {join_err}"),
                    },
                    context: ContextState::Pending,
                    duration: Duration::ZERO,
                }),
            }
        }
        results
    }
}
