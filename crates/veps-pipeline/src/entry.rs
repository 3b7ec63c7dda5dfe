use std::time::{Duration, Instant};

use tracing::info;

use veps_types::{Event, RawEvent};

use crate::config::PipelineConfig;
use crate::error::{BatchError, NormalizeError};
use crate::normalizer::Normalizer;
use crate::router::{BoundaryRouter, RouteResult};

/// Per-phase wall-clock timings for one submission.
///
/// The timing contract is part of the observable interface: downstream
/// systems assert on the millisecond fields derived from these.
#[derive(Clone, Copy, Debug, Default)]
pub struct Timings {
    pub normalize: Duration,
    pub route: Duration,
}

impl Timings {
    /// The "internal" latency: everything except the client round trip
    /// and request parsing.
    pub fn internal(&self) -> Duration {
        self.normalize + self.route
    }
}

/// Result of ingesting one submission: the route outcome plus timings.
#[derive(Debug)]
pub struct IngestReport {
    pub result: RouteResult,
    pub timings: Timings,
}

/// Result of ingesting a batch.
#[derive(Debug)]
pub struct BatchReport {
    pub results: Vec<RouteResult>,
    /// Wall-clock time for the whole batch (normalize + route).
    pub duration: Duration,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results
            .iter()
            .filter(|result| result.integrity_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

/// Pipeline entry: normalizer → router, with timing instrumentation.
pub struct Pipeline {
    normalizer: Normalizer,
    router: BoundaryRouter,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(router: BoundaryRouter, config: PipelineConfig) -> Self {
        Self {
            normalizer: Normalizer::new(config.node_id.clone()),
            router,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Ingest a single submission: normalize, then route.
    ///
    /// Normalization errors abort before any I/O; routing failures are
    /// encoded in the report's outcome.
    pub async fn ingest(&self, raw: &RawEvent) -> Result<IngestReport, NormalizeError> {
        let normalize_start = Instant::now();
        let event = self.normalizer.normalize(raw)?;
        let normalize = normalize_start.elapsed();

        let event_id = event.id;
        let route_start = Instant::now();
        let result = self.router.route(event).await;
        let route = route_start.elapsed();

        let timings = Timings { normalize, route };
        info!(
            event_id = %event_id,
            accepted = result.integrity_success(),
            internal_us = timings.internal().as_micros() as u64,
            "submission processed"
        );

        Ok(IngestReport { result, timings })
    }

    /// Ingest a batch of submissions.
    ///
    /// Bounds are validated first (empty rejected, capped at the
    /// configured size), then every record is normalized — the first bad
    /// record rejects the whole batch with its index — and finally all
    /// events are routed under the configured concurrency width. All
    /// events are processed; a rejection does not abort the rest.
    pub async fn ingest_batch(&self, raws: &[RawEvent]) -> Result<BatchReport, BatchError> {
        if raws.is_empty() {
            return Err(BatchError::Empty);
        }
        if raws.len() > self.config.max_batch_size {
            return Err(BatchError::TooLarge {
                max: self.config.max_batch_size,
            });
        }

        let batch_start = Instant::now();
        let mut events: Vec<Event> = Vec::with_capacity(raws.len());
        for (index, raw) in raws.iter().enumerate() {
            self.normalizer
                .validate_schema(raw)
                .map_err(|source| BatchError::Normalize { index, source })?;
            let event = self
                .normalizer
                .normalize(raw)
                .map_err(|source| BatchError::Normalize { index, source })?;
            events.push(event);
        }

        let results = self
            .router
            .route_batch(events, self.config.max_concurrent_routes)
            .await;
        let report = BatchReport {
            results,
            duration: batch_start.elapsed(),
        };

        info!(
            total = report.results.len(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            "batch processed"
        );
        Ok(report)
    }
}
