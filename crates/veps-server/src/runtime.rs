use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use veps_client::{
    HttpContextStore, HttpFractureArchive, HttpTransport, HttpValidatorClient, StaticTokenSource,
    TokenCache,
};
use veps_fracture::{FractureArchive, FractureRecorder, InMemoryArchive, LocalDirArchive};
use veps_pipeline::{
    BoundaryRouter, ContextHandler, IntegrityHandler, IntegrityVerdict, Pipeline, PipelineConfig,
    PipelineError,
};
use veps_store::{ContextStore, InMemoryContextStore};
use veps_types::Event;
use veps_validator::{Validator, ValidatorConfig, ValidatorError};

use crate::config::ServerConfig;
use crate::error::ServerResult;

/// Integrity handler backed by the in-process validator.
///
/// On a veto the rejection is handed to the fracture recorder before the
/// verdict is returned, so the caller's rejection response and the audit
/// capture happen from the same decision.
pub struct LocalIntegrityHandler {
    validator: Arc<Validator>,
    recorder: Arc<FractureRecorder>,
}

impl LocalIntegrityHandler {
    pub fn new(validator: Arc<Validator>, recorder: Arc<FractureRecorder>) -> Self {
        Self {
            validator,
            recorder,
        }
    }
}

#[async_trait]
impl IntegrityHandler for LocalIntegrityHandler {
    async fn check_integrity(&self, event: &Event) -> Result<IntegrityVerdict, PipelineError> {
        let outcome = self.validator.validate(event).await.map_err(|err| match err {
            ValidatorError::Store { .. } => PipelineError::Downstream(err.to_string()),
            ValidatorError::Internal(message) => PipelineError::Internal(message),
        })?;

        if outcome.passed() {
            return Ok(IntegrityVerdict::Passed);
        }

        self.recorder.record_outcome(event.clone(), &outcome);
        Ok(IntegrityVerdict::Vetoed {
            failed_checks: outcome.failed_checks(),
            reasons: outcome.reasons(),
        })
    }
}

/// Context handler that upserts into a [`ContextStore`].
pub struct StoreContextHandler {
    store: Arc<dyn ContextStore>,
}

impl StoreContextHandler {
    pub fn new(store: Arc<dyn ContextStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ContextHandler for StoreContextHandler {
    async fn persist_context(&self, event: &Event) -> Result<(), PipelineError> {
        self.store
            .upsert(event)
            .await
            .map_err(|err| PipelineError::Downstream(err.to_string()))
    }
}

/// Shared state behind every surface of one VEPS process.
pub struct AppState {
    pub config: ServerConfig,
    pub pipeline: Pipeline,
    pub validator: Arc<Validator>,
    pub store: Arc<dyn ContextStore>,
    pub archive: Arc<dyn FractureArchive>,
    pub recorder: Arc<FractureRecorder>,
    pub tokens: Arc<TokenCache>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wire up a process from its configuration: HTTP-backed collaborators
    /// where URLs are configured, in-process implementations otherwise.
    pub fn build(config: ServerConfig) -> ServerResult<SharedState> {
        let tokens = Arc::new(match &config.auth_token {
            Some(token) => TokenCache::new(Arc::new(StaticTokenSource::new(token.clone()))),
            None => TokenCache::unauthenticated(),
        });
        let transport = HttpTransport::with_defaults()?;

        let store: Arc<dyn ContextStore> = match &config.store_url {
            Some(url) => {
                info!(url = %url, "using remote context store");
                Arc::new(HttpContextStore::new(
                    url.clone(),
                    transport.clone(),
                    Arc::clone(&tokens),
                ))
            }
            None => Arc::new(InMemoryContextStore::new()),
        };

        let archive: Arc<dyn FractureArchive> = match (&config.fracture_url, &config.archive_root)
        {
            (Some(url), _) => {
                info!(url = %url, "using remote fracture archive");
                Arc::new(HttpFractureArchive::new(
                    url.clone(),
                    transport.clone(),
                    Arc::clone(&tokens),
                ))
            }
            (None, Some(root)) => {
                info!(root = %root.display(), "using local fracture archive");
                Arc::new(LocalDirArchive::new(root.clone()))
            }
            (None, None) => Arc::new(InMemoryArchive::new()),
        };

        let validator = Arc::new(Validator::with_default_checks(
            Arc::clone(&store),
            &ValidatorConfig::default(),
        ));
        let recorder = Arc::new(FractureRecorder::new(
            Arc::clone(&archive),
            config.node_id.clone(),
        ));

        let integrity: Arc<dyn IntegrityHandler> = match &config.validator_url {
            Some(url) => {
                info!(url = %url, "using remote validator");
                Arc::new(HttpValidatorClient::new(
                    url.clone(),
                    transport,
                    Arc::clone(&tokens),
                ))
            }
            None => Arc::new(LocalIntegrityHandler::new(
                Arc::clone(&validator),
                Arc::clone(&recorder),
            )),
        };
        let context: Arc<dyn ContextHandler> =
            Arc::new(StoreContextHandler::new(Arc::clone(&store)));

        Ok(Self::assemble(
            config, store, archive, validator, recorder, integrity, context, tokens,
        ))
    }

    /// Assemble state from explicit parts (test seam for scripted paths).
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        config: ServerConfig,
        store: Arc<dyn ContextStore>,
        archive: Arc<dyn FractureArchive>,
        validator: Arc<Validator>,
        recorder: Arc<FractureRecorder>,
        integrity: Arc<dyn IntegrityHandler>,
        context: Arc<dyn ContextHandler>,
        tokens: Arc<TokenCache>,
    ) -> SharedState {
        let router = BoundaryRouter::new(integrity, context, config.router_timeout);
        let mut pipeline_config = PipelineConfig::default()
            .with_node_id(config.node_id.clone())
            .with_router_timeout(config.router_timeout);
        pipeline_config.max_batch_size = config.max_batch_size;
        pipeline_config.max_concurrent_routes = config.max_concurrent_routes;
        let pipeline = Pipeline::new(router, pipeline_config);

        Arc::new(AppState {
            config,
            pipeline,
            validator,
            store,
            archive,
            recorder,
            tokens,
        })
    }

    /// Audiences the warmup handler pre-fetches tokens for.
    pub fn downstream_audiences(&self) -> Vec<String> {
        [
            self.config.validator_url.as_ref(),
            self.config.store_url.as_ref(),
            self.config.fracture_url.as_ref(),
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect()
    }
}
