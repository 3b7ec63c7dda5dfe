use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use veps_pipeline::{IntegrityHandler, IntegrityVerdict, PipelineError};
use veps_protocol::{Envelope, ValidateRequest, VerdictData};
use veps_types::Event;

use crate::error::ClientResult;
use crate::token::TokenCache;
use crate::transport::{authorize, HttpTransport};

/// Client for the validator surface (`POST /validate`).
///
/// Implements the router's [`IntegrityHandler`], so a boundary deployment
/// can talk to a remote veto service with no other wiring.
pub struct HttpValidatorClient {
    base_url: String,
    transport: HttpTransport,
    tokens: Arc<TokenCache>,
}

impl HttpValidatorClient {
    pub fn new(base_url: impl Into<String>, transport: HttpTransport, tokens: Arc<TokenCache>) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn bearer(&self) -> Option<String> {
        match self.tokens.bearer(&self.base_url).await {
            Ok(token) => token,
            Err(err) => {
                // Loopback deployments run without tokens; a failed fetch
                // downgrades to an unauthenticated call.
                warn!(error = %err, "failed to get bearer token");
                None
            }
        }
    }

    async fn post_validate(&self, event: &Event) -> ClientResult<reqwest::Response> {
        let request = ValidateRequest {
            event: event.clone(),
            route: Some("veto_service".into()),
        };
        let builder = self
            .transport
            .client()
            .post(format!("{}/validate", self.base_url))
            .json(&request);
        Ok(authorize(builder, self.bearer().await).send().await?)
    }
}

#[async_trait]
impl IntegrityHandler for HttpValidatorClient {
    async fn check_integrity(&self, event: &Event) -> Result<IntegrityVerdict, PipelineError> {
        let response = self
            .post_validate(event)
            .await
            .map_err(|err| PipelineError::Downstream(err.to_string()))?;

        match response.status().as_u16() {
            200 => Ok(IntegrityVerdict::Passed),
            // 412 is a valid veto outcome, not a transport failure.
            412 => {
                let envelope: Envelope = response
                    .json()
                    .await
                    .map_err(|err| PipelineError::Downstream(err.to_string()))?;
                let verdict: VerdictData = envelope
                    .data
                    .ok_or_else(|| {
                        PipelineError::Downstream("veto response missing data".into())
                    })
                    .and_then(|data| {
                        serde_json::from_value(data)
                            .map_err(|err| PipelineError::Downstream(err.to_string()))
                    })?;
                Ok(IntegrityVerdict::Vetoed {
                    failed_checks: verdict.failed_checks,
                    reasons: verdict.reasons,
                })
            }
            status => Err(PipelineError::Downstream(format!(
                "validator returned status {status}"
            ))),
        }
    }
}
