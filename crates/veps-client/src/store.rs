use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use veps_protocol::{CausalityData, CausalityRequest, Envelope, UpdateRequest};
use veps_store::{CausalityStatus, ContextStore, EventFilter, StoreError, StoreResult};
use veps_types::{Event, EventId, VectorClock};

use crate::error::ClientError;
use crate::token::TokenCache;
use crate::transport::{authorize, HttpTransport};

/// Client for the context-store surface.
///
/// Implements [`ContextStore`], so the validator's causality check and the
/// router's context path use it interchangeably with the in-process store.
pub struct HttpContextStore {
    base_url: String,
    transport: HttpTransport,
    tokens: Arc<TokenCache>,
}

impl HttpContextStore {
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
                warn!(error = %err, "failed to get bearer token");
                None
            }
        }
    }

    async fn post_json<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ClientError> {
        let builder = self
            .transport
            .client()
            .post(format!("{}{path}", self.base_url))
            .json(body);
        Ok(authorize(builder, self.bearer().await).send().await?)
    }

    async fn decode_data<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> StoreResult<T> {
        let envelope: Envelope = response
            .json()
            .await
            .map_err(|err| StoreError::Serialization(err.to_string()))?;
        let data = envelope
            .data
            .ok_or_else(|| StoreError::Serialization("response missing data".into()))?;
        serde_json::from_value(data).map_err(|err| StoreError::Serialization(err.to_string()))
    }
}

fn transport_error(err: ClientError) -> StoreError {
    StoreError::Transport(err.to_string())
}

#[async_trait]
impl ContextStore for HttpContextStore {
    async fn upsert(&self, event: &Event) -> StoreResult<()> {
        let response = self
            .post_json("/update", &UpdateRequest::upsert(event.clone()))
            .await
            .map_err(transport_error)?;
        match response.status().as_u16() {
            200 => Ok(()),
            409 => Err(StoreError::Constraint(format!(
                "upsert conflict for event {}",
                event.id
            ))),
            status => Err(StoreError::Transport(format!(
                "context store returned status {status}"
            ))),
        }
    }

    async fn get_by_id(&self, id: &EventId) -> StoreResult<Option<Event>> {
        let builder = self
            .transport
            .client()
            .get(format!("{}/event", self.base_url))
            .query(&[("id", id.to_string())]);
        let response = authorize(builder, self.bearer().await)
            .send()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;

        match response.status().as_u16() {
            200 => Ok(Some(Self::decode_data(response).await?)),
            404 => Ok(None),
            status => Err(StoreError::Transport(format!(
                "context store returned status {status}"
            ))),
        }
    }

    async fn check_causality(&self, clock: &VectorClock) -> StoreResult<CausalityStatus> {
        let response = self
            .post_json(
                "/causality",
                &CausalityRequest {
                    vector_clock: clock.clone(),
                },
            )
            .await
            .map_err(transport_error)?;

        // 412 means "not satisfied", which is an answer, not a failure.
        match response.status().as_u16() {
            200 | 412 => {
                let data: CausalityData = Self::decode_data(response).await?;
                if data.satisfied {
                    Ok(CausalityStatus::satisfied())
                } else {
                    Ok(CausalityStatus::missing(data.missing_nodes))
                }
            }
            status => Err(StoreError::Transport(format!(
                "context store returned status {status}"
            ))),
        }
    }

    async fn health(&self) -> StoreResult<()> {
        let builder = self
            .transport
            .client()
            .get(format!("{}/health", self.base_url));
        let response = authorize(builder, self.bearer().await)
            .send()
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::Unavailable(format!(
                "health returned status {}",
                response.status().as_u16()
            )))
        }
    }

    async fn query(&self, filter: &EventFilter) -> StoreResult<Vec<Event>> {
        let response = self
            .post_json("/events/query", filter)
            .await
            .map_err(transport_error)?;
        match response.status().as_u16() {
            200 => Self::decode_data(response).await,
            status => Err(StoreError::Transport(format!(
                "context store returned status {status}"
            ))),
        }
    }
}
