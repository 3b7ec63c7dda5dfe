use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::warn;

use veps_fracture::{ArchiveError, ArchiveResult, FractureArchive};
use veps_protocol::FractureRequest;
use veps_types::FracturedEvent;

use crate::token::TokenCache;
use crate::transport::{authorize, HttpTransport};

/// Client for the fracture-archive surface.
///
/// The archive endpoint queues writes and answers immediately, so this
/// client's `append` returns as soon as the request is accepted. The
/// remote recorder stamps its own `fracture_id`; the archive is an
/// at-least-once log either way.
pub struct HttpFractureArchive {
    base_url: String,
    transport: HttpTransport,
    tokens: Arc<TokenCache>,
}

impl HttpFractureArchive {
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

    fn to_request(fracture: &FracturedEvent) -> FractureRequest {
        FractureRequest {
            event: fracture.event.clone(),
            failed_checks: fracture.rejection.failed_checks.clone(),
            reasons: fracture.rejection.reasons.clone(),
            veto_node: fracture.rejection.veto_node.clone(),
            duration: fracture.rejection.validation_duration.clone(),
            correlation_id: Some(fracture.context.correlation_id.clone()),
            metadata: fracture.context.metadata.clone(),
        }
    }

    async fn post_json<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ArchiveResult<reqwest::Response> {
        let builder = self
            .transport
            .client()
            .post(format!("{}{path}", self.base_url))
            .json(body);
        authorize(builder, self.bearer().await)
            .send()
            .await
            .map_err(|err| ArchiveError::Transport(err.to_string()))
    }
}

#[async_trait]
impl FractureArchive for HttpFractureArchive {
    async fn append(&self, fracture: &FracturedEvent) -> ArchiveResult<()> {
        let response = self
            .post_json("/fracture", &Self::to_request(fracture))
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ArchiveError::Transport(format!(
                "fracture archive returned status {}",
                response.status().as_u16()
            )))
        }
    }

    async fn append_batch(&self, fractures: Vec<FracturedEvent>) -> ArchiveResult<()> {
        if fractures.is_empty() {
            return Ok(());
        }
        let requests: Vec<FractureRequest> = fractures.iter().map(Self::to_request).collect();
        let response = self.post_json("/fracture/batch", &requests).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ArchiveError::Transport(format!(
                "fracture archive returned status {}",
                response.status().as_u16()
            )))
        }
    }

    async fn read_date(&self, date: NaiveDate) -> ArchiveResult<Vec<FracturedEvent>> {
        let builder = self
            .transport
            .client()
            .get(format!("{}/fractures", self.base_url))
            .query(&[("date", date.format("%Y-%m-%d").to_string())]);
        let response = authorize(builder, self.bearer().await)
            .send()
            .await
            .map_err(|err| ArchiveError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ArchiveError::Transport(format!(
                "fracture archive returned status {}",
                response.status().as_u16()
            )));
        }

        // The day's hour files concatenated: one JSON object per line.
        let body = response
            .text()
            .await
            .map_err(|err| ArchiveError::Transport(err.to_string()))?;
        let mut records = Vec::new();
        for line in body.lines() {
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(line)?);
        }
        Ok(records)
    }
}
