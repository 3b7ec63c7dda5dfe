use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// A bearer token with its expiry, as issued for one audience.
#[derive(Clone, Debug)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Source of fresh bearer tokens for service-to-service calls.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch(&self, audience: &str) -> ClientResult<IssuedToken>;
}

/// Fixed-token source for dev and test deployments.
pub struct StaticTokenSource {
    token: String,
    lifetime: Duration,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            lifetime: Duration::hours(1),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn fetch(&self, _audience: &str) -> ClientResult<IssuedToken> {
        if self.token.is_empty() {
            return Err(ClientError::Token("static token is empty".into()));
        }
        Ok(IssuedToken {
            token: self.token.clone(),
            expires_at: Utc::now() + self.lifetime,
        })
    }
}

/// Process-wide cache of per-audience bearer tokens.
///
/// Read-mostly under a shared lock; a refresh takes the exclusive lock and
/// double-checks before fetching so concurrent callers trigger one fetch.
/// Entries are refreshed ahead of expiry by a fixed buffer (5 minutes for
/// tokens that live about an hour).
///
/// Loopback deployments construct the cache [`unauthenticated`]
/// (`TokenCache::unauthenticated`) and every call omits the header.
pub struct TokenCache {
    source: Option<Arc<dyn TokenSource>>,
    tokens: RwLock<HashMap<String, IssuedToken>>,
    refresh_buffer: Duration,
}

impl TokenCache {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self {
            source: Some(source),
            tokens: RwLock::new(HashMap::new()),
            refresh_buffer: Duration::minutes(5),
        }
    }

    /// A cache that never issues tokens; calls go out unauthenticated.
    pub fn unauthenticated() -> Self {
        Self {
            source: None,
            tokens: RwLock::new(HashMap::new()),
            refresh_buffer: Duration::minutes(5),
        }
    }

    /// The bearer token for an audience, or `None` in unauthenticated
    /// mode. Refreshes when the cached entry is within the buffer of its
    /// expiry.
    pub async fn bearer(&self, audience: &str) -> ClientResult<Option<String>> {
        let Some(source) = &self.source else {
            return Ok(None);
        };

        // Fast path: shared lock, entry still comfortably fresh.
        {
            let tokens = self.tokens.read().await;
            if let Some(cached) = tokens.get(audience) {
                if Utc::now() < cached.expires_at - self.refresh_buffer {
                    return Ok(Some(cached.token.clone()));
                }
            }
        }

        // Refresh path: exclusive lock with double-check so only one
        // caller fetches.
        let mut tokens = self.tokens.write().await;
        if let Some(cached) = tokens.get(audience) {
            if Utc::now() < cached.expires_at - self.refresh_buffer {
                return Ok(Some(cached.token.clone()));
            }
        }

        debug!(audience, "refreshing bearer token");
        let issued = source.fetch(audience).await?;
        let token = issued.token.clone();
        tokens.insert(audience.to_string(), issued);
        Ok(Some(token))
    }

    /// Pre-populate the cache for the given audiences (warmup).
    pub async fn warm(&self, audiences: &[String]) -> ClientResult<usize> {
        let mut warmed = 0;
        for audience in audiences {
            if self.bearer(audience).await?.is_some() {
                warmed += 1;
            }
        }
        Ok(warmed)
    }
}
