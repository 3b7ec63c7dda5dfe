use std::time::Duration;

use crate::error::ClientResult;

/// Default per-call deadline for downstream HTTP calls.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared HTTP transport for all downstream clients.
///
/// One connection pool per process: keep-alive enabled, bounded idle
/// connections, and a per-call timeout that bounds worst-case hangs
/// independently of the router's own deadline.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(call_timeout: Duration) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(call_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()?;
        Ok(Self { client })
    }

    /// Transport with the default 5-second call deadline.
    pub fn with_defaults() -> ClientResult<Self> {
        Self::new(DEFAULT_CALL_TIMEOUT)
    }

    /// The underlying pooled client (cheap to clone).
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

/// Attach a bearer header when a token is available.
pub(crate) fn authorize(
    request: reqwest::RequestBuilder,
    token: Option<String>,
) -> reqwest::RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}
