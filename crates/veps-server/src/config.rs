use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Per-process configuration, environment-style.
///
/// Every field has a working default so a bare `veps serve` runs a
/// standalone node; deployments override via `VEPS_*` variables.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Stable node identifier; generated at startup if absent.
    pub node_id: String,
    /// Deadline the router imposes on the integrity path.
    pub router_timeout: Duration,
    pub max_batch_size: usize,
    pub max_concurrent_routes: usize,
    /// Remote validator surface; absent means validate in-process.
    pub validator_url: Option<String>,
    /// Remote context store; absent means the in-memory store.
    pub store_url: Option<String>,
    /// Remote fracture archive; absent falls back to `archive_root`.
    pub fracture_url: Option<String>,
    /// Local directory for the fracture archive; absent means in-memory.
    pub archive_root: Option<PathBuf>,
    /// Static bearer token for outbound calls; absent means loopback
    /// mode with no Authorization header.
    pub auth_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".parse().expect("valid default addr"),
            node_id: uuid::Uuid::new_v4().to_string(),
            router_timeout: Duration::from_millis(50),
            max_batch_size: 100,
            max_concurrent_routes: 10,
            validator_url: None,
            store_url: None,
            fracture_url: None,
            archive_root: None,
            auth_token: None,
        }
    }
}

impl ServerConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through a lookup function (test seam).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("VEPS_BIND_ADDR").and_then(|raw| raw.parse().ok()) {
            config.bind_addr = addr;
        }
        if let Some(node_id) = lookup("VEPS_NODE_ID").filter(|id| !id.is_empty()) {
            config.node_id = node_id;
        }
        if let Some(ms) = lookup("VEPS_ROUTER_TIMEOUT_MS").and_then(|raw| raw.parse().ok()) {
            config.router_timeout = Duration::from_millis(ms);
        }
        if let Some(size) = lookup("VEPS_MAX_BATCH_SIZE").and_then(|raw| raw.parse().ok()) {
            config.max_batch_size = size;
        }
        if let Some(width) = lookup("VEPS_MAX_CONCURRENT").and_then(|raw| raw.parse().ok()) {
            config.max_concurrent_routes = width;
        }
        config.validator_url = lookup("VEPS_VALIDATOR_URL").filter(|url| !url.is_empty());
        config.store_url = lookup("VEPS_STORE_URL").filter(|url| !url.is_empty());
        config.fracture_url = lookup("VEPS_FRACTURE_URL").filter(|url| !url.is_empty());
        config.archive_root = lookup("VEPS_ARCHIVE_ROOT")
            .filter(|root| !root.is_empty())
            .map(PathBuf::from);
        config.auth_token = lookup("VEPS_AUTH_TOKEN").filter(|token| !token.is_empty());

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.router_timeout, Duration::from_millis(50));
        assert_eq!(config.max_batch_size, 100);
        assert_eq!(config.max_concurrent_routes, 10);
        assert!(config.validator_url.is_none());
        assert!(!config.node_id.is_empty());
    }

    #[test]
    fn lookup_overrides_defaults() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("VEPS_BIND_ADDR", "0.0.0.0:9000"),
            ("VEPS_NODE_ID", "boundary-1"),
            ("VEPS_ROUTER_TIMEOUT_MS", "75"),
            ("VEPS_VALIDATOR_URL", "http://veto:8080"),
            ("VEPS_ARCHIVE_ROOT", "/var/lib/veps/fractures"),
        ]);
        let config = ServerConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.bind_addr, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.node_id, "boundary-1");
        assert_eq!(config.router_timeout, Duration::from_millis(75));
        assert_eq!(config.validator_url.as_deref(), Some("http://veto:8080"));
        assert_eq!(
            config.archive_root,
            Some(PathBuf::from("/var/lib/veps/fractures"))
        );
        assert!(config.store_url.is_none());
    }

    #[test]
    fn empty_values_are_treated_as_absent() {
        let env: HashMap<&str, &str> =
            HashMap::from([("VEPS_NODE_ID", ""), ("VEPS_STORE_URL", "")]);
        let config = ServerConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert!(!config.node_id.is_empty());
        assert!(config.store_url.is_none());
    }
}
