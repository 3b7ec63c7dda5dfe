use std::time::Duration;

/// Configuration for the pipeline instance.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Stable identifier this instance owns in every vector clock it
    /// stamps. Generated at startup when the deployment does not pin one.
    pub node_id: String,
    /// Deadline the router imposes on the integrity path.
    pub router_timeout: Duration,
    /// Semaphore width for batch routing.
    pub max_concurrent_routes: usize,
    /// Upper bound on submissions per batch.
    pub max_batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            node_id: uuid::Uuid::new_v4().to_string(),
            router_timeout: Duration::from_millis(50),
            max_concurrent_routes: 10,
            max_batch_size: 100,
        }
    }
}

impl PipelineConfig {
    /// Pin the node identifier (deployments supply it via `VEPS_NODE_ID`).
    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = node_id.into();
        self
    }

    pub fn with_router_timeout(mut self, timeout: Duration) -> Self {
        self.router_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.router_timeout, Duration::from_millis(50));
        assert_eq!(config.max_concurrent_routes, 10);
        assert_eq!(config.max_batch_size, 100);
        assert!(!config.node_id.is_empty());
    }

    #[test]
    fn generated_node_ids_are_unique() {
        let a = PipelineConfig::default();
        let b = PipelineConfig::default();
        assert_ne!(a.node_id, b.node_id);
    }

    #[test]
    fn builders_override_defaults() {
        let config = PipelineConfig::default()
            .with_node_id("boundary-1")
            .with_router_timeout(Duration::from_millis(75));
        assert_eq!(config.node_id, "boundary-1");
        assert_eq!(config.router_timeout, Duration::from_millis(75));
    }
}
