use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::router::{
    build_fracture_router, build_ingest_router, build_standalone_router, build_store_router,
    build_validator_router,
};
use crate::runtime::{AppState, SharedState};

/// Which surface(s) this process exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerRole {
    /// Ingest surface (normalizer + router).
    Boundary,
    /// Validation surface (veto decisions).
    Validator,
    /// Context-store surface.
    Store,
    /// Fracture-archive surface.
    Fracture,
    /// Every surface on one listener.
    Standalone,
}

impl ServerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boundary => "boundary",
            Self::Validator => "validator",
            Self::Store => "store",
            Self::Fracture => "fracture",
            Self::Standalone => "standalone",
        }
    }
}

impl std::str::FromStr for ServerRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boundary" => Ok(Self::Boundary),
            "validator" => Ok(Self::Validator),
            "store" => Ok(Self::Store),
            "fracture" => Ok(Self::Fracture),
            "standalone" => Ok(Self::Standalone),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// VEPS HTTP server for one role.
pub struct VepsServer {
    config: ServerConfig,
    role: ServerRole,
}

impl VepsServer {
    pub fn new(config: ServerConfig, role: ServerRole) -> Self {
        Self { config, role }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn role(&self) -> ServerRole {
        self.role
    }

    /// Build the router for this role (useful for testing).
    pub fn router(&self, state: SharedState) -> axum::Router {
        match self.role {
            ServerRole::Boundary => build_ingest_router(state),
            ServerRole::Validator => build_validator_router(state),
            ServerRole::Store => build_store_router(state),
            ServerRole::Fracture => build_fracture_router(state),
            ServerRole::Standalone => build_standalone_router(state),
        }
    }

    /// Wire up state from the configuration and start serving.
    pub async fn serve(self) -> ServerResult<()> {
        let state = AppState::build(self.config.clone())?;
        let app = self.router(state);
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!(
            role = self.role.as_str(),
            node_id = %self.config.node_id,
            addr = %self.config.bind_addr,
            "VEPS server listening"
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| crate::error::ServerError::Internal(e.to_string()))
    }
}
