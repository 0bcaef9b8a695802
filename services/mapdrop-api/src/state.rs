//! Application state and shared resources.

use std::sync::Arc;

use anyhow::Result;
use storage::{KeyValueStore, MemoryStore, RedisStore};
use tracing::{info, warn};

use crate::config::{Args, ServiceConfig};
use crate::service::MapdropService;

/// Shared application state.
pub struct AppState {
    pub service: MapdropService,
    pub config: ServiceConfig,
}

impl AppState {
    pub fn new(service: MapdropService, config: ServiceConfig) -> Self {
        Self { service, config }
    }

    /// Build state from the command line, connecting to Redis when configured.
    pub async fn from_args(args: &Args) -> Result<Self> {
        let config = ServiceConfig::from(args);
        config.validate()?;

        let store: Arc<dyn KeyValueStore> = match &args.redis_url {
            Some(url) => {
                info!(redis_url = %url, "Using Redis metadata cache");
                Arc::new(RedisStore::connect(url).await?)
            }
            None => {
                warn!("REDIS_URL not set, metadata cache is local to this process");
                Arc::new(MemoryStore::new())
            }
        };

        let service = MapdropService::from_config(&config, store);
        Ok(Self::new(service, config))
    }
}
