use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::cache::{BackfillEngine, StoreRegistry};
use crate::config::{CacheBackend, Config};
use crate::domain::SystemClock;
use crate::upstream::HttpUpstream;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub engine: Arc<BackfillEngine>,
}

impl AppState {
    pub fn new(cfg: Config) -> Result<Self> {
        let registry = match cfg.cache.backend {
            CacheBackend::Redb => StoreRegistry::open_redb(&cfg.cache.dir)?,
            CacheBackend::Memory => {
                warn!("using in-memory slot stores; cached data is lost on restart");
                StoreRegistry::in_memory()
            }
        };

        if cfg.upstream.api_token.is_empty() {
            warn!("upstream API token is empty; set EF__UPSTREAM__API_TOKEN");
        }
        let upstream = HttpUpstream::new(
            cfg.upstream.base_url.clone(),
            cfg.upstream.api_token.clone(),
            Duration::from_secs(cfg.upstream.http_timeout_seconds),
        )?;
        info!(base_url = %cfg.upstream.base_url, "upstream client ready");

        let engine = BackfillEngine::new(
            Arc::new(registry),
            Arc::new(upstream),
            Arc::new(SystemClock),
        );
        Ok(Self::with_engine(cfg, engine))
    }

    pub fn with_engine(cfg: Config, engine: BackfillEngine) -> Self {
        Self {
            cfg,
            engine: Arc::new(engine),
        }
    }
}
