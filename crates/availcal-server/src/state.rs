use std::sync::Arc;

use availcal_providers::{CalendarSource, IcsFeedSource};

use crate::cache::AvailabilityCache;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Shared application state
#[derive(Clone, Debug)]
pub struct AppState {
    pub cache: Arc<AvailabilityCache>,
}

impl AppState {
    /// Wraps an existing cache.
    pub fn new(cache: AvailabilityCache) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Builds the state for a configured ICS feed.
    pub fn from_config(config: &ServerConfig) -> ServerResult<Self> {
        let source = IcsFeedSource::new(config.feed.clone())
            .map_err(|e| ServerError::config(e.to_string()))?;
        let source: Arc<dyn CalendarSource> = Arc::new(source);

        Ok(Self::new(AvailabilityCache::new(
            source,
            config.cache_ttl,
            config.fetch_timeout,
        )))
    }
}
