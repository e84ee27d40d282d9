//! Rate Limiting for Prediction Routes
//!
//! Per peer IP limiting with tower_governor (GCRA). Requires the server to use
//! `into_make_service_with_connect_info::<SocketAddr>()` for IP extraction.

use governor::middleware::StateInformationMiddleware;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tracing::warn;

/// Governor config with X-RateLimit-* headers enabled
pub type PredictionGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Whether prediction routes are limited at all
    pub enabled: bool,
    /// Seconds to replenish one request
    pub per_second: u64,
    /// Burst size (max requests that can be made immediately)
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            per_second: 1,
            burst_size: 10,
        }
    }
}

/// Build the governor config, `None` when the settings are unusable
pub fn create_governor_config(config: &RateLimitConfig) -> Option<Arc<PredictionGovernorConfig>> {
    let governor = GovernorConfigBuilder::default()
        .per_second(config.per_second)
        .burst_size(config.burst_size)
        .use_headers()
        .finish();

    if governor.is_none() {
        warn!(
            "Ignoring rate limit: per_second={} burst_size={} (both must be non-zero)",
            config.per_second, config.burst_size
        );
    }
    governor.map(Arc::new)
}
