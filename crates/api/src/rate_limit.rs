//! Rate Limiting Middleware using GCRA Algorithm
//!
//! Limits login attempts per peer IP using tower_governor. The server must
//! be served with `into_make_service_with_connect_info::<SocketAddr>()` so
//! the peer address is available.

use governor::middleware::StateInformationMiddleware;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tracing::warn;

/// Governor config keyed by peer IP, with X-RateLimit-* headers
pub type LoginGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Rate limiting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Apply the limiter to the login route
    pub enabled: bool,
    /// Seconds between replenishing one request
    pub per_second: u64,
    /// Burst size (max requests that can be made immediately)
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            per_second: 1,
            burst_size: 20,
        }
    }
}

/// Build the governor config, or `None` when the settings are unusable
pub fn create_governor_config(config: &RateLimitConfig) -> Option<Arc<LoginGovernorConfig>> {
    let governor = GovernorConfigBuilder::default()
        .per_second(config.per_second)
        .burst_size(config.burst_size)
        .use_headers()
        .finish();

    if governor.is_none() {
        warn!(
            "Ignoring rate limit with per_second={} burst_size={}",
            config.per_second, config.burst_size
        );
    }
    governor.map(Arc::new)
}
