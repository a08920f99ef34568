// Adapters layer: concrete implementations for external systems (remote site, disk stores, HTTP server).

pub mod cache;
pub mod http;
pub mod rate_limit;
pub mod server;

pub use cache::FileCache;
pub use http::TikTokClient;
pub use rate_limit::FileRateLimiter;

use crate::config::ServiceConfig;
use crate::core::service::ProfileService;
use crate::core::ConfigProvider;
use crate::utils::error::Result;

pub type DefaultProfileService = ProfileService<TikTokClient, FileCache, FileRateLimiter, ServiceConfig>;

/// Wires the real client, file cache and file rate limiter from one config.
pub fn build_service(config: ServiceConfig) -> Result<DefaultProfileService> {
    let fetcher = TikTokClient::new(&config.fetch, config.log_max_length())?;
    let cache = FileCache::new(&config.cache);
    let limiter = FileRateLimiter::new(&config.rate_limit);
    Ok(ProfileService::new(fetcher, cache, limiter, config))
}
