use crate::domain::model::ProfileRecord;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Source of raw profile page HTML.
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    async fn fetch_profile(&self, username: &str) -> Result<String>;
}

/// TTL store for normalized profiles. Failures are reported as a miss / `false`.
pub trait ProfileCache: Send + Sync {
    fn get(&self, key: &str) -> impl std::future::Future<Output = Option<ProfileRecord>> + Send;
    fn set(
        &self,
        key: &str,
        record: &ProfileRecord,
    ) -> impl std::future::Future<Output = bool> + Send;
}

/// Fixed-window request counter keyed by client identity.
pub trait RateLimiter: Send + Sync {
    fn check(&self, identity: &str) -> impl std::future::Future<Output = bool> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn json_max_length(&self) -> usize;
    fn log_max_length(&self) -> usize;
    fn retry_after_seconds(&self) -> u64;
}
