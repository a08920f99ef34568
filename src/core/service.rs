use crate::core::locator::{locate_stats, locate_user_data};
use crate::core::normalize::normalize;
use crate::core::{ConfigProvider, ProfileCache, ProfileFetcher, RateLimiter};
use crate::domain::model::{ProfileLookup, ProfileRecord};
use crate::utils::error::{ProfileError, Result};
use crate::utils::logger::sanitize_log_message;
use crate::utils::validation::resolve_username;

/// Runs the extraction core over one page body.
pub fn parse_profile_html(html: &str, json_max_length: usize) -> Result<ProfileRecord> {
    let user_data = locate_user_data(html, json_max_length)?;
    let stats = locate_stats(html, &user_data, json_max_length);
    Ok(normalize(&user_data, &stats))
}

/// Request pipeline: rate limit, validate, cache, fetch, extract, cache.
pub struct ProfileService<F, C, R, P>
where
    F: ProfileFetcher,
    C: ProfileCache,
    R: RateLimiter,
    P: ConfigProvider,
{
    fetcher: F,
    cache: C,
    limiter: R,
    config: P,
}

impl<F, C, R, P> ProfileService<F, C, R, P>
where
    F: ProfileFetcher,
    C: ProfileCache,
    R: RateLimiter,
    P: ConfigProvider,
{
    pub fn new(fetcher: F, cache: C, limiter: R, config: P) -> Self {
        Self {
            fetcher,
            cache,
            limiter,
            config,
        }
    }

    pub fn config(&self) -> &P {
        &self.config
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn limiter(&self) -> &R {
        &self.limiter
    }

    pub async fn lookup(&self, client_identity: &str, raw_username: Option<&str>) -> Result<ProfileLookup> {
        if !self.limiter.check(client_identity).await {
            tracing::warn!("🚫 Rate limit exceeded for client {}", client_identity);
            return Err(ProfileError::RateLimited {
                retry_after: self.config.retry_after_seconds(),
            });
        }

        let username = resolve_username(raw_username)?;

        if let Some(record) = self.cache.get(&username).await {
            tracing::debug!("Cache hit for {}", username);
            return Ok(ProfileLookup {
                record,
                from_cache: true,
            });
        }

        let record = self.fetch_and_parse(&username).await?;

        if !self.cache.set(&username, &record).await {
            tracing::debug!("Profile for {} was not cached", username);
        }

        Ok(ProfileLookup {
            record,
            from_cache: false,
        })
    }

    async fn fetch_and_parse(&self, username: &str) -> Result<ProfileRecord> {
        tracing::info!("🔍 Fetching profile page for {}", username);
        let html = self.fetcher.fetch_profile(username).await?;
        tracing::debug!("Fetched {} bytes of HTML", html.len());

        parse_profile_html(&html, self.config.json_max_length()).inspect_err(|e| {
            tracing::error!(
                "❌ Extraction failed for {}: {}",
                username,
                sanitize_log_message(&e.to_string(), self.config.log_max_length())
            );
        })
    }
}
