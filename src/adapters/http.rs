use crate::config::toml_config::FetchConfig;
use crate::core::ProfileFetcher;
use crate::utils::error::{ProfileError, Result};
use crate::utils::logger::sanitize_log_message;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL};
use reqwest::{redirect, Client, StatusCode};
use std::time::Duration;

/// Fetches public profile pages over HTTPS.
#[derive(Debug, Clone)]
pub struct TikTokClient {
    client: Client,
    base_url: String,
    log_max_length: usize,
}

impl TikTokClient {
    pub fn new(config: &FetchConfig, log_max_length: usize) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language).map_err(|e| {
                ProfileError::InvalidConfigValueError {
                    field: "fetch.accept_language".to_string(),
                    value: config.accept_language.clone(),
                    reason: e.to_string(),
                }
            })?,
        );
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .redirect(redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            log_max_length,
        })
    }

    pub fn profile_url(&self, username: &str) -> String {
        format!("{}/@{}", self.base_url, encode_path_segment(username))
    }
}

#[async_trait]
impl ProfileFetcher for TikTokClient {
    async fn fetch_profile(&self, username: &str) -> Result<String> {
        let url = self.profile_url(username);
        tracing::debug!("Making profile request to: {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::warn!(
                "Fetch error: {}",
                sanitize_log_message(&e.to_string(), self.log_max_length)
            );
            ProfileError::Network(e)
        })?;

        let status = response.status();
        tracing::debug!("Profile response status: {}", status);

        if status == StatusCode::NOT_FOUND {
            return Err(ProfileError::UserNotFound);
        }
        if status != StatusCode::OK {
            tracing::warn!("HTTP error: {}", status.as_u16());
            return Err(ProfileError::HttpStatus {
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

/// RFC 3986 percent-encoding for a single path segment.
fn encode_path_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
        .replace('*', "%2A")
        .replace("%7E", "~")
}
