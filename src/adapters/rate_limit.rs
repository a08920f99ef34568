use crate::config::toml_config::RateLimitConfig;
use crate::core::RateLimiter;
use crate::utils::error::Result;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::sync::Mutex;

/// Fixed-window counter persisted as one small file per (client, window).
#[derive(Debug)]
pub struct FileRateLimiter {
    directory: PathBuf,
    max_requests: u64,
    window_seconds: u64,
    enabled: bool,
    // 同一程序內的讀改寫需要序列化
    write_lock: Mutex<()>,
}

impl FileRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            directory: config.directory.clone(),
            max_requests: config.max_requests,
            window_seconds: config.window_seconds.max(1),
            enabled: config.enabled,
            write_lock: Mutex::new(()),
        }
    }

    fn counter_path(&self, identity: &str, now: SystemTime) -> PathBuf {
        let secs = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        let bucket = secs / self.window_seconds;
        let key = Sha256::digest(format!("{identity}:{bucket}").as_bytes());
        self.directory.join(format!("{key:x}"))
    }

    async fn read_count(path: &Path) -> u64 {
        match fs::read_to_string(path).await {
            Ok(content) => content.trim().parse().unwrap_or(0),
            Err(_) => 0,
        }
    }

    async fn check_at(&self, identity: &str, now: SystemTime) -> bool {
        if !self.enabled {
            return true;
        }

        let _guard = self.write_lock.lock().await;

        if let Err(e) = fs::create_dir_all(&self.directory).await {
            tracing::warn!(
                "Cannot create rate limit directory {}: {}",
                self.directory.display(),
                e
            );
        }

        let path = self.counter_path(identity, now);
        let count = Self::read_count(&path).await;

        if count >= self.max_requests {
            return false;
        }

        if let Err(e) = fs::write(&path, (count + 1).to_string()).await {
            tracing::warn!("Cannot persist rate limit counter: {}", e);
        }
        true
    }

    /// Requests left for `identity` in the current window.
    pub async fn remaining(&self, identity: &str) -> u64 {
        let path = self.counter_path(identity, SystemTime::now());
        self.max_requests
            .saturating_sub(Self::read_count(&path).await)
    }

    /// 刪除超過兩個視窗長度的計數檔，回傳刪除數量
    pub async fn cleanup(&self) -> Result<usize> {
        let mut entries = match fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let max_age = Duration::from_secs(self.window_seconds * 2);
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let Ok(modified) = entry.metadata().await.and_then(|m| m.modified()) else {
                continue;
            };
            let stale = SystemTime::now()
                .duration_since(modified)
                .is_ok_and(|age| age > max_age);
            if stale && fs::remove_file(entry.path()).await.is_ok() {
                removed += 1;
            }
        }

        tracing::debug!("Removed {} stale rate limit files", removed);
        Ok(removed)
    }
}

impl RateLimiter for FileRateLimiter {
    async fn check(&self, identity: &str) -> bool {
        self.check_at(identity, SystemTime::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn limiter_in(dir: &TempDir, max_requests: u64, enabled: bool) -> FileRateLimiter {
        FileRateLimiter::new(&RateLimitConfig {
            enabled,
            max_requests,
            window_seconds: 60,
            directory: dir.path().join("ratelimit"),
        })
    }

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[tokio::test]
    async fn test_denies_after_max_requests_in_window() {
        let dir = TempDir::new().unwrap();
        let limiter = limiter_in(&dir, 3, true);

        for _ in 0..3 {
            assert!(limiter.check_at("10.0.0.1", at(6_000)).await);
        }
        assert!(!limiter.check_at("10.0.0.1", at(6_030)).await);
        // other clients have their own counter
        assert!(limiter.check_at("10.0.0.2", at(6_030)).await);
    }

    #[tokio::test]
    async fn test_new_window_resets_counter() {
        let dir = TempDir::new().unwrap();
        let limiter = limiter_in(&dir, 1, true);

        assert!(limiter.check_at("client", at(6_059)).await);
        assert!(!limiter.check_at("client", at(6_059)).await);
        assert!(limiter.check_at("client", at(6_060)).await);
    }

    #[tokio::test]
    async fn test_disabled_limiter_always_allows() {
        let dir = TempDir::new().unwrap();
        let limiter = limiter_in(&dir, 0, false);
        assert!(limiter.check("anyone").await);
        assert!(!dir.path().join("ratelimit").exists());
    }

    #[tokio::test]
    async fn test_remaining_counts_down() {
        let dir = TempDir::new().unwrap();
        let limiter = limiter_in(&dir, 5, true);

        assert_eq!(limiter.remaining("client").await, 5);
        assert!(limiter.check("client").await);
        assert!(limiter.check("client").await);
        // a window boundary between the two calls would reset the count
        assert!(limiter.remaining("client").await >= 3);
    }

    #[tokio::test]
    async fn test_concurrent_checks_do_not_lose_updates() {
        let dir = TempDir::new().unwrap();
        let limiter = std::sync::Arc::new(limiter_in(&dir, 10, true));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.check_at("burst", at(12_000)).await
            }));
        }

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 10);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_fresh_files() {
        let dir = TempDir::new().unwrap();
        let limiter = limiter_in(&dir, 5, true);
        assert!(limiter.check("client").await);
        assert_eq!(limiter.cleanup().await.unwrap(), 0);
    }
}
