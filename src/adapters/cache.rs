use crate::config::toml_config::CacheConfig;
use crate::core::{ProfileCache, ProfileRecord};
use crate::utils::error::Result;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tokio::fs;

/// Per-write suffix so concurrent writers never share a temp file.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// One JSON file per username under `directory`, expired by file mtime.
#[derive(Debug, Clone)]
pub struct FileCache {
    directory: PathBuf,
    ttl: Duration,
    enabled: bool,
}

impl FileCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            directory: config.directory.clone(),
            ttl: Duration::from_secs(config.ttl_seconds),
            enabled: config.enabled,
        }
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.directory
            .join(format!("{:x}.json", Sha256::digest(key.as_bytes())))
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.file_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// 清除所有過期的快取檔案，回傳刪除數量
    pub async fn cleanup(&self) -> Result<usize> {
        let mut entries = match fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if is_expired(&path, self.ttl).await && fs::remove_file(&path).await.is_ok() {
                removed += 1;
            }
        }

        tracing::debug!("Removed {} expired cache files", removed);
        Ok(removed)
    }
}

impl ProfileCache for FileCache {
    async fn get(&self, key: &str) -> Option<ProfileRecord> {
        if !self.enabled {
            return None;
        }

        let path = self.file_path(key);
        let metadata = fs::metadata(&path).await.ok()?;

        if age(&metadata).map_or(true, |age| age > self.ttl) {
            let _ = fs::remove_file(&path).await;
            return None;
        }

        let content = fs::read(&path).await.ok()?;
        match serde_json::from_slice(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Discarding unreadable cache entry {}: {}", path.display(), e);
                None
            }
        }
    }

    async fn set(&self, key: &str, record: &ProfileRecord) -> bool {
        if !self.enabled {
            return false;
        }

        if let Err(e) = fs::create_dir_all(&self.directory).await {
            tracing::warn!("Cannot create cache directory {}: {}", self.directory.display(), e);
            return false;
        }

        let json = match serde_json::to_vec(record) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Cannot serialize cache entry: {}", e);
                return false;
            }
        };

        // 先寫暫存檔再 rename，避免讀到寫到一半的檔案
        let path = self.file_path(key);
        let tmp_path = path.with_extension(format!(
            "json.{}.{}.tmp",
            std::process::id(),
            TMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        if let Err(e) = fs::write(&tmp_path, &json).await {
            tracing::warn!("Cannot write cache entry: {}", e);
            return false;
        }
        match fs::rename(&tmp_path, &path).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Cannot store cache entry: {}", e);
                let _ = fs::remove_file(&tmp_path).await;
                false
            }
        }
    }
}

fn age(metadata: &std::fs::Metadata) -> Option<Duration> {
    let modified = metadata.modified().ok()?;
    Some(
        SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO),
    )
}

async fn is_expired(path: &Path, ttl: Duration) -> bool {
    match fs::metadata(path).await {
        Ok(metadata) => age(&metadata).is_some_and(|age| age > ttl),
        Err(_) => false,
    }
}
