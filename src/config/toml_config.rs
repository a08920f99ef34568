use crate::core::ConfigProvider;
use crate::core::extract::DEFAULT_JSON_MAX_LENGTH;
use crate::utils::error::{ProfileError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub fetch: FetchConfig,
    pub parser: ParserConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub directory: PathBuf,
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub max_requests: u64,
    pub window_seconds: u64,
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
    pub max_redirects: usize,
    pub user_agent: String,
    pub accept_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub json_max_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub max_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: std::env::temp_dir().join("tiktok_cache"),
            ttl_seconds: 300,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 30,
            window_seconds: 60,
            directory: std::env::temp_dir().join("tiktok_ratelimit"),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.tiktok.com".to_string(),
            timeout_seconds: 30,
            connect_timeout_seconds: 10,
            max_redirects: 3,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            accept_language: "ja,en;q=0.9".to_string(),
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            json_max_length: DEFAULT_JSON_MAX_LENGTH,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { max_length: 500 }
    }
}

impl ServiceConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ProfileError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ProfileError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CACHE_DIR})，未定義的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::LazyLock;

        static ENV_VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"\$\{([^}]+)\}").expect("Failed to compile env var regex")
        });

        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_non_empty_string("server.bind", &self.server.bind)?;
        self.server
            .bind
            .parse::<std::net::SocketAddr>()
            .map_err(|e| ProfileError::InvalidConfigValueError {
                field: "server.bind".to_string(),
                value: self.server.bind.clone(),
                reason: format!("Invalid socket address: {}", e),
            })?;

        validate_path("cache.directory", &self.cache.directory.to_string_lossy())?;
        validate_positive_number("cache.ttl_seconds", self.cache.ttl_seconds, 1)?;

        validate_path("rate_limit.directory", &self.rate_limit.directory.to_string_lossy())?;
        validate_positive_number("rate_limit.max_requests", self.rate_limit.max_requests, 1)?;
        validate_positive_number("rate_limit.window_seconds", self.rate_limit.window_seconds, 1)?;

        validate_url("fetch.base_url", &self.fetch.base_url)?;
        validate_positive_number("fetch.timeout_seconds", self.fetch.timeout_seconds, 1)?;
        validate_positive_number(
            "fetch.connect_timeout_seconds",
            self.fetch.connect_timeout_seconds,
            1,
        )?;
        validate_range("fetch.max_redirects", self.fetch.max_redirects, 0, 10)?;
        validate_non_empty_string("fetch.user_agent", &self.fetch.user_agent)?;

        validate_range(
            "parser.json_max_length",
            self.parser.json_max_length,
            1_024,
            10_000_000,
        )?;
        validate_positive_number("log.max_length", self.log.max_length as u64, 1)?;

        Ok(())
    }
}

impl ConfigProvider for ServiceConfig {
    fn json_max_length(&self) -> usize {
        self.parser.json_max_length
    }

    fn log_max_length(&self) -> usize {
        self.log.max_length
    }

    fn retry_after_seconds(&self) -> u64 {
        self.rate_limit.window_seconds
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
