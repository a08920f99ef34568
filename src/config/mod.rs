pub mod toml_config;

pub use toml_config::ServiceConfig;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "profile-api.toml";

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "tiktok-profile-api")]
#[command(about = "HTTP API returning normalized TikTok profile data")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override server.bind (e.g. 0.0.0.0:8080)
    #[arg(long)]
    pub bind: Option<String>,

    #[arg(long, help = "Disable the response cache")]
    pub no_cache: bool,

    #[arg(long, help = "Disable per-client rate limiting")]
    pub no_rate_limit: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 載入配置檔，再套用命令列覆蓋設定
    pub fn load_service_config(&self) -> Result<ServiceConfig> {
        let mut config = match &self.config {
            Some(path) => ServiceConfig::from_file(path)?,
            None if std::path::Path::new(DEFAULT_CONFIG_FILE).exists() => {
                ServiceConfig::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => ServiceConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut ServiceConfig) {
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
            tracing::info!("🔧 server.bind overridden to: {}", bind);
        }
        if self.no_cache {
            config.cache.enabled = false;
            tracing::info!("🔧 Cache disabled from command line");
        }
        if self.no_rate_limit {
            config.rate_limit.enabled = false;
            tracing::info!("🔧 Rate limiting disabled from command line");
        }
    }
}
