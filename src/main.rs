use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tiktok_profile_api::adapters::server;
use tiktok_profile_api::utils::{logger, validation::Validate};
use tiktok_profile_api::{build_service, CliConfig};

/// 過期快取與計數檔的清理間隔
const JANITOR_INTERVAL: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting tiktok-profile-api");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.load_service_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    tracing::info!(
        "✅ Configuration loaded (cache: {}, rate limit: {} req / {}s)",
        if config.cache.enabled { "on" } else { "off" },
        config.rate_limit.max_requests,
        config.rate_limit.window_seconds
    );

    let bind = config.server.bind.clone();
    let service = Arc::new(build_service(config)?);

    let janitor = service.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(JANITOR_INTERVAL);
        loop {
            ticker.tick().await;
            if let Err(e) = janitor.cache().cleanup().await {
                tracing::warn!("Cache cleanup failed: {}", e);
            }
            if let Err(e) = janitor.limiter().cleanup().await {
                tracing::warn!("Rate limit cleanup failed: {}", e);
            }
        }
    });

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    server::serve(listener, service).await?;

    Ok(())
}
