use clap::Parser;
use tiktok_profile_api::config::DEFAULT_CONFIG_FILE;
use tiktok_profile_api::core::ConfigProvider;
use tiktok_profile_api::utils::{logger, validation::Validate};
use tiktok_profile_api::{build_service, parse_profile_html, ApiResponse, ProfileError, ServiceConfig};

#[derive(Parser)]
#[command(name = "profile_dump")]
#[command(about = "Fetch one profile (or parse a saved page) and print the API envelope")]
struct Args {
    /// Username, @username or profile URL
    username: Option<String>,

    /// Parse a saved profile page instead of fetching
    #[arg(long)]
    html: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Bypass the response cache
    #[arg(long)]
    no_cache: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    let mut config = match &args.config {
        Some(path) => ServiceConfig::from_file(path)?,
        None if std::path::Path::new(DEFAULT_CONFIG_FILE).exists() => {
            ServiceConfig::from_file(DEFAULT_CONFIG_FILE)?
        }
        None => ServiceConfig::default(),
    };
    // 單次執行不需要限流
    config.rate_limit.enabled = false;
    if args.no_cache {
        config.cache.enabled = false;
    }

    if let Err(e) = config.validate() {
        eprintln!("❌ Configuration validation failed: {}", e);
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let outcome = match (&args.html, &args.username) {
        (Some(path), _) => {
            tracing::info!("📁 Parsing saved page: {}", path);
            let html = tokio::fs::read_to_string(path).await?;
            parse_profile_html(&html, config.json_max_length())
                .map(|record| ApiResponse::success(record, false))
        }
        (None, Some(username)) => {
            let service = build_service(config)?;
            service
                .lookup("cli", Some(username))
                .await
                .map(|lookup| ApiResponse::success(lookup.record, lookup.from_cache))
        }
        (None, None) => Err(ProfileError::MissingUsername),
    };

    let (response, failed) = match outcome {
        Ok(response) => (response, false),
        Err(e) => {
            tracing::error!("❌ {}", e);
            tracing::error!("💡 {}", e.recovery_suggestion());
            (ApiResponse::error(e.user_friendly_message()), true)
        }
    };

    println!("{}", response.to_json(args.pretty)?);

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
