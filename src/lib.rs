pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{build_service, DefaultProfileService, FileCache, FileRateLimiter, TikTokClient};
pub use config::ServiceConfig;
pub use core::service::{parse_profile_html, ProfileService};
pub use domain::model::{ApiResponse, ProfileRecord};
pub use utils::error::{ProfileError, Result};
