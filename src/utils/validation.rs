use crate::utils::error::{ProfileError, Result};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static PROFILE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)tiktok\.com/@([a-zA-Z0-9_.]+)").expect("Failed to compile profile URL regex")
});

static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.]{2,24}$").expect("Failed to compile username regex")
});

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// 從使用者輸入（ID、@ID 或個人頁 URL）取出 ID
pub fn extract_tiktok_id(input: &str) -> Option<String> {
    let input = input.trim();

    if input.contains("tiktok.com/") {
        return PROFILE_URL_RE
            .captures(input)
            .map(|caps| caps[1].to_string());
    }

    Some(input.strip_prefix('@').unwrap_or(input).to_string())
}

pub fn validate_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

/// Turns the raw `username` query value into a validated username.
pub fn resolve_username(raw: Option<&str>) -> Result<String> {
    let raw = match raw {
        Some(value) if !value.trim().is_empty() => value,
        _ => return Err(ProfileError::MissingUsername),
    };

    let username = extract_tiktok_id(raw).ok_or_else(|| ProfileError::UnresolvableUrl {
        input: raw.to_string(),
    })?;

    if !validate_username(&username) {
        return Err(ProfileError::InvalidUsername { username });
    }

    Ok(username)
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(ProfileError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ProfileError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(ProfileError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ProfileError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ProfileError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(ProfileError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ProfileError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(ProfileError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}
