use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Network error while fetching profile: {0}")]
    Network(#[from] reqwest::Error),

    #[error("User does not exist")]
    UserNotFound,

    #[error("Unexpected HTTP status while fetching profile: {status}")]
    HttpStatus { status: u16 },

    #[error("User data extraction failed: {message}")]
    ExtractionFailed { message: String },

    #[error("Failed to parse user JSON for captured id: {id}")]
    UserDataParse { id: String },

    #[error("Missing username parameter")]
    MissingUsername,

    #[error("Could not extract an ID from URL: {input}")]
    UnresolvableUrl { input: String },

    #[error("Invalid username format: {username}")]
    InvalidUsername { username: String },

    #[error("Method not allowed: {method}")]
    MethodNotAllowed { method: String },

    #[error("Rate limit exceeded")]
    RateLimited { retry_after: u64 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration validation error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl ProfileError {
    /// HTTP status used for the error envelope.
    pub fn status_code(&self) -> u16 {
        match self {
            ProfileError::UserNotFound => 404,
            ProfileError::MissingUsername
            | ProfileError::UnresolvableUrl { .. }
            | ProfileError::InvalidUsername { .. } => 400,
            ProfileError::MethodNotAllowed { .. } => 405,
            ProfileError::RateLimited { .. } => 429,
            _ => 500,
        }
    }

    /// Message exposed to API callers. Never carries remote payload or paths.
    pub fn user_friendly_message(&self) -> String {
        match self {
            ProfileError::Network(e) => {
                let kind = if e.is_timeout() {
                    "timeout"
                } else if e.is_connect() {
                    "connect"
                } else {
                    "request"
                };
                format!("A network error occurred while fetching the profile ({kind} error)")
            }
            ProfileError::UserNotFound => "The user does not exist".to_string(),
            ProfileError::HttpStatus { status } => format!(
                "An error occurred while fetching the profile (HTTP status: {status})"
            ),
            ProfileError::ExtractionFailed { .. } => "Failed to extract user data; the user may not exist or the page structure changed.".to_string(),
            ProfileError::UserDataParse { .. } => {
                "Failed to parse user data; the page structure may have changed.".to_string()
            }
            ProfileError::MissingUsername => "The username parameter is missing".to_string(),
            ProfileError::UnresolvableUrl { .. } => {
                "Could not extract an ID from the given URL".to_string()
            }
            ProfileError::InvalidUsername { .. } => "Invalid username format (letters, digits, underscore and dot only, 2-24 characters)".to_string(),
            ProfileError::MethodNotAllowed { .. } => "Only the GET method is supported".to_string(),
            ProfileError::RateLimited { .. } => {
                "Request limit reached. Please wait a moment and retry.".to_string()
            }
            _ => "Internal server error".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ProfileError::Network(_) | ProfileError::HttpStatus { .. } => {
                "Check network connectivity and the fetch.base_url / timeout settings"
            }
            ProfileError::UserNotFound => "Verify the username is spelled correctly",
            ProfileError::ExtractionFailed { .. } | ProfileError::UserDataParse { .. } => {
                "Save the page with profile_dump and inspect the embedded JSON markers"
            }
            ProfileError::ConfigValidationError { .. }
            | ProfileError::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command line arguments"
            }
            ProfileError::IoError(_) => "Check that the cache and rate limit directories are writable",
            ProfileError::RateLimited { .. } => "Retry after the rate limit window resets",
            _ => "Check the request parameters",
        }
    }
}

pub type Result<T> = std::result::Result<T, ProfileError>;
