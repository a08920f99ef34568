use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Loosely typed JSON object lifted out of the page.
pub type ExtractedObject = Map<String, Value>;

/// Normalized profile returned by the API and stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub profile: ProfileInfo,
    pub stats: ProfileStats,
    pub account: AccountInfo,
    pub settings: ProfileSettings,
    pub features: ProfileFeatures,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProfileInfo {
    pub uid: String,
    pub uniqueid: String,
    pub nickname: String,
    pub signature: String,
    pub avatar: String,
    pub avatar_medium: String,
    pub avatar_thumb: String,
    pub profile_url: String,
    pub verified: bool,
    pub private_account: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProfileStats {
    pub follower_count: i64,
    pub following_count: i64,
    pub video_count: i64,
    pub heart_count: i64,
    pub friend_count: i64,
    pub formatted: FormattedStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FormattedStats {
    pub follower_count: String,
    pub following_count: String,
    pub video_count: String,
    pub heart_count: String,
    pub friend_count: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AccountInfo {
    pub sec_uid: String,
    pub short_id: String,
    pub create_time: String,
    pub nickname_modify_time: String,
    pub region: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProfileSettings {
    pub comment_setting: String,
    pub duet_setting: String,
    pub stitch_setting: String,
    pub download_setting: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProfileFeatures {
    pub ftc: bool,
    pub open_favorite: bool,
    pub tt_seller: bool,
    /// Passed through as-is from `commerceUserInfo.commerceUser`.
    pub commerce_user: Option<Value>,
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ProfileRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
}

impl ApiResponse {
    pub fn success(data: ProfileRecord, from_cache: bool) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().timestamp(),
            cached: from_cache.then_some(true),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            timestamp: chrono::Utc::now().timestamp(),
            cached: None,
        }
    }

    /// Envelope as JSON text, compact or pretty-printed.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

/// Result of one profile lookup, before it is wrapped in an envelope.
#[derive(Debug, Clone)]
pub struct ProfileLookup {
    pub record: ProfileRecord,
    pub from_cache: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_omits_data_and_cached() {
        let json = serde_json::to_value(ApiResponse::error("boom")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "boom");
        assert!(json.get("data").is_none());
        assert!(json.get("cached").is_none());
        assert!(json["timestamp"].is_i64());
    }

    #[test]
    fn test_to_json_compact_and_pretty() {
        let response = ApiResponse::error("boom");
        let compact = response.to_json(false).unwrap();
        assert!(compact.starts_with(r#"{"success":false,"error":"boom""#));

        let pretty = response.to_json(true).unwrap();
        assert!(pretty.contains("\n  \"error\": \"boom\""));
    }
}
