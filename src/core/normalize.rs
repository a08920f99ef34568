use crate::core::fields::{
    format_number, format_timestamp, get_bool, get_int, get_string, sanitize_url,
    translate_setting, UNKNOWN_MARKER, UNSET_MARKER,
};
use crate::domain::model::{
    AccountInfo, ExtractedObject, FormattedStats, ProfileFeatures, ProfileInfo, ProfileRecord,
    ProfileSettings, ProfileStats,
};
use serde_json::Value;

pub const PROFILE_BASE_URL: &str = "https://www.tiktok.com/@";

const STAT_KEYS: [&str; 5] = [
    "followerCount",
    "followingCount",
    "videoCount",
    "heartCount",
    "friendCount",
];

/// Maps the extracted user and stats objects onto the fixed output schema.
/// Total: missing or mistyped fields fall back to their defaults.
pub fn normalize(user_data: &ExtractedObject, stats: &ExtractedObject) -> ProfileRecord {
    let unique_id = get_string(user_data, "uniqueId", "");

    let profile = ProfileInfo {
        uid: get_string(user_data, "id", ""),
        nickname: get_string(user_data, "nickname", ""),
        signature: get_string(user_data, "signature", ""),
        avatar: sanitize_url(&get_string(user_data, "avatarLarger", "")),
        avatar_medium: sanitize_url(&get_string(user_data, "avatarMedium", "")),
        avatar_thumb: sanitize_url(&get_string(user_data, "avatarThumb", "")),
        profile_url: format!("{PROFILE_BASE_URL}{unique_id}"),
        verified: get_bool(user_data, "verified", false),
        private_account: get_bool(user_data, "privateAccount", false),
        uniqueid: unique_id,
    };

    let [follower, following, video, heart, friend] =
        STAT_KEYS.map(|key| (get_int(stats, key, 0), formatted_stat(stats, key)));

    let stats = ProfileStats {
        follower_count: follower.0,
        following_count: following.0,
        video_count: video.0,
        heart_count: heart.0,
        friend_count: friend.0,
        formatted: FormattedStats {
            follower_count: follower.1,
            following_count: following.1,
            video_count: video.1,
            heart_count: heart.1,
            friend_count: friend.1,
        },
    };

    let account = AccountInfo {
        sec_uid: get_string(user_data, "secUid", ""),
        short_id: get_string(user_data, "shortId", UNSET_MARKER),
        create_time: format_timestamp(user_data.get("createTime")),
        nickname_modify_time: format_timestamp(user_data.get("nickNameModifyTime")),
        region: get_string(user_data, "region", UNKNOWN_MARKER),
        language: get_string(user_data, "language", UNKNOWN_MARKER),
    };

    let settings = ProfileSettings {
        comment_setting: translate_setting(user_data.get("commentSetting")),
        duet_setting: translate_setting(user_data.get("duetSetting")),
        stitch_setting: translate_setting(user_data.get("stitchSetting")),
        download_setting: translate_setting(user_data.get("downloadSetting")),
    };

    let features = ProfileFeatures {
        ftc: get_bool(user_data, "ftc", false),
        open_favorite: get_bool(user_data, "openFavorite", false),
        tt_seller: get_bool(user_data, "ttSeller", false),
        commerce_user: commerce_user(user_data),
    };

    ProfileRecord {
        profile,
        stats,
        account,
        settings,
        features,
    }
}

fn formatted_stat(stats: &ExtractedObject, key: &str) -> String {
    stats
        .get(key)
        .map(format_number)
        .unwrap_or_else(|| "0".to_string())
}

fn commerce_user(user_data: &ExtractedObject) -> Option<Value> {
    user_data
        .get("commerceUserInfo")
        .and_then(Value::as_object)
        .and_then(|info| info.get("commerceUser"))
        .filter(|v| !v.is_null())
        .cloned()
}
