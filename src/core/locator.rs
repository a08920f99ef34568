use crate::core::extract::{extract_balanced_from, extract_json_object};
use crate::domain::model::ExtractedObject;
use crate::utils::error::{ProfileError, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

const USER_MODULE_ANCHOR: &str = "\"UserModule\":{";

/// The scan for the stats object starts `STATS_ANCHOR.len()` bytes past the
/// anchor, so changing the literal moves the offset with it.
const STATS_ANCHOR: &str = "\"stats\":";

static USER_FIELDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{"id":"([^"]+)","shortId":"[^"]*","uniqueId":"([^"]+)","nickname":"([^"]+)""#)
        .expect("Failed to compile user fields regex")
});

/// Finds the user object embedded in the profile page.
///
/// Tries the `"UserModule":{` anchor first. When that is missing, the user
/// object is located by its leading `id, shortId, uniqueId, nickname` field
/// order and re-extracted from a `{"id":"<id>` anchor.
pub fn locate_user_data(html: &str, max_len: usize) -> Result<ExtractedObject> {
    if let Some(module) = extract_json_object(html, USER_MODULE_ANCHOR, max_len) {
        tracing::debug!("User data found via UserModule anchor");
        return Ok(unwrap_user_module(module));
    }

    let Some(caps) = USER_FIELDS_RE.captures(html) else {
        tracing::warn!("UserModule pattern not found in HTML");
        return Err(ProfileError::ExtractionFailed {
            message: "user data pattern not found".to_string(),
        });
    };

    let id = &caps[1];
    tracing::debug!("Falling back to user fields anchor (uniqueId={})", &caps[2]);

    let anchor = format!("{{\"id\":\"{id}");
    extract_json_object(html, &anchor, max_len).ok_or_else(|| {
        tracing::warn!("Failed to parse JSON for user ID: {}", id);
        ProfileError::UserDataParse { id: id.to_string() }
    })
}

/// `UserModule` keeps users in a `users` map keyed by handle; the first entry in
/// page order is the profile owner (`preserve_order` keeps that order).
fn unwrap_user_module(module: ExtractedObject) -> ExtractedObject {
    let user = match module.get("users") {
        Some(Value::Object(users)) => users.values().find_map(|v| v.as_object()).cloned(),
        _ => None,
    };
    user.unwrap_or(module)
}

/// Locates the counters object. Never fails; the worst case is an empty map.
pub fn locate_stats(html: &str, user_data: &ExtractedObject, max_len: usize) -> ExtractedObject {
    if let Some(anchor_pos) = html.find(STATS_ANCHOR) {
        let scan_from = anchor_pos + STATS_ANCHOR.len();
        match extract_balanced_from(html, scan_from, anchor_pos, max_len) {
            Some(stats) => return select_user_stats(stats, user_data),
            None => tracing::debug!("stats anchor present but object unusable, using fallback"),
        }
    }

    match user_data.get("stats") {
        Some(Value::Object(stats)) => stats.clone(),
        _ => ExtractedObject::new(),
    }
}

/// `UserModule.stats` is keyed by uniqueId; pick the owner's entry when that layout is seen.
fn select_user_stats(stats: ExtractedObject, user_data: &ExtractedObject) -> ExtractedObject {
    let keyed = user_data
        .get("uniqueId")
        .and_then(Value::as_str)
        .and_then(|unique_id| stats.get(unique_id))
        .and_then(Value::as_object)
        .cloned();
    keyed.unwrap_or(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extract::DEFAULT_JSON_MAX_LENGTH;
    use serde_json::json;

    #[test]
    fn test_user_module_anchor() {
        let html = r#"<script>{"UserModule":{"users":{"foo":{"id":"123","uniqueId":"foo"}}}}</script>"#;
        let user = locate_user_data(html, DEFAULT_JSON_MAX_LENGTH).unwrap();
        assert_eq!(user["id"], "123");
        assert_eq!(user["uniqueId"], "foo");
    }

    #[test]
    fn test_user_module_picks_first_user_in_page_order() {
        let html = r#"{"UserModule":{"users":{"zed":{"id":"1","uniqueId":"zed"},"abc":{"id":"2","uniqueId":"abc"}}}}"#;
        let user = locate_user_data(html, DEFAULT_JSON_MAX_LENGTH).unwrap();
        assert_eq!(user["uniqueId"], "zed");
        assert_eq!(user["id"], "1");
    }

    #[test]
    fn test_user_module_without_users_map_is_returned_as_is() {
        let html = r#"{"UserModule":{"id":"9","uniqueId":"flat"}}"#;
        let user = locate_user_data(html, DEFAULT_JSON_MAX_LENGTH).unwrap();
        assert_eq!(user["id"], "9");
    }

    #[test]
    fn test_falls_back_to_field_order_pattern() {
        let html = r#"<div>junk</div><script>window.x={"user":{"id":"555","shortId":"s1","uniqueId":"bar","nickname":"Bar"}};</script>"#;
        let user = locate_user_data(html, DEFAULT_JSON_MAX_LENGTH).unwrap();
        assert_eq!(user["id"], "555");
        assert_eq!(user["uniqueId"], "bar");
        assert_eq!(user["shortId"], "s1");
    }

    #[test]
    fn test_no_user_data_is_extraction_failed() {
        let err = locate_user_data("<html>nothing here</html>", DEFAULT_JSON_MAX_LENGTH)
            .unwrap_err();
        assert!(matches!(err, ProfileError::ExtractionFailed { .. }));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_pattern_match_but_unparseable_object() {
        let html = r#"{"id":"777","shortId":"","uniqueId":"baz","nickname":"Baz","broken":}"#;
        let err = locate_user_data(html, DEFAULT_JSON_MAX_LENGTH).unwrap_err();
        match err {
            ProfileError::UserDataParse { id } => assert_eq!(id, "777"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_broken_user_module_uses_fallback() {
        let html = r#""UserModule":{"users": oops} {"id":"1","shortId":"","uniqueId":"u","nickname":"N"}"#;
        let user = locate_user_data(html, DEFAULT_JSON_MAX_LENGTH).unwrap();
        assert_eq!(user["id"], "1");
    }

    #[test]
    fn test_stats_anchor() {
        let html = r#"{"stats":{"followerCount":1500,"heartCount":10}}"#;
        let stats = locate_stats(html, &ExtractedObject::new(), DEFAULT_JSON_MAX_LENGTH);
        assert_eq!(stats["followerCount"], 1500);
    }

    #[test]
    fn test_stats_anchor_tolerates_whitespace() {
        let html = r#""stats": {"videoCount":3}"#;
        let stats = locate_stats(html, &ExtractedObject::new(), DEFAULT_JSON_MAX_LENGTH);
        assert_eq!(stats["videoCount"], 3);
    }

    #[test]
    fn test_stats_keyed_by_unique_id() {
        let html = r#""stats":{"foo":{"followerCount":42}}"#;
        let user = json!({"uniqueId": "foo"}).as_object().cloned().unwrap();
        let stats = locate_stats(html, &user, DEFAULT_JSON_MAX_LENGTH);
        assert_eq!(stats["followerCount"], 42);
    }

    #[test]
    fn test_stats_fallback_to_user_data() {
        let user = json!({"stats": {"followingCount": 7}})
            .as_object()
            .cloned()
            .unwrap();
        let stats = locate_stats("<html></html>", &user, DEFAULT_JSON_MAX_LENGTH);
        assert_eq!(stats["followingCount"], 7);

        // anchor present but the object never closes
        let stats = locate_stats(r#""stats":{"followerCount":1"#, &user, DEFAULT_JSON_MAX_LENGTH);
        assert_eq!(stats["followingCount"], 7);
    }

    #[test]
    fn test_stats_empty_when_nothing_found() {
        let user = json!({"stats": "n/a"}).as_object().cloned().unwrap();
        let stats = locate_stats("no counters", &user, DEFAULT_JSON_MAX_LENGTH);
        assert!(stats.is_empty());
    }
}
