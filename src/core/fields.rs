//! Typed, defaulted access to extracted JSON and the small formatters used by
//! the normalizer.

use crate::domain::model::ExtractedObject;
use chrono::DateTime;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

pub const UNSET_MARKER: &str = "未設定";
pub const UNKNOWN_MARKER: &str = "不明";

static CDN_URL_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)^https?://[a-z0-9.-]+\.tiktokcdn(-[a-z]+)?\.com/")
            .expect("Failed to compile CDN regex"),
        Regex::new(r"(?i)^https?://p[0-9]+-sign[a-z-]*\.tiktokcdn[a-z-]*\.com/")
            .expect("Failed to compile signed CDN regex"),
    ]
});

pub fn get_string(obj: &ExtractedObject, key: &str, default: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        _ => default.to_string(),
    }
}

pub fn get_int(obj: &ExtractedObject, key: &str, default: i64) -> i64 {
    match obj.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(default),
        Some(v @ Value::String(_)) => numeric_value(v).map(|f| f as i64).unwrap_or(default),
        _ => default,
    }
}

pub fn get_bool(obj: &ExtractedObject, key: &str, default: bool) -> bool {
    match obj.get(key) {
        None | Some(Value::Null) => default,
        Some(v) => truthy(v),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Numbers and numeric strings (`"12"`, `" 1.5e3"`) as `f64`; anything else is `None`.
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            let looks_numeric = !trimmed.is_empty()
                && trimmed
                    .chars()
                    .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
                && trimmed.chars().any(|c| c.is_ascii_digit());
            if !looks_numeric {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

/// 將數字縮寫成 K / M 表記
pub fn format_number(value: &Value) -> String {
    let Some(num) = numeric_value(value) else {
        return "0".to_string();
    };

    if num >= 1_000_000.0 {
        format!("{}M", group_decimal(num / 1_000_000.0, 1))
    } else if num >= 1_000.0 {
        format!("{}K", group_decimal(num / 1_000.0, 1))
    } else {
        group_decimal(num, 0)
    }
}

/// Rounds half away from zero and inserts `,` thousands separators.
fn group_decimal(value: f64, decimals: usize) -> String {
    let scale = 10f64.powi(decimals as i32);
    let rounded = (value * scale).round() / scale;
    let text = format!("{:.*}", decimals, rounded.abs());

    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(text.len() + int_part.len() / 3 + 1);
    if rounded < 0.0 {
        grouped.push('-');
    }
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

/// Human readable text for the comment/duet/stitch/download setting codes.
pub fn translate_setting(value: Option<&Value>) -> String {
    let code = match value {
        None | Some(Value::Null) | Some(Value::Array(_)) | Some(Value::Object(_)) => {
            return "unknown".to_string();
        }
        Some(Value::String(s)) if s.is_empty() => return "unknown".to_string(),
        Some(v) => scalar_to_int(v),
    };

    match code {
        0 => "everyone allowed".to_string(),
        1 => "followers only".to_string(),
        2 => "friends only".to_string(),
        3 => "private".to_string(),
        n => format!("setting value: {n}"),
    }
}

/// Integer coercion for scalars: bools are 0/1, floats truncate, strings use
/// their numeric prefix.
fn scalar_to_int(value: &Value) -> i64 {
    match value {
        Value::Bool(b) => i64::from(*b),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => numeric_value(value)
            .map(|f| f as i64)
            .unwrap_or_else(|| leading_int(s)),
        _ => 0,
    }
}

fn leading_int(s: &str) -> i64 {
    let s = s.trim_start();
    let mut end = 0;
    for (idx, ch) in s.char_indices() {
        if ch.is_ascii_digit() || (idx == 0 && matches!(ch, '+' | '-')) {
            end = idx + ch.len_utf8();
        } else {
            break;
        }
    }
    s[..end].parse().unwrap_or(0)
}

/// Keeps only image URLs served from the profile CDN; anything else becomes "".
pub fn sanitize_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }

    let cleaned: String = url.chars().filter(|c| !matches!(c, '\\' | '\0')).collect();

    if CDN_URL_PATTERNS.iter().any(|re| re.is_match(&cleaned)) {
        cleaned
    } else {
        String::new()
    }
}

/// `YYYY-MM-DD HH:MM:SS` (UTC) for numeric epoch seconds, else the unknown marker.
pub fn format_timestamp(value: Option<&Value>) -> String {
    value
        .and_then(numeric_value)
        .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| UNKNOWN_MARKER.to_string())
}
