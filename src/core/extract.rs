use crate::domain::model::ExtractedObject;
use serde_json::Value;

/// Default scan window, in bytes from the anchor position.
pub const DEFAULT_JSON_MAX_LENGTH: usize = 100_000;

/// Finds `anchor` in `html` and parses the first balanced `{...}` at or after it.
///
/// Braces are counted literally (string contents are not skipped). The scan
/// stops `max_len` bytes after the anchor position; an object that does not
/// close inside that window, fails to parse, or is not a JSON object yields
/// `None`.
pub fn extract_json_object(html: &str, anchor: &str, max_len: usize) -> Option<ExtractedObject> {
    if anchor.is_empty() {
        return None;
    }
    let start = html.find(anchor)?;
    extract_balanced_from(html, start, start, max_len)
}

/// Depth-counts from `scan_from` until the first object closes, limited to
/// `window_start + max_len`.
pub(crate) fn extract_balanced_from(
    html: &str,
    scan_from: usize,
    window_start: usize,
    max_len: usize,
) -> Option<ExtractedObject> {
    let bytes = html.as_bytes();
    let limit = bytes.len().min(window_start.saturating_add(max_len));

    let mut depth: usize = 0;
    let mut object_start = scan_from;

    for i in scan_from..limit {
        match bytes[i] {
            b'{' => {
                if depth == 0 {
                    object_start = i;
                }
                depth += 1;
            }
            // stray closer before the object opened
            b'}' if depth == 0 => {}
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return parse_object(&html[object_start..=i]);
                }
            }
            _ => {}
        }
    }

    None
}

fn parse_object(candidate: &str) -> Option<ExtractedObject> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("Balanced object is not valid JSON: {}", e);
            None
        }
    }
}
