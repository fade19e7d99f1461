//! Profile picture URL normalization.

use serde_json::Value;

const PLAIN_SEGMENT: &str = "/plain/";

/// Pull a usable URL out of a Whop `profile_picture` value.
///
/// Accepts a bare string or an object with `url` / `image_url`. Image-proxy
/// URLs of the form `https://cdn/.../plain/https://origin/pic.png` are
/// unwrapped to the origin URL.
pub fn extract_profile_picture_url(value: &Value) -> Option<String> {
    let url = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => ["url", "image_url"]
            .iter()
            .filter_map(|key| map.get(*key).and_then(Value::as_str))
            .find(|s| !s.is_empty())?,
        _ => return None,
    };
    if url.is_empty() {
        return None;
    }
    Some(unwrap_plain_url(url).to_string())
}

/// Return the origin URL wrapped after the last `/plain/` segment, if any.
pub fn unwrap_plain_url(url: &str) -> &str {
    match url.rfind(PLAIN_SEGMENT) {
        Some(idx) => {
            let inner = &url[idx + PLAIN_SEGMENT.len()..];
            if inner.starts_with("http") {
                inner
            } else {
                url
            }
        }
        None => url,
    }
}
