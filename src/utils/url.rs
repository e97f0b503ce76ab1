//! Query-string encode/decode and small object helpers

use std::collections::BTreeMap;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

use crate::error::{PageKitError, Result};

/// Characters left as-is by JavaScript's `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Build `?k=v&k2=v2` from a parameter map; an empty map gives `""`
pub fn encode_params(params: &BTreeMap<String, String>) -> String {
    if params.is_empty() {
        return String::new();
    }

    let pairs: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, utf8_percent_encode(value, URI_COMPONENT)))
        .collect();

    format!("?{}", pairs.join("&"))
}

/// Parse the query parameters out of a URL or bare `?query` string.
///
/// The fragment is ignored, keys without `=` map to an empty value and
/// empty segments are skipped. Later duplicates win.
pub fn decode_params(url: &str) -> Result<BTreeMap<String, String>> {
    let url = strip_fragment(url);
    let Some((_, query)) = url.split_once('?') else {
        return Ok(BTreeMap::new());
    };

    let mut params = BTreeMap::new();
    for segment in query.split('&').filter(|s| !s.is_empty()) {
        let (key, raw) = segment.split_once('=').unwrap_or((segment, ""));
        let value = percent_decode_str(raw)
            .decode_utf8()
            .map_err(|e| PageKitError::url_decode(key, e))?;
        params.insert(key.to_string(), value.into_owned());
    }

    Ok(params)
}

/// Drop everything from the first `#`
pub fn strip_fragment(url: &str) -> &str {
    match url.find('#') {
        Some(index) => &url[..index],
        None => url,
    }
}

/// Copy of `object` without `null` and empty-string values
pub fn drop_empty_values(object: &Map<String, Value>) -> Map<String, Value> {
    object
        .iter()
        .filter(|(_, value)| !matches!(value, Value::Null) && value.as_str() != Some(""))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Copy of `object` restricted to `keys`
pub fn pick_keys(object: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    object
        .iter()
        .filter(|(key, _)| keys.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
