//! `Cookie` header parsing.
//!
//! # Responsibilities
//! - Split a `Cookie` header into `name=value` pairs
//! - Percent-decode values with query-unescape semantics
//!
//! # Design Decisions
//! - Pairs without `=` are dropped, not treated as empty cookies
//! - A value that fails to decode is returned raw instead of failing the lookup

use std::collections::HashMap;

use percent_encoding::percent_decode_str;

/// Return the value of the first cookie called `name`, if any.
pub fn parse_cookie_value(cookie_header: &str, name: &str) -> Option<String> {
    pairs(cookie_header)
        .find(|(cookie_name, _)| *cookie_name == name)
        .map(|(_, value)| decode_value(value))
}

/// Parse every well-formed cookie. Later duplicates overwrite earlier ones.
pub fn parse_all_cookies(cookie_header: &str) -> HashMap<String, String> {
    pairs(cookie_header)
        .map(|(name, value)| (name.to_string(), decode_value(value)))
        .collect()
}

/// Check whether a cookie called `name` is present.
pub fn has_cookie(cookie_header: &str, name: &str) -> bool {
    parse_cookie_value(cookie_header, name).is_some()
}

/// Trimmed `(name, raw value)` pairs of a header.
fn pairs(cookie_header: &str) -> impl Iterator<Item = (&str, &str)> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(name, value)| (name.trim(), value.trim()))
}

fn decode_value(raw: &str) -> String {
    query_unescape(raw).unwrap_or_else(|| raw.to_string())
}

/// Decode `+` as space and `%XX` escapes.
///
/// Returns `None` for a `%` not followed by two hex digits, or when the
/// decoded bytes are not UTF-8.
pub(crate) fn query_unescape(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let malformed = bytes.iter().enumerate().any(|(i, &b)| {
        b == b'%'
            && !(bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit))
    });
    if malformed {
        return None;
    }

    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}
