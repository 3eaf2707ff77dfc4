//! Query-string parameter lookup on a `:path` value.

/// Return the raw value of the first `key` parameter in the query part of
/// `path_with_query`.
///
/// A bare `key` (no `=`) matches with an empty value. Without a `?` there is
/// no query and nothing is found.
pub fn get_query_param<'a>(path_with_query: &'a str, key: &str) -> Option<&'a str> {
    let (_, query) = path_with_query.split_once('?')?;

    query.split('&').find_map(|pair| match pair.split_once('=') {
        Some((name, value)) if name == key => Some(value),
        None if pair == key => Some(""),
        _ => None,
    })
}
