//! Read-only view of one request's attributes.

use std::collections::HashMap;

/// Pseudo-header carrying the request path and optional query string.
pub const PATH_ATTRIBUTE: &str = ":path";

/// Borrowed view over a caller-owned attribute map.
///
/// Header names keep their original casing in the map; a lower-cased index is
/// built once so case-insensitive lookups are O(1). When several casings of
/// one name are present, which value the index keeps is unspecified.
#[derive(Debug)]
pub struct RequestView<'a> {
    attributes: &'a HashMap<String, String>,
    folded: HashMap<String, &'a str>,
}

impl<'a> RequestView<'a> {
    pub fn new(attributes: &'a HashMap<String, String>) -> Self {
        let mut folded = HashMap::with_capacity(attributes.len());
        for (name, value) in attributes {
            folded.entry(name.to_lowercase()).or_insert(value.as_str());
        }
        Self { attributes, folded }
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Exact-name lookup, falling back to a case-insensitive match.
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.get(name)
            .or_else(|| self.folded.get(&name.to_lowercase()).copied())
    }

    /// The `:path` attribute, or `""` when absent.
    pub fn path(&self) -> &'a str {
        self.get(PATH_ATTRIBUTE).unwrap_or_default()
    }

    /// The raw `Cookie` header: `cookie` first, then `Cookie`.
    pub fn cookie_header(&self) -> Option<&'a str> {
        self.get("cookie").or_else(|| self.get("Cookie"))
    }
}
