//! Target → upstream address table.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::Uri;

use crate::config::validation::check_upstream_url;

#[derive(Debug, Clone)]
struct Upstream {
    authority: Authority,
    /// Base path without trailing slash (empty for `/`).
    base_path: String,
}

/// Maps routing targets onto upstream base URLs.
#[derive(Debug, Clone, Default)]
pub struct Upstreams {
    by_target: HashMap<String, Upstream>,
}

impl Upstreams {
    /// Build the table. Entries with an unusable URL are skipped with a warning.
    pub fn from_config(upstreams: &BTreeMap<String, String>) -> Self {
        let mut by_target = HashMap::with_capacity(upstreams.len());

        for (target, raw) in upstreams {
            let parsed = check_upstream_url(raw).and_then(|url| {
                let host = url.host_str().unwrap_or_default();
                let authority = match url.port() {
                    Some(port) => format!("{host}:{port}"),
                    None => host.to_string(),
                };
                let authority = Authority::from_str(&authority).map_err(|e| e.to_string())?;
                Ok(Upstream {
                    authority,
                    base_path: url.path().trim_end_matches('/').to_string(),
                })
            });

            match parsed {
                Ok(upstream) => {
                    by_target.insert(target.clone(), upstream);
                }
                Err(reason) => {
                    tracing::warn!(
                        upstream = %target,
                        url = %raw,
                        %reason,
                        "Skipping invalid upstream"
                    );
                }
            }
        }

        Self { by_target }
    }

    pub fn len(&self) -> usize {
        self.by_target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }

    /// Rewrite `uri` to point at the upstream of `target`, keeping path and query.
    pub fn rewrite(&self, target: &str, uri: &Uri) -> Option<Uri> {
        let upstream = self.by_target.get(target)?;

        let original = uri.path_and_query().map(PathAndQuery::as_str).unwrap_or("/");
        let path_and_query = if upstream.base_path.is_empty() {
            PathAndQuery::from_str(original).ok()?
        } else {
            PathAndQuery::from_str(&format!("{}{}", upstream.base_path, original)).ok()?
        };

        Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(upstream.authority.clone())
            .path_and_query(path_and_query)
            .build()
            .ok()
    }
}
