//! Request attribute extraction.
//!
//! # Responsibilities
//! - Build the attribute map the routing engine evaluates (`:path` + headers)
//! - Read the request ID assigned by the request-id layer
//!
//! # Design Decisions
//! - Header names arrive lower-cased from `http`; lookups stay case-insensitive
//! - Repeated `cookie` headers are joined with `"; "`, others with `", "`
//! - Non-UTF-8 header bytes are decoded lossily rather than dropped

use std::collections::HashMap;

use axum::http::{header, Request};

use crate::routing::view::PATH_ATTRIBUTE;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Collect the routing attributes of a request.
pub fn request_attributes<B>(request: &Request<B>) -> HashMap<String, String> {
    let mut attributes = HashMap::with_capacity(request.headers().keys_len() + 1);

    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    attributes.insert(PATH_ATTRIBUTE.to_string(), path.to_string());

    for (name, value) in request.headers() {
        let value = String::from_utf8_lossy(value.as_bytes());
        let separator = if name == header::COOKIE { "; " } else { ", " };
        attributes
            .entry(name.as_str().to_string())
            .and_modify(|existing: &mut String| {
                existing.push_str(separator);
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }

    attributes
}

/// The request ID, or `"unknown"` when the layer did not run.
pub fn request_id<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}
