//! Applying a routing decision to request headers.
//!
//! Order of operations:
//! 1. route header (default `x-route-target`) ← target
//! 2. `X-Routed-By` and `X-Route-Reason` (rule name or `default`)
//! 3. rule `add_headers`, replacing existing values
//! 4. rule `remove_headers`
//!
//! Client-supplied values of these headers are always overwritten. Names or
//! values that are not valid HTTP are skipped with a warning.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::routing::types::{ROUTED_BY_HEADER, ROUTER_NAME, ROUTE_REASON_HEADER};
use crate::routing::RoutingDecision;

pub fn apply_decision(
    headers: &mut HeaderMap,
    decision: &RoutingDecision,
    route_header: &HeaderName,
) {
    match HeaderValue::from_str(&decision.target) {
        Ok(value) => {
            headers.insert(route_header.clone(), value);
        }
        Err(_) => tracing::warn!(
            route_target = %decision.target,
            "Target is not a valid header value"
        ),
    }

    set_header(headers, ROUTED_BY_HEADER, ROUTER_NAME);
    set_header(headers, ROUTE_REASON_HEADER, decision.route_reason());

    for (name, value) in &decision.add_headers {
        set_header(headers, name, value);
    }

    for name in &decision.remove_headers {
        match HeaderName::from_bytes(name.as_bytes()) {
            Ok(name) => {
                headers.remove(name);
            }
            Err(_) => tracing::warn!(header = %name, "Failed to remove header: invalid name"),
        }
    }
}

fn set_header(headers: &mut HeaderMap, name: &str, value: &str) {
    let parsed = HeaderName::from_bytes(name.as_bytes())
        .ok()
        .zip(HeaderValue::from_str(value).ok());
    match parsed {
        Some((name, value)) => {
            headers.insert(name, value);
        }
        None => tracing::warn!(header = %name, "Failed to add header: invalid name or value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn route_header() -> HeaderName {
        HeaderName::from_static("x-route-target")
    }

    #[test]
    fn test_default_decision_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-route-reason", HeaderValue::from_static("spoofed"));

        apply_decision(&mut headers, &RoutingDecision::fallback("v1"), &route_header());

        assert_eq!(headers["x-route-target"], "v1");
        assert_eq!(headers["x-routed-by"], "smart-router");
        assert_eq!(headers.get_all("x-route-reason").iter().count(), 1);
        assert_eq!(headers["x-route-reason"], "default");
    }

    #[test]
    fn test_rule_headers_override_standard_ones() {
        let decision = RoutingDecision {
            target: "v2".to_string(),
            matched_rule: "beta-testers".to_string(),
            add_headers: BTreeMap::from([
                ("X-Route-Reason".to_string(), "beta-tester-match".to_string()),
                ("X-Cohort".to_string(), "beta".to_string()),
            ]),
            remove_headers: vec!["X-Debug".to_string()],
        };
        let mut headers = HeaderMap::new();
        headers.insert("x-debug", HeaderValue::from_static("1"));

        apply_decision(&mut headers, &decision, &route_header());

        assert_eq!(headers["x-route-target"], "v2");
        assert_eq!(headers["x-route-reason"], "beta-tester-match");
        assert_eq!(headers["x-cohort"], "beta");
        assert!(headers.get("x-debug").is_none());
    }

    #[test]
    fn test_matched_rule_is_route_reason() {
        let decision = RoutingDecision {
            target: "v2".to_string(),
            matched_rule: "canary".to_string(),
            add_headers: BTreeMap::new(),
            remove_headers: Vec::new(),
        };
        let mut headers = HeaderMap::new();
        apply_decision(&mut headers, &decision, &route_header());
        assert_eq!(headers["x-route-reason"], "canary");
    }

    #[test]
    fn test_invalid_headers_are_skipped() {
        let decision = RoutingDecision {
            target: "v2".to_string(),
            matched_rule: "r".to_string(),
            add_headers: BTreeMap::from([
                ("bad name".to_string(), "x".to_string()),
                ("X-Ok".to_string(), "line\nbreak".to_string()),
            ]),
            remove_headers: vec!["also bad".to_string()],
        };
        let mut headers = HeaderMap::new();
        apply_decision(&mut headers, &decision, &route_header());

        assert_eq!(headers["x-route-target"], "v2");
        assert!(headers.get("x-ok").is_none());
        assert_eq!(headers.len(), 3);
    }
}
