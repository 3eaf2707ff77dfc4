//! Rule and decision types.
//!
//! These types double as the configuration schema for the rule set, so they
//! derive Serde traits. Condition type and operator are closed enums; any
//! string that does not name a known variant deserializes into `Unknown`
//! and never matches.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Header added to every default decision to attribute the routing.
pub const ROUTED_BY_HEADER: &str = "X-Routed-By";

/// Header carrying the name of the rule that produced the decision.
pub const ROUTE_REASON_HEADER: &str = "X-Route-Reason";

/// Value of [`ROUTED_BY_HEADER`].
pub const ROUTER_NAME: &str = "smart-router";

/// Route reason reported when no rule matched.
pub const DEFAULT_ROUTE_REASON: &str = "default";

/// Which request attribute a condition inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionKind {
    /// A request header, looked up case-insensitively.
    Header,
    /// A cookie from the `Cookie` header.
    Cookie,
    /// The `:path` pseudo-header, including any query string.
    Path,
    /// A single query-string parameter of `:path`.
    Query,
    #[default]
    #[serde(other)]
    Unknown,
}

/// How a resolved attribute value is compared with the condition value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Equals,
    Contains,
    Prefix,
    Suffix,
    /// Unanchored regex search.
    Regex,
    /// Attribute presence; the condition value is ignored.
    Exists,
    #[default]
    #[serde(other)]
    Unknown,
}

/// A single matching clause of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Condition {
    #[serde(rename = "type", default)]
    pub kind: ConditionKind,

    /// Header name, cookie name or query parameter. Unused for `path`.
    #[serde(default)]
    pub key: String,

    #[serde(default)]
    pub operator: Operator,

    /// Pattern to compare against (ignored for `exists`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
}

impl Condition {
    pub fn new(
        kind: ConditionKind,
        key: impl Into<String>,
        operator: Operator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            key: key.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn header(key: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self::new(ConditionKind::Header, key, operator, value)
    }

    pub fn cookie(key: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self::new(ConditionKind::Cookie, key, operator, value)
    }

    pub fn path(operator: Operator, value: impl Into<String>) -> Self {
        Self::new(ConditionKind::Path, "", operator, value)
    }

    pub fn query(key: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self::new(ConditionKind::Query, key, operator, value)
    }
}

/// A named set of conditions and the routing outcome when all of them hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingRule {
    /// Rule identifier, reported as the matched rule.
    pub name: String,

    /// Evaluation order (lower = first). Ties keep configuration order.
    pub priority: i64,

    /// Conditions that must all hold. An empty list never matches.
    pub conditions: Vec<Condition>,

    /// Backend target selected when the rule matches.
    pub target: String,

    /// Headers to add to the request.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub add_headers: BTreeMap<String, String>,

    /// Headers to remove from the request.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove_headers: Vec<String>,
}

/// The rule set together with its fallback target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Target used when no rule matches.
    pub default_target: String,

    /// Rules in configuration order.
    pub rules: Vec<RoutingRule>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            default_target: "v1".to_string(),
            rules: Vec::new(),
        }
    }
}

impl PluginConfig {
    /// A/B and canary rule set used by the demo deployment.
    ///
    /// iPhone users in Germany carrying the `beta-tester=true` cookie go to
    /// `v2`, as do requests whose `X-Request-Hash` is a single digit (a 10%
    /// canary slice). Everything else stays on `v1`.
    pub fn sample() -> Self {
        Self {
            rules: vec![
                RoutingRule {
                    name: "beta-testers".to_string(),
                    priority: 1,
                    conditions: vec![
                        Condition::header("User-Agent", Operator::Contains, "iPhone"),
                        Condition::header("X-Geo-Country", Operator::Equals, "DE"),
                        Condition::cookie("beta-tester", Operator::Equals, "true"),
                    ],
                    target: "v2".to_string(),
                    add_headers: BTreeMap::from([(
                        ROUTE_REASON_HEADER.to_string(),
                        "beta-tester-match".to_string(),
                    )]),
                    remove_headers: Vec::new(),
                },
                RoutingRule {
                    name: "canary".to_string(),
                    priority: 10,
                    conditions: vec![Condition::header(
                        "X-Request-Hash",
                        Operator::Regex,
                        "^[0-9]$",
                    )],
                    target: "v2".to_string(),
                    add_headers: BTreeMap::from([(
                        ROUTE_REASON_HEADER.to_string(),
                        "canary".to_string(),
                    )]),
                    remove_headers: Vec::new(),
                },
            ],
            ..Self::default()
        }
    }
}

/// Outcome of evaluating a request against the rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingDecision {
    /// Backend target (e.g. "v1" or "v2").
    pub target: String,

    /// Name of the matching rule, empty when the default target was used.
    pub matched_rule: String,

    pub add_headers: BTreeMap<String, String>,

    pub remove_headers: Vec<String>,
}

impl RoutingDecision {
    /// Decision for a request that matched no rule.
    pub fn fallback(default_target: &str) -> Self {
        Self {
            target: default_target.to_string(),
            matched_rule: String::new(),
            add_headers: BTreeMap::from([
                (ROUTED_BY_HEADER.to_string(), ROUTER_NAME.to_string()),
                (ROUTE_REASON_HEADER.to_string(), DEFAULT_ROUTE_REASON.to_string()),
            ]),
            remove_headers: Vec::new(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.matched_rule.is_empty()
    }

    /// Matched rule name, or `"default"`.
    pub fn route_reason(&self) -> &str {
        if self.is_default() {
            DEFAULT_ROUTE_REASON
        } else {
            &self.matched_rule
        }
    }
}
