//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that upstreams are usable HTTP URLs
//! - Flag rules that can never match and targets without an upstream
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Rule anomalies are warnings: the rule loads and simply never matches
//! - A target without an upstream is a warning; its requests answer 502
//! - An empty upstream table means decision-only mode and skips target checks

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::HeaderName;
use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::config::schema::RouterConfig;
use crate::routing::{ConditionKind, Operator, PluginConfig};

/// A problem that makes the configuration unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),

    #[error("invalid route header name '{0}'")]
    InvalidRouteHeader(String),

    #[error("upstream '{target}' has invalid URL '{url}': {reason}")]
    InvalidUpstream {
        target: String,
        url: String,
        reason: String,
    },

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

/// A rule that loads but can never match (or never match as intended).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleWarning {
    #[error("rule '{0}' has no conditions and will never match")]
    NoConditions(String),

    #[error("rule '{rule}' condition #{index} has an unknown type")]
    UnknownConditionType { rule: String, index: usize },

    #[error("rule '{rule}' condition #{index} has an unknown operator")]
    UnknownOperator { rule: String, index: usize },

    #[error("rule '{rule}' condition #{index} has an invalid regex: {reason}")]
    InvalidRegex {
        rule: String,
        index: usize,
        reason: String,
    },

    #[error("rule name '{0}' is used more than once")]
    DuplicateName(String),

    #[error("rule '{0}' has an empty target")]
    EmptyTarget(String),

    #[error("default_target is empty")]
    EmptyDefaultTarget,

    #[error("target '{0}' has no upstream; its requests will fail with 502")]
    MissingUpstream(String),
}

/// Validate the whole configuration.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if HeaderName::try_from(config.route_header.as_ref()).is_err() {
        errors.push(ValidationError::InvalidRouteHeader(
            config.route_header.0.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    for (target, raw) in &config.upstreams {
        if let Err(reason) = check_upstream_url(raw) {
            errors.push(ValidationError::InvalidUpstream {
                target: target.clone(),
                url: raw.clone(),
                reason,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse an upstream base URL. Only `http` with a host is accepted.
pub fn check_upstream_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if url.scheme() != "http" {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(url)
}

/// Rule warnings plus problems that only show up against the upstream table.
pub fn lint_config(config: &RouterConfig) -> Vec<RuleWarning> {
    let mut warnings = Vec::new();

    if config.plugin.default_target.is_empty() {
        warnings.push(RuleWarning::EmptyDefaultTarget);
    }
    warnings.extend(lint_rules(&config.plugin));

    if !config.upstreams.is_empty() {
        let targets = std::iter::once(config.plugin.default_target.as_str())
            .chain(config.plugin.rules.iter().map(|r| r.target.as_str()));

        let mut seen = HashSet::new();
        for target in targets {
            if !target.is_empty()
                && !config.upstreams.contains_key(target)
                && seen.insert(target)
            {
                warnings.push(RuleWarning::MissingUpstream(target.to_string()));
            }
        }
    }

    warnings
}

/// Report rules that will never match or are ambiguous.
pub fn lint_rules(plugin: &PluginConfig) -> Vec<RuleWarning> {
    let mut warnings = Vec::new();
    let mut names = HashSet::new();

    for rule in &plugin.rules {
        if !names.insert(rule.name.as_str()) {
            warnings.push(RuleWarning::DuplicateName(rule.name.clone()));
        }
        if rule.target.is_empty() {
            warnings.push(RuleWarning::EmptyTarget(rule.name.clone()));
        }
        if rule.conditions.is_empty() {
            warnings.push(RuleWarning::NoConditions(rule.name.clone()));
        }

        for (index, condition) in rule.conditions.iter().enumerate() {
            if condition.kind == ConditionKind::Unknown {
                warnings.push(RuleWarning::UnknownConditionType {
                    rule: rule.name.clone(),
                    index,
                });
            }
            match condition.operator {
                Operator::Unknown => warnings.push(RuleWarning::UnknownOperator {
                    rule: rule.name.clone(),
                    index,
                }),
                Operator::Regex => {
                    if let Err(e) = Regex::new(&condition.value) {
                        warnings.push(RuleWarning::InvalidRegex {
                            rule: rule.name.clone(),
                            index,
                            reason: e.to_string(),
                        });
                    }
                }
                _ => {}
            }
        }
    }

    warnings
}
