//! Rule evaluation and decision making.
//!
//! # Responsibilities
//! - Store compiled rules in priority order
//! - Find the first rule whose conditions all hold
//! - Produce the default decision when nothing matches
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Stable sort by ascending priority, once, at construction
//! - Regex patterns compiled once per rule set instead of per request
//! - First match wins; no error surface, anomalies degrade to no-match

use std::collections::HashMap;

use crate::routing::matcher::{AndMatcher, Matcher};
use crate::routing::types::{PluginConfig, RoutingDecision, RoutingRule};
use crate::routing::view::RequestView;

#[derive(Debug)]
struct CompiledRule {
    rule: RoutingRule,
    matcher: AndMatcher,
}

/// Evaluates routing rules against request attributes.
#[derive(Debug)]
pub struct Router {
    default_target: String,
    rules: Vec<CompiledRule>,
}

impl Router {
    /// Build a router from a configuration. The configuration is not modified.
    pub fn new(config: &PluginConfig) -> Self {
        let mut rules = config.rules.clone();
        rules.sort_by_key(|rule| rule.priority);

        let rules = rules
            .into_iter()
            .map(|rule| CompiledRule {
                matcher: AndMatcher::from_conditions(&rule.conditions),
                rule,
            })
            .collect();

        Self {
            default_target: config.default_target.clone(),
            rules,
        }
    }

    /// Evaluate a request given as an attribute map (headers plus `:path`).
    pub fn evaluate(&self, attributes: &HashMap<String, String>) -> RoutingDecision {
        self.evaluate_view(&RequestView::new(attributes))
    }

    /// Evaluate a request against the rules in priority order.
    pub fn evaluate_view(&self, view: &RequestView<'_>) -> RoutingDecision {
        self.rules
            .iter()
            .find(|compiled| compiled.matcher.matches(view))
            .map(|compiled| RoutingDecision {
                target: compiled.rule.target.clone(),
                matched_rule: compiled.rule.name.clone(),
                add_headers: compiled.rule.add_headers.clone(),
                remove_headers: compiled.rule.remove_headers.clone(),
            })
            .unwrap_or_else(|| RoutingDecision::fallback(&self.default_target))
    }

    pub fn default_target(&self) -> &str {
        &self.default_target
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> impl Iterator<Item = &RoutingRule> {
        self.rules.iter().map(|compiled| &compiled.rule)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(&PluginConfig::default())
    }
}
