//! Condition evaluation.
//!
//! # Responsibilities
//! - Resolve a condition's attribute (header, cookie, path, query) from a view
//! - Apply the condition operator to the resolved value
//! - Combine a rule's conditions with AND semantics
//!
//! # Design Decisions
//! - Header lookup is case-insensitive, path and values are case-sensitive
//! - A missing attribute resolves to `""` for value comparisons, so
//!   `equals ""` matches an absent attribute
//! - Regex search is unanchored; an invalid pattern never matches
//! - Unknown condition types and operators never match
//! - An empty AND never matches

use std::borrow::Cow;

use regex::Regex;

use crate::routing::cookie::parse_cookie_value;
use crate::routing::query::get_query_param;
use crate::routing::types::{Condition, ConditionKind, Operator};
use crate::routing::view::RequestView;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, view: &RequestView<'_>) -> bool;
}

/// Evaluate one condition, compiling any regex pattern for this call only.
pub fn evaluate(condition: &Condition, view: &RequestView<'_>) -> bool {
    ConditionMatcher::new(condition).matches(view)
}

/// Where a condition reads its value from.
#[derive(Debug, Clone)]
enum Attribute {
    Header(String),
    Cookie(String),
    Path,
    Query(String),
    Unknown,
}

impl Attribute {
    fn new(kind: ConditionKind, key: &str) -> Self {
        match kind {
            ConditionKind::Header => Attribute::Header(key.to_string()),
            ConditionKind::Cookie => Attribute::Cookie(key.to_string()),
            ConditionKind::Path => Attribute::Path,
            ConditionKind::Query => Attribute::Query(key.to_string()),
            ConditionKind::Unknown => Attribute::Unknown,
        }
    }

    /// `None` means the attribute does not exist.
    fn resolve<'a>(&self, view: &RequestView<'a>) -> Option<Cow<'a, str>> {
        match self {
            Attribute::Header(name) => view.header(name).map(Cow::Borrowed),
            Attribute::Cookie(name) => view
                .cookie_header()
                .and_then(|header| parse_cookie_value(header, name))
                .map(Cow::Owned),
            Attribute::Path => Some(view.path())
                .filter(|path| !path.is_empty())
                .map(Cow::Borrowed),
            Attribute::Query(key) => get_query_param(view.path(), key).map(Cow::Borrowed),
            Attribute::Unknown => None,
        }
    }
}

/// Operator with its pattern, prepared once.
#[derive(Debug, Clone)]
enum ValueTest {
    Exists,
    Equals(String),
    Contains(String),
    Prefix(String),
    Suffix(String),
    Regex(Option<Regex>),
    Never,
}

impl ValueTest {
    fn new(operator: Operator, pattern: &str) -> Self {
        match operator {
            Operator::Exists => ValueTest::Exists,
            Operator::Equals => ValueTest::Equals(pattern.to_string()),
            Operator::Contains => ValueTest::Contains(pattern.to_string()),
            Operator::Prefix => ValueTest::Prefix(pattern.to_string()),
            Operator::Suffix => ValueTest::Suffix(pattern.to_string()),
            Operator::Regex => ValueTest::Regex(Regex::new(pattern).ok()),
            Operator::Unknown => ValueTest::Never,
        }
    }

    fn test(&self, resolved: Option<&str>) -> bool {
        let exists = resolved.is_some();
        let value = resolved.unwrap_or_default();
        match self {
            ValueTest::Exists => exists,
            ValueTest::Equals(pattern) => value == pattern,
            ValueTest::Contains(pattern) => value.contains(pattern.as_str()),
            ValueTest::Prefix(pattern) => value.starts_with(pattern.as_str()),
            ValueTest::Suffix(pattern) => value.ends_with(pattern.as_str()),
            ValueTest::Regex(Some(re)) => re.is_match(value),
            ValueTest::Regex(None) | ValueTest::Never => false,
        }
    }
}

/// A single compiled condition.
#[derive(Debug, Clone)]
pub struct ConditionMatcher {
    attribute: Attribute,
    test: ValueTest,
}

impl ConditionMatcher {
    pub fn new(condition: &Condition) -> Self {
        Self {
            attribute: Attribute::new(condition.kind, &condition.key),
            test: ValueTest::new(condition.operator, &condition.value),
        }
    }
}

impl Matcher for ConditionMatcher {
    fn matches(&self, view: &RequestView<'_>) -> bool {
        if matches!(self.attribute, Attribute::Unknown) {
            return false;
        }
        let resolved = self.attribute.resolve(view);
        self.test.test(resolved.as_deref())
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }

    /// Compile every condition of a rule.
    pub fn from_conditions(conditions: &[Condition]) -> Self {
        Self::new(
            conditions
                .iter()
                .map(|c| Box::new(ConditionMatcher::new(c)) as Box<dyn Matcher>)
                .collect(),
        )
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, view: &RequestView<'_>) -> bool {
        !self.matchers.is_empty() && self.matchers.iter().all(|m| m.matches(view))
    }
}
