//! Declarative rule evaluation.
//!
//! Rules are authored by operators in the routing document and evaluated
//! against an [`AlertContext`]. Evaluation is total: an absent field, an
//! empty value list, or an invalid regex all evaluate to `false`. A rule can
//! suppress delivery, so a bad rule must never take delivery down with it.

use alertbot_ingest::AlertContext;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The closed set of rule operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOp {
    /// The bound value equals the first expected value.
    Eq,
    /// The bound value contains the first expected value as a substring.
    Contains,
    /// The bound value contains any expected value as a substring.
    ContainsAny,
    /// The bound value matches the expected pattern (unanchored search).
    Regex,
    /// The bound value string-equals any expected value.
    In,
    /// The bound value starts with any expected value.
    PrefixIn,
}

impl RuleOp {
    /// Returns the operator name as written in the routing document.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Contains => "contains",
            Self::ContainsAny => "contains_any",
            Self::Regex => "regex",
            Self::In => "in",
            Self::PrefixIn => "prefix_in",
        }
    }

    /// Returns true if this operator requires a list-typed value.
    #[must_use]
    pub const fn requires_list(&self) -> bool {
        matches!(self, Self::ContainsAny | Self::In | Self::PrefixIn)
    }
}

/// A YAML scalar appearing in a rule value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// A string literal.
    Text(String),
    /// An integer, e.g. a status code written unquoted.
    Int(i64),
    /// A float.
    Float(f64),
    /// A boolean.
    Bool(bool),
}

impl Scalar {
    /// Renders the scalar the way it is compared: as a string.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

/// The `value` of a rule: absent, a single scalar, or a list of scalars.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    /// No value given.
    #[default]
    Absent,
    /// A single scalar value.
    Single(Scalar),
    /// A list of scalar values.
    List(Vec<Scalar>),
}

impl RuleValue {
    /// Flattens the value into the list of strings evaluation works on.
    #[must_use]
    pub fn as_list(&self) -> Vec<String> {
        match self {
            Self::Absent => Vec::new(),
            Self::Single(scalar) => vec![scalar.render()],
            Self::List(scalars) => scalars.iter().map(Scalar::render).collect(),
        }
    }

    /// Returns true if the value is list-typed.
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }
}

/// One predicate: a context field, an operator, and an expected value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleMatch {
    /// Canonical context field name (`title`, `message`, `status`, ...).
    pub field: String,
    /// Operator to apply.
    pub op: RuleOp,
    /// Expected value(s).
    #[serde(default)]
    pub value: RuleValue,
}

/// A rule entry as written in the routing document. The predicate may be
/// wrapped in a `match` key or written flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleEntry {
    /// `{ match: { field, op, value } }`
    Wrapped {
        /// The wrapped predicate.
        r#match: RuleMatch,
    },
    /// `{ field, op, value }`
    Flat(RuleMatch),
}

impl RuleEntry {
    /// Returns the predicate regardless of the written shape.
    #[must_use]
    pub const fn matcher(&self) -> &RuleMatch {
        match self {
            Self::Wrapped { r#match } => r#match,
            Self::Flat(rule) => rule,
        }
    }
}

/// Evaluates one rule against the context.
///
/// Returns `false` when the field is absent (regardless of operator), when a
/// non-`eq` operator has no expected values, or when a regex pattern fails to
/// compile. Never panics.
#[must_use]
pub fn rule_matches(rule: &RuleMatch, ctx: &AlertContext) -> bool {
    if rule.field.is_empty() {
        return false;
    }
    let Some(actual) = ctx.field(&rule.field) else {
        return false;
    };

    let expected = rule.value.as_list();
    if expected.is_empty() && rule.op != RuleOp::Eq {
        return false;
    }

    match rule.op {
        RuleOp::Eq => expected.first().is_some_and(|needle| actual == needle),
        RuleOp::Contains => expected
            .first()
            .is_some_and(|needle| actual.contains(needle.as_str())),
        RuleOp::ContainsAny => expected.iter().any(|needle| actual.contains(needle.as_str())),
        RuleOp::Regex => expected.first().is_some_and(|pattern| {
            Regex::new(pattern).map(|re| re.is_match(actual)).unwrap_or(false)
        }),
        RuleOp::In => expected.iter().any(|candidate| actual == candidate),
        RuleOp::PrefixIn => expected
            .iter()
            .any(|prefix| actual.starts_with(prefix.as_str())),
    }
}
