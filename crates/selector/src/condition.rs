//! Rule conditions: conjunctions of predicates over work metadata.
//!
//! A condition is a table of `key = expected` pairs, all of which must hold:
//!
//! ```toml
//! [rules.condition]
//! modern_spa = true                      # boolean equality
//! module = "checkout"                    # exact equality
//! auth_type = ["saml", "kerberos"]       # set membership
//! retries = ">=3"                        # integer threshold
//! expected_duration = ">1h30m"           # duration threshold, in minutes
//! default = true                         # always matches
//! ```
//!
//! A missing metadata key fails its predicate. A malformed threshold fails
//! closed: that predicate is false, the rest of the rule set still runs.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use switchyard_core::WorkMetadata;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdOp {
    Gt,
    Gte,
}

/// The unit a threshold was written in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Number(i64),
    /// A duration, normalized to minutes.
    Minutes(i64),
}

impl Bound {
    fn value(self) -> f64 {
        match self {
            Bound::Number(n) | Bound::Minutes(n) => n as f64,
        }
    }
}

/// A single compiled predicate.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// `default = true`
    Always,
    Equals { key: String, expected: Value },
    OneOf { key: String, allowed: Vec<Value> },
    Bool { key: String, expected: bool },
    Threshold { key: String, op: ThresholdOp, bound: Bound },
    /// Could not be compiled; never matches.
    Malformed { key: String, raw: String },
}

impl Predicate {
    pub fn compile(key: &str, expected: &Value) -> Self {
        let key_owned = key.to_string();
        match expected {
            Value::Bool(true) if key == "default" => Predicate::Always,
            Value::Bool(b) => Predicate::Bool {
                key: key_owned,
                expected: *b,
            },
            Value::Array(items) => Predicate::OneOf {
                key: key_owned,
                allowed: items.clone(),
            },
            Value::String(s) if s.starts_with('>') => match parse_threshold(s) {
                Some((op, bound)) => Predicate::Threshold {
                    key: key_owned,
                    op,
                    bound,
                },
                None => {
                    warn!(key, threshold = %s, "Malformed threshold; predicate will never match");
                    Predicate::Malformed {
                        key: key_owned,
                        raw: s.clone(),
                    }
                }
            },
            Value::String(_) | Value::Number(_) => Predicate::Equals {
                key: key_owned,
                expected: expected.clone(),
            },
            Value::Null | Value::Object(_) => {
                warn!(key, "Unsupported condition value; predicate will never match");
                Predicate::Malformed {
                    key: key_owned,
                    raw: expected.to_string(),
                }
            }
        }
    }

    pub fn evaluate(&self, metadata: &WorkMetadata) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::Malformed { .. } => false,
            Predicate::Bool { key, expected } => {
                metadata.get(key).and_then(Value::as_bool) == Some(*expected)
            }
            Predicate::Equals { key, expected } => match metadata.get(key) {
                Some(Value::Array(items)) => items.iter().any(|v| values_equal(v, expected)),
                Some(actual) => values_equal(actual, expected),
                None => false,
            },
            Predicate::OneOf { key, allowed } => match metadata.get(key) {
                Some(Value::Array(items)) => items
                    .iter()
                    .any(|v| allowed.iter().any(|a| values_equal(v, a))),
                Some(actual) => allowed.iter().any(|a| values_equal(actual, a)),
                None => false,
            },
            Predicate::Threshold { key, op, bound } => {
                let Some(actual) = metadata.get(key) else {
                    return false;
                };
                let Some(actual) = numeric_value(actual) else {
                    debug!(key, value = %actual, "Non-numeric value for threshold predicate");
                    return false;
                };
                match op {
                    ThresholdOp::Gt => actual > bound.value(),
                    ThresholdOp::Gte => actual >= bound.value(),
                }
            }
        }
    }
}

/// A compiled conjunction of predicates.
#[derive(Debug, Clone)]
pub struct Condition {
    predicates: Vec<Predicate>,
}

impl Condition {
    pub fn compile(table: &BTreeMap<String, Value>) -> Self {
        Self {
            predicates: table
                .iter()
                .map(|(k, v)| Predicate::compile(k, v))
                .collect(),
        }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn matches(&self, metadata: &WorkMetadata) -> bool {
        self.predicates.iter().all(|p| p.evaluate(metadata))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Always => f.write_str("always"),
            Predicate::Equals { key, expected } => write!(f, "{key} == {expected}"),
            Predicate::OneOf { key, allowed } => {
                let list: Vec<String> = allowed.iter().map(Value::to_string).collect();
                write!(f, "{key} in [{}]", list.join(", "))
            }
            Predicate::Bool { key, expected } => write!(f, "{key} is {expected}"),
            Predicate::Threshold { key, op, bound } => {
                let op = match op {
                    ThresholdOp::Gt => ">",
                    ThresholdOp::Gte => ">=",
                };
                match bound {
                    Bound::Number(n) => write!(f, "{key} {op} {n}"),
                    Bound::Minutes(m) => write!(f, "{key} {op} {m}m"),
                }
            }
            Predicate::Malformed { key, raw } => write!(f, "{key}: malformed ({raw})"),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.predicates.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(" and "))
    }
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => actual == expected,
    }
}

/// `>=N`, `>N`, `>=30m`, `>1h30m`.
fn parse_threshold(raw: &str) -> Option<(ThresholdOp, Bound)> {
    let (op, rest) = if let Some(rest) = raw.strip_prefix(">=") {
        (ThresholdOp::Gte, rest)
    } else {
        (ThresholdOp::Gt, raw.strip_prefix('>')?)
    };
    let rest = rest.trim();
    if is_duration(rest) {
        Some((op, Bound::Minutes(parse_duration_minutes(rest)?)))
    } else {
        Some((op, Bound::Number(rest.parse().ok()?)))
    }
}

fn is_duration(s: &str) -> bool {
    s.contains('m') || s.contains('h')
}

/// Parse `90m`, `2h`, `1h30m` into minutes.
pub fn parse_duration_minutes(s: &str) -> Option<i64> {
    let mut total: i64 = 0;
    let mut digits = String::new();
    let mut saw_unit = false;

    for c in s.chars() {
        match c {
            '0'..='9' => digits.push(c),
            'h' | 'm' => {
                let n: i64 = digits.parse().ok()?;
                digits.clear();
                total = total.checked_add(if c == 'h' { n.checked_mul(60)? } else { n })?;
                saw_unit = true;
            }
            c if c.is_whitespace() => {}
            _ => return None,
        }
    }

    (saw_unit && digits.is_empty()).then_some(total)
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if is_duration(s) {
                parse_duration_minutes(s).map(|m| m as f64)
            } else {
                s.parse().ok()
            }
        }
        _ => None,
    }
}
