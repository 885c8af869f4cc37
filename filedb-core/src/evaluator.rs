//! Predicate evaluation for filtering records.
//!
//! Matching follows the value semantics the store's data model was designed
//! around:
//!
//! - Literal equality is strict: no type coercion, numbers compare by numeric
//!   value, and arrays or objects never compare equal to a filter literal.
//! - Ordering comparisons (`$gt`, `$gte`, `$lt`, `$lte`, and sorting) compare two
//!   strings lexicographically by UTF-16 code unit and coerce anything else to a
//!   number. A comparison
//!   involving a missing field or a non-numeric string is unordered, so every
//!   ordering operator evaluates to `false` for it.
//! - `$regex` tests the stringified field value; a missing field reads as
//!   `"undefined"`.

use std::{borrow::Cow, cmp::Ordering};

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::{
    error::{StoreError, StoreResult},
    query::{Filter, FilterValue, Operator, OperatorSet},
    record::Record,
};

/// Primitive view of a field value used for ordering and stringification.
///
/// Arrays and objects are reduced to their string form first, the way a host
/// runtime converts them before a relational comparison.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Comparable<'a> {
    /// The field is absent from the record.
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Cow<'a, str>),
}

impl<'a> From<&'a Value> for Comparable<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Comparable::Null,
            Value::Bool(value) => Comparable::Bool(*value),
            Value::Number(value) => Comparable::Number(value.as_f64().unwrap_or(f64::NAN)),
            Value::String(value) => Comparable::String(Cow::Borrowed(value)),
            Value::Array(items) => Comparable::String(Cow::Owned(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Null => Cow::Borrowed(""),
                        other => Comparable::from(other).to_display_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(","),
            )),
            Value::Object(_) => Comparable::String(Cow::Borrowed("[object Object]")),
        }
    }
}

impl<'a> From<Option<&'a Value>> for Comparable<'a> {
    fn from(value: Option<&'a Value>) -> Self {
        value
            .map(Comparable::from)
            .unwrap_or(Comparable::Undefined)
    }
}

impl<'a> Comparable<'a> {
    fn to_number(&self) -> f64 {
        match self {
            Comparable::Undefined => f64::NAN,
            Comparable::Null => 0.0,
            Comparable::Bool(value) => f64::from(u8::from(*value)),
            Comparable::Number(value) => *value,
            Comparable::String(value) => parse_number(value),
        }
    }

    /// Relational ordering: string/string is lexicographic, anything else numeric.
    ///
    /// Returns `None` when the operands are unordered (a NaN is involved).
    pub(crate) fn compare(&self, other: &Comparable<'_>) -> Option<Ordering> {
        match (self, other) {
            (Comparable::String(left), Comparable::String(right)) => Some(left.encode_utf16().cmp(right.encode_utf16())),
            _ => self
                .to_number()
                .partial_cmp(&other.to_number()),
        }
    }

    pub(crate) fn to_display_string(&self) -> Cow<'a, str> {
        match self {
            Comparable::Undefined => Cow::Borrowed("undefined"),
            Comparable::Null => Cow::Borrowed("null"),
            Comparable::Bool(true) => Cow::Borrowed("true"),
            Comparable::Bool(false) => Cow::Borrowed("false"),
            Comparable::Number(value) => Cow::Owned(format_number(*value)),
            Comparable::String(value) => value.clone(),
        }
    }
}

fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return 0.0;
    }

    let (sign, unsigned) = match trimmed.as_bytes()[0] {
        b'-' => (-1.0, &trimmed[1..]),
        b'+' => (1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };

    if unsigned.starts_with(['+', '-']) {
        return f64::NAN;
    }

    if unsigned == "Infinity" {
        return sign * f64::INFINITY;
    }

    let radix = match unsigned.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };

    if let Some(radix) = radix {
        // Prefixed literals carry no sign.
        if sign < 0.0 || trimmed.starts_with('+') {
            return f64::NAN;
        }
        let digits = &unsigned[2..];
        if !digits.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return f64::NAN;
        }
        return u64::from_str_radix(digits, radix)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }

    let is_decimal = unsigned
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));

    if !is_decimal {
        return f64::NAN;
    }

    unsigned
        .parse::<f64>()
        .map(|n| sign * n)
        .unwrap_or(f64::NAN)
}

fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let formatted = format!("{value:e}");
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{mantissa}e+{exponent}"),
            _ => formatted,
        };
    }
    if value.fract() == 0.0 {
        return format!("{value:.0}");
    }

    value.to_string()
}

/// Strict, type-sensitive equality between a record field and a filter literal.
///
/// A missing field never equals anything. Arrays and objects never compare equal.
pub(crate) fn strict_equals(field: Option<&Value>, literal: &Value) -> bool {
    match (field, literal) {
        (Some(Value::Null), Value::Null) => true,
        (Some(Value::Bool(left)), Value::Bool(right)) => left == right,
        (Some(Value::Number(left)), Value::Number(right)) => left.as_f64() == right.as_f64(),
        (Some(Value::String(left)), Value::String(right)) => left == right,
        _ => false,
    }
}

/// A single operator check with any regex already compiled.
#[derive(Debug)]
enum Test {
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Value),
    Regex(Regex),
}

impl Test {
    fn passes(&self, field: Option<&Value>) -> bool {
        match self {
            Test::Ne(operand) => !strict_equals(field, operand),
            Test::Gt(operand) => matches!(ordering(field, operand), Some(Ordering::Greater)),
            Test::Gte(operand) => matches!(
                ordering(field, operand),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Test::Lt(operand) => matches!(ordering(field, operand), Some(Ordering::Less)),
            Test::Lte(operand) => matches!(
                ordering(field, operand),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Test::In(operand) => match operand {
                Value::Array(values) => values
                    .iter()
                    .any(|value| strict_equals(field, value)),
                _ => false,
            },
            Test::Regex(regex) => regex.is_match(&Comparable::from(field).to_display_string()),
        }
    }
}

fn ordering(field: Option<&Value>, operand: &Value) -> Option<Ordering> {
    Comparable::from(field).compare(&Comparable::from(operand))
}

fn compile_regex(pattern: &Value, options: Option<&Value>) -> StoreResult<Regex> {
    let source = Comparable::from(pattern).to_display_string();
    let flags = match options {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Cow::Borrowed(""),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Cow::Borrowed(""),
        Some(value) => Comparable::from(value).to_display_string(),
    };

    let mut builder = RegexBuilder::new(&source);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            // Global, sticky and unicode do not change a single match test.
            'g' | 'y' | 'u' => {}
            other => {
                return Err(StoreError::InvalidRegex(format!(
                    "invalid flag '{other}' for pattern /{source}/"
                )));
            }
        }
    }

    builder
        .build()
        .map_err(|err| StoreError::InvalidRegex(err.to_string()))
}

#[derive(Debug)]
enum Clause {
    Literal { field: String, value: Value },
    Operators { field: String, tests: Vec<Test> },
}

/// A filter validated and prepared for repeated evaluation.
///
/// Compiling rejects unsupported operators and invalid regexes up front, so a
/// query either fails as a whole or evaluates every record.
#[derive(Debug)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    /// Validates `filter` and compiles its regexes.
    ///
    /// # Errors
    ///
    /// - [`StoreError::UnsupportedOperator`] for any operator tag outside the recognized set
    /// - [`StoreError::InvalidRegex`] for a `$regex`/`$options` pair that does not compile
    pub fn compile(filter: &Filter) -> StoreResult<Self> {
        let clauses = filter
            .fields()
            .map(|(field, value)| -> StoreResult<Clause> {
                Ok(match value {
                    FilterValue::Literal(value) => Clause::Literal {
                        field: field.to_string(),
                        value: value.clone(),
                    },
                    FilterValue::Operators(set) => Clause::Operators {
                        field: field.to_string(),
                        tests: compile_tests(set)?,
                    },
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Predicate { clauses })
    }

    /// Returns `true` if `record` satisfies every clause.
    pub fn matches(&self, record: &Record) -> bool {
        self.clauses
            .iter()
            .all(|clause| match clause {
                Clause::Literal { field, value } => strict_equals(record.get(field), value),
                Clause::Operators { field, tests } => tests
                    .iter()
                    .all(|test| test.passes(record.get(field))),
            })
    }

    /// Keeps only the records that match, preserving their order.
    pub fn filter_records(&self, records: Vec<Record>) -> Vec<Record> {
        records
            .into_iter()
            .filter(|record| self.matches(record))
            .collect()
    }
}

fn compile_tests(set: &OperatorSet) -> StoreResult<Vec<Test>> {
    set.operators()
        .iter()
        .map(|operator| -> StoreResult<Test> {
            Ok(match operator {
                Operator::Ne(value) => Test::Ne(value.clone()),
                Operator::Gt(value) => Test::Gt(value.clone()),
                Operator::Gte(value) => Test::Gte(value.clone()),
                Operator::Lt(value) => Test::Lt(value.clone()),
                Operator::Lte(value) => Test::Lte(value.clone()),
                Operator::In(value) => Test::In(value.clone()),
                Operator::Regex(pattern) => Test::Regex(compile_regex(pattern, set.regex_options())?),
                Operator::Unsupported(tag) => return Err(StoreError::UnsupportedOperator(tag.clone())),
            })
        })
        .collect()
}

/// Evaluates `filter` against a single record with full operator support.
pub fn matches(record: &Record, filter: &Filter) -> StoreResult<bool> {
    Ok(Predicate::compile(filter)?.matches(record))
}

/// Plain-equality matching, used by `find_one`, the update operations and the
/// delete operations.
///
/// Only literal fields can match here: a field carrying an operator set is
/// compared as a value and therefore never matches, and never errors.
pub fn matches_equality(record: &Record, filter: &Filter) -> bool {
    filter
        .fields()
        .all(|(field, value)| match value {
            FilterValue::Literal(literal) => strict_equals(record.get(field), literal),
            FilterValue::Operators(_) => false,
        })
}

/// Orders two records by `field` using relational comparison.
///
/// Unordered pairs compare as equal.
pub(crate) fn compare_field(left: &Record, right: &Record, field: &str) -> Ordering {
    Comparable::from(left.get(field))
        .compare(&Comparable::from(right.get(field)))
        .unwrap_or(Ordering::Equal)
}
