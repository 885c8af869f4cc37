//! Filter, operator and sort types.
//!
//! A [`Filter`] is a conjunction over the fields it names. Each field carries a
//! [`FilterValue`]: either a literal compared by strict equality, or an
//! [`OperatorSet`] whose operators must all pass. The distinction is made once,
//! when the filter is built, and never re-inspected during matching.
//!
//! # Building filters
//!
//! ```ignore
//! use filedb::query::{Filter, OperatorSet};
//!
//! let adults = Filter::new()
//!     .eq("status", "active")
//!     .field("age", OperatorSet::new().gte(18).lt(65));
//!
//! // or, from a JSON filter document
//! let same = Filter::from_json(serde_json::json!({
//!     "status": "active",
//!     "age": { "$gte": 18, "$lt": 65 },
//! }))?;
//! ```
//!
//! # Operators
//!
//! `$ne`, `$gt`, `$gte`, `$lt`, `$lte`, `$in` and `$regex` (with its `$options`
//! modifier). Any other tag, `$eq` included, is kept as
//! [`Operator::Unsupported`] and rejected when the filter is compiled for a query.
//!
//! An array-valued field in a JSON filter document is read as an operator set
//! keyed by element index, so `{"tags": ["a"]}` carries the unsupported operator
//! `0` and fails a query, while `{"tags": []}` places no constraint on `tags`.

use serde_json::{Map, Value};

use crate::{
    error::{StoreError, StoreResult},
    record::kind_of,
};

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (`1`).
    Asc,
    /// Descending order (`-1`).
    Desc,
}

impl SortDirection {
    /// Parses a numeric direction: positive is ascending, negative is descending.
    pub fn from_json(value: &Value) -> StoreResult<Self> {
        match value.as_f64() {
            Some(n) if n > 0.0 => Ok(SortDirection::Asc),
            Some(n) if n < 0.0 => Ok(SortDirection::Desc),
            _ => Err(StoreError::InvalidFilter(format!(
                "sort direction must be 1 or -1, found {value}"
            ))),
        }
    }
}

/// A single sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

/// An ordered list of sort keys.
///
/// Only the first key is honored when a query runs; further keys are accepted and
/// carried along but never used as tie-breakers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortSpec {
    keys: Vec<Sort>,
}

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sort key.
    pub fn then(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.keys.push(Sort { field: field.into(), direction });
        self
    }

    /// The key a query actually sorts by.
    pub fn primary(&self) -> Option<&Sort> {
        self.keys.first()
    }

    pub fn keys(&self) -> &[Sort] {
        &self.keys
    }

    /// Parses a sort document such as `{"age": 1, "name": -1}`.
    pub fn from_json(value: Value) -> StoreResult<Self> {
        match value {
            Value::Object(map) => {
                let mut spec = SortSpec::new();
                for (field, direction) in map {
                    let direction = SortDirection::from_json(&direction)?;
                    spec = spec.then(field, direction);
                }
                Ok(spec)
            }
            other => Err(StoreError::InvalidFilter(format!(
                "sort specification must be an object, found {}",
                kind_of(&other)
            ))),
        }
    }
}

impl From<Sort> for SortSpec {
    fn from(sort: Sort) -> Self {
        SortSpec { keys: vec![sort] }
    }
}

impl<S: Into<String>> From<(S, SortDirection)> for SortSpec {
    fn from((field, direction): (S, SortDirection)) -> Self {
        SortSpec::new().then(field, direction)
    }
}

/// A single comparison directive applied to one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    /// `$ne`: strict inequality.
    Ne(Value),
    /// `$gt`: greater than.
    Gt(Value),
    /// `$gte`: greater than or equal to.
    Gte(Value),
    /// `$lt`: less than.
    Lt(Value),
    /// `$lte`: less than or equal to.
    Lte(Value),
    /// `$in`: membership in an array operand. A non-array operand never matches.
    In(Value),
    /// `$regex`: pattern test against the stringified field value.
    Regex(Value),
    /// Any tag outside the recognized set.
    Unsupported(String),
}

impl Operator {
    /// The operator's tag as it appears in a filter document.
    pub fn tag(&self) -> &str {
        match self {
            Operator::Ne(_) => "$ne",
            Operator::Gt(_) => "$gt",
            Operator::Gte(_) => "$gte",
            Operator::Lt(_) => "$lt",
            Operator::Lte(_) => "$lte",
            Operator::In(_) => "$in",
            Operator::Regex(_) => "$regex",
            Operator::Unsupported(tag) => tag,
        }
    }

    fn parse(tag: String, operand: Value) -> Self {
        match tag.as_str() {
            "$ne" => Operator::Ne(operand),
            "$gt" => Operator::Gt(operand),
            "$gte" => Operator::Gte(operand),
            "$lt" => Operator::Lt(operand),
            "$lte" => Operator::Lte(operand),
            "$in" => Operator::In(operand),
            "$regex" => Operator::Regex(operand),
            _ => Operator::Unsupported(tag),
        }
    }
}

/// The operators applied to one field, ANDed together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorSet {
    operators: Vec<Operator>,
    options: Option<Value>,
}

impl OperatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ne(self, value: impl Into<Value>) -> Self {
        self.with(Operator::Ne(value.into()))
    }

    pub fn gt(self, value: impl Into<Value>) -> Self {
        self.with(Operator::Gt(value.into()))
    }

    pub fn gte(self, value: impl Into<Value>) -> Self {
        self.with(Operator::Gte(value.into()))
    }

    pub fn lt(self, value: impl Into<Value>) -> Self {
        self.with(Operator::Lt(value.into()))
    }

    pub fn lte(self, value: impl Into<Value>) -> Self {
        self.with(Operator::Lte(value.into()))
    }

    /// `$in`: the field must strictly equal one of `values`.
    pub fn any_of<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Self {
        self.with(Operator::In(Value::Array(
            values
                .into_iter()
                .map(Into::into)
                .collect(),
        )))
    }

    pub fn regex(self, pattern: impl Into<String>) -> Self {
        self.with(Operator::Regex(Value::String(pattern.into())))
    }

    /// Regex flags for `$regex`, e.g. `"i"`.
    pub fn options(mut self, flags: impl Into<String>) -> Self {
        self.options = Some(Value::String(flags.into()));
        self
    }

    /// Adds an operator. A later operator with the same tag replaces the earlier one.
    pub fn with(mut self, operator: Operator) -> Self {
        match self.operators.iter_mut().find(|op| op.tag() == operator.tag()) {
            Some(existing) => *existing = operator,
            None => self.operators.push(operator),
        }
        self
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    /// The raw `$options` operand, if one was given.
    pub fn regex_options(&self) -> Option<&Value> {
        self.options.as_ref()
    }

    fn from_map(map: Map<String, Value>) -> Self {
        let mut set = OperatorSet::new();
        for (tag, operand) in map {
            if tag == "$options" {
                set.options = Some(operand);
            } else {
                set = set.with(Operator::parse(tag, operand));
            }
        }
        set
    }

    fn from_array(items: Vec<Value>) -> Self {
        items
            .into_iter()
            .enumerate()
            .fold(OperatorSet::new(), |set, (index, operand)| {
                set.with(Operator::parse(index.to_string(), operand))
            })
    }
}

/// What a filter requires of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Strict equality against this value.
    Literal(Value),
    /// Every operator in the set must pass.
    Operators(OperatorSet),
}

impl From<Value> for FilterValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => FilterValue::Operators(OperatorSet::from_map(map)),
            Value::Array(items) => FilterValue::Operators(OperatorSet::from_array(items)),
            literal => FilterValue::Literal(literal),
        }
    }
}

impl From<OperatorSet> for FilterValue {
    fn from(set: OperatorSet) -> Self {
        FilterValue::Operators(set)
    }
}

/// A conjunctive predicate over record fields.
///
/// Fields the filter does not mention are unconstrained; an empty filter matches
/// every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    fields: Vec<(String, FilterValue)>,
}

impl Filter {
    /// Creates an empty filter, which matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `field` to strictly equal `value`.
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field.into(), FilterValue::Literal(value.into()))
    }

    /// Applies an operator set to `field`.
    pub fn field(self, field: impl Into<String>, operators: OperatorSet) -> Self {
        self.set(field.into(), FilterValue::Operators(operators))
    }

    /// Parses a JSON filter document. Object- and array-valued fields become
    /// operator sets.
    pub fn from_json(value: Value) -> StoreResult<Self> {
        match value {
            Value::Object(map) => Ok(Filter::from(map)),
            Value::Null => Ok(Filter::new()),
            other => Err(StoreError::InvalidFilter(format!(
                "filter must be an object, found {}",
                kind_of(&other)
            ))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.fields
            .iter()
            .map(|(field, value)| (field.as_str(), value))
    }

    fn set(mut self, field: String, value: FilterValue) -> Self {
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((field, value)),
        }
        self
    }
}

impl From<Map<String, Value>> for Filter {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter()
            .fold(Filter::new(), |filter, (field, value)| {
                filter.set(field, FilterValue::from(value))
            })
    }
}

impl TryFrom<Value> for Filter {
    type Error = StoreError;

    fn try_from(value: Value) -> StoreResult<Self> {
        Filter::from_json(value)
    }
}

/// Conversion into a [`Filter`], accepted wherever an operation takes a filter.
///
/// Implemented for [`Filter`] itself, for JSON filter documents and for records.
pub trait IntoFilter {
    fn into_filter(self) -> StoreResult<Filter>;
}

impl IntoFilter for Filter {
    fn into_filter(self) -> StoreResult<Filter> {
        Ok(self)
    }
}

impl IntoFilter for Value {
    fn into_filter(self) -> StoreResult<Filter> {
        Filter::from_json(self)
    }
}

impl IntoFilter for Map<String, Value> {
    fn into_filter(self) -> StoreResult<Filter> {
        Ok(Filter::from(self))
    }
}

/// The transient plan a query executes: filter, then sort, then skip and limit.
#[derive(Debug, Clone, Default)]
pub struct QueryPlan {
    /// Records must match this filter.
    pub filter: Filter,
    /// Optional sort; only its primary key is used.
    pub sort: Option<SortSpec>,
    /// Number of matched and sorted records to drop from the front.
    pub skip: usize,
    /// Maximum number of records returned after skipping. `None` is unbounded.
    pub limit: Option<usize>,
}

impl QueryPlan {
    pub fn new(filter: Filter) -> Self {
        QueryPlan { filter, ..Default::default() }
    }
}
