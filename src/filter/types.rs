use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Comparison operators supported at the leaves of a [`Predicate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "$eq")] Eq,
    #[serde(rename = "$gt")] Gt,
    #[serde(rename = "$lt")] Lt,
    /// Case-insensitive substring match (`ILIKE '%value%'`)
    #[serde(rename = "$contains")] Contains,
}

/// Typed value carried by a predicate leaf and bound as a SQL parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl FilterValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FilterValue::Null)
    }

    /// SQL-style comparison: `None` when either side is NULL or the types differ.
    pub fn compare(&self, other: &FilterValue) -> Option<Ordering> {
        match (self, other) {
            (FilterValue::Bool(a), FilterValue::Bool(b)) => Some(a.cmp(b)),
            (FilterValue::Int(a), FilterValue::Int(b)) => Some(a.cmp(b)),
            (FilterValue::Text(a), FilterValue::Text(b)) => Some(a.cmp(b)),
            (FilterValue::Date(a), FilterValue::Date(b)) => Some(a.cmp(b)),
            (FilterValue::Timestamp(a), FilterValue::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self { FilterValue::Bool(v) }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self { FilterValue::Int(v) }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self { FilterValue::Int(v as i64) }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self { FilterValue::Text(v.to_string()) }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self { FilterValue::Text(v) }
}

impl From<NaiveDate> for FilterValue {
    fn from(v: NaiveDate) -> Self { FilterValue::Date(v) }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(v: DateTime<Utc>) -> Self { FilterValue::Timestamp(v) }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FilterValue::Null)
    }
}

/// A single `{column, operator, value}` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterWhereInfo {
    pub column: String,
    pub operator: FilterOp,
    pub data: FilterValue,
}

/// Immutable WHERE tree. Built bottom-up and rendered (or evaluated) once at the end.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare(FilterWhereInfo),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn compare(column: impl Into<String>, operator: FilterOp, data: impl Into<FilterValue>) -> Self {
        Predicate::Compare(FilterWhereInfo { column: column.into(), operator, data: data.into() })
    }

    pub fn eq(column: impl Into<String>, data: impl Into<FilterValue>) -> Self {
        Self::compare(column, FilterOp::Eq, data)
    }

    pub fn gt(column: impl Into<String>, data: impl Into<FilterValue>) -> Self {
        Self::compare(column, FilterOp::Gt, data)
    }

    pub fn lt(column: impl Into<String>, data: impl Into<FilterValue>) -> Self {
        Self::compare(column, FilterOp::Lt, data)
    }

    pub fn contains(column: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::compare(column, FilterOp::Contains, FilterValue::Text(needle.into()))
    }

    /// Conjunction that flattens nested `And` nodes.
    pub fn all(parts: impl IntoIterator<Item = Predicate>) -> Self {
        let mut out = Vec::new();
        for part in parts {
            match part {
                Predicate::And(inner) => out.extend(inner),
                other => out.push(other),
            }
        }
        Predicate::And(out)
    }

    /// Disjunction that flattens nested `Or` nodes.
    pub fn any(parts: impl IntoIterator<Item = Predicate>) -> Self {
        let mut out = Vec::new();
        for part in parts {
            match part {
                Predicate::Or(inner) => out.extend(inner),
                other => out.push(other),
            }
        }
        Predicate::Or(out)
    }

    /// `self AND other`, leaving both operands untouched.
    pub fn and(self, other: Predicate) -> Self {
        Self::all([self, other])
    }

    /// Combine two optional predicates with AND.
    pub fn and_opt(left: Option<Predicate>, right: Option<Predicate>) -> Option<Predicate> {
        match (left, right) {
            (Some(l), Some(r)) => Some(l.and(r)),
            (Some(p), None) | (None, Some(p)) => Some(p),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

impl FilterOrderInfo {
    pub fn new(column: impl Into<String>, sort: SortDirection) -> Self {
        Self { column: column.into(), sort }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<FilterValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_flattens_nested_conjunctions() {
        let p = Predicate::eq("a", 1).and(Predicate::eq("b", 2)).and(Predicate::eq("c", 3));
        match p {
            Predicate::And(parts) => assert_eq!(parts.len(), 3),
            other => panic!("expected And, got {:?}", other),
        }
    }

    #[test]
    fn and_keeps_disjunctions_intact() {
        let search = Predicate::any([Predicate::contains("name", "x"), Predicate::contains("phone", "x")]);
        let p = search.clone().and(Predicate::gt("name", "m"));
        assert_eq!(p, Predicate::And(vec![search, Predicate::gt("name", "m")]));
    }

    #[test]
    fn null_never_compares() {
        assert_eq!(FilterValue::Null.compare(&FilterValue::Null), None);
        assert_eq!(FilterValue::Int(1).compare(&FilterValue::Text("1".into())), None);
        assert_eq!(FilterValue::Int(1).compare(&FilterValue::Int(2)), Some(Ordering::Less));
    }

    #[test]
    fn only_operators_the_queries_build_are_accepted() {
        assert_eq!(serde_json::from_str::<FilterOp>("\"$contains\"").unwrap(), FilterOp::Contains);
        for unsupported in ["\"$neq\"", "\"$gte\"", "\"$lte\""] {
            assert!(serde_json::from_str::<FilterOp>(unsupported).is_err(), "{} should be rejected", unsupported);
        }
    }
}
