use std::cmp::Ordering;

use super::types::{FilterOp, FilterValue, FilterWhereInfo, Predicate};

/// Column access for rows that can be filtered and sorted without a database.
pub trait FieldAccess {
    /// Value of `column`, or `None` when the row has no such column.
    fn field(&self, column: &str) -> Option<FilterValue>;
}

impl Predicate {
    /// Evaluate the tree against a row with the same semantics the rendered SQL has:
    /// comparisons against NULL are false, `Contains` is case-insensitive.
    pub fn matches<R: FieldAccess + ?Sized>(&self, row: &R) -> bool {
        match self {
            Predicate::Compare(info) => compare_leaf(info, row),
            Predicate::And(parts) => parts.iter().all(|p| p.matches(row)),
            Predicate::Or(parts) => parts.iter().any(|p| p.matches(row)),
        }
    }
}

fn compare_leaf<R: FieldAccess + ?Sized>(info: &FilterWhereInfo, row: &R) -> bool {
    let Some(value) = row.field(&info.column) else {
        return false;
    };

    match info.operator {
        FilterOp::Eq if info.data.is_null() => value.is_null(),
        FilterOp::Contains => match (&value, &info.data) {
            (FilterValue::Text(haystack), FilterValue::Text(needle)) => {
                haystack.to_lowercase().contains(&needle.to_lowercase())
            }
            _ => false,
        },
        op => match value.compare(&info.data) {
            Some(ord) => match op {
                FilterOp::Eq => ord == Ordering::Equal,
                FilterOp::Gt => ord == Ordering::Greater,
                FilterOp::Lt => ord == Ordering::Less,
                FilterOp::Contains => false,
            },
            None => false,
        },
    }
}
