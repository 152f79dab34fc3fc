use std::cmp::Ordering;

use super::error::FilterError;
use super::filter_where::FilterWhere;
use super::matcher::FieldAccess;
use super::types::{FilterOrderInfo, FilterValue, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    pub fn generate(infos: &[FilterOrderInfo]) -> Result<String, FilterError> {
        if infos.is_empty() { return Ok(String::new()); }
        let mut parts = Vec::with_capacity(infos.len());
        for info in infos {
            FilterWhere::validate_column(&info.column)?;
            parts.push(format!("\"{}\" {}", info.column, info.sort.to_sql()));
        }
        Ok(format!("ORDER BY {}", parts.join(", ")))
    }

    /// In-memory equivalent of the rendered ORDER BY. NULLs sort last on ASC, first on DESC
    /// (Postgres default).
    pub fn compare<R: FieldAccess>(infos: &[FilterOrderInfo], a: &R, b: &R) -> Ordering {
        for info in infos {
            let left = a.field(&info.column).unwrap_or(FilterValue::Null);
            let right = b.field(&info.column).unwrap_or(FilterValue::Null);
            let ord = match (left.is_null(), right.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => left.compare(&right).unwrap_or(Ordering::Equal),
            };
            let ord = match info.sort {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}
