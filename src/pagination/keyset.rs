use crate::filter::{FieldAccess, Filter, FilterError, FilterValue, Predicate, SortDirection};

use super::cursor::Cursor;

/// Rows that can be paged with a keyset cursor.
pub trait KeysetRow: FieldAccess {
    fn cursor(&self) -> Cursor;
}

/// Describes one keyset ordering: `sort_column ASC, tie_break_column DESC`.
///
/// The tie-break column must be unique so the order is total; `search_columns` are the
/// text columns a `search` term is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeysetSpec {
    pub table: &'static str,
    pub sort_column: &'static str,
    pub tie_break_column: &'static str,
    pub search_columns: &'static [&'static str],
}

/// Validated input for one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeysetQuery {
    limit: i64,
    cursor: Option<Cursor>,
    search: Option<String>,
}

impl KeysetQuery {
    pub fn new(limit: i64) -> Result<Self, FilterError> {
        if limit < 1 {
            return Err(FilterError::InvalidLimit("Limit must be at least 1".to_string()));
        }
        // One extra row is read past the limit.
        if limit.checked_add(1).is_none() {
            return Err(FilterError::InvalidLimit("Limit is too large".to_string()));
        }
        Ok(Self { limit, cursor: None, search: None })
    }

    pub fn after(mut self, cursor: Option<Cursor>) -> Self {
        self.cursor = cursor;
        self
    }

    /// Blank terms are treated as absent.
    pub fn search(mut self, search: Option<&str>) -> Self {
        self.search = search.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        self
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref()
    }
}

impl KeysetSpec {
    /// `col1 ILIKE %term% OR col2 ILIKE %term% ...`
    pub fn search_predicate(&self, term: Option<&str>) -> Option<Predicate> {
        let term = term?;
        if self.search_columns.is_empty() {
            return None;
        }
        Some(Predicate::any(
            self.search_columns.iter().map(|column| Predicate::contains(*column, term)),
        ))
    }

    /// Rows strictly after `anchor` in `(sort ASC, tie_break DESC)` order:
    /// `sort > a.sort OR (sort = a.sort AND tie_break < a.tie_break)`.
    pub fn after_predicate<R: KeysetRow>(&self, anchor: &R) -> Predicate {
        let sort_value = anchor.field(self.sort_column).unwrap_or(FilterValue::Null);
        let tie_value = anchor
            .field(self.tie_break_column)
            .unwrap_or_else(|| FilterValue::Int(anchor.cursor().id()));

        Predicate::any([
            Predicate::gt(self.sort_column, sort_value.clone()),
            Predicate::all([
                Predicate::eq(self.sort_column, sort_value),
                Predicate::lt(self.tie_break_column, tie_value),
            ]),
        ])
    }

    /// Full SELECT for one page: fetches `limit + 1` rows so overflow can be detected
    /// without a COUNT.
    pub fn filter<R: KeysetRow>(&self, query: &KeysetQuery, anchor: Option<&R>) -> Result<Filter, FilterError> {
        let predicate = Predicate::and_opt(
            self.search_predicate(query.search_term()),
            anchor.map(|row| self.after_predicate(row)),
        );

        Filter::new(self.table)?
            .where_opt(predicate)
            .order(self.sort_column, SortDirection::Asc)
            .order(self.tie_break_column, SortDirection::Desc)
            .limit(Self::overfetch_limit(query.limit())?)
    }

    fn overfetch_limit(limit: i64) -> Result<i64, FilterError> {
        limit
            .checked_add(1)
            .ok_or_else(|| FilterError::InvalidLimit("Limit is too large".to_string()))
    }
}
