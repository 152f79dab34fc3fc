use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::matcher::FieldAccess;
use super::types::{FilterOrderInfo, Predicate, SortDirection, SqlResult};

/// A complete SELECT description for one table: predicate, ordering and window.
///
/// Builder methods consume and return `self`, so a filter is never mutated after
/// it has been handed to a store.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    table_name: String,
    where_data: Option<Predicate>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
        })
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.where_data.as_ref()
    }

    pub fn limit_value(&self) -> Option<i64> {
        self.limit
    }

    /// AND `predicate` onto whatever is already there.
    pub fn where_clause(mut self, predicate: Predicate) -> Self {
        self.where_data = Predicate::and_opt(self.where_data.take(), Some(predicate));
        self
    }

    pub fn where_opt(self, predicate: Option<Predicate>) -> Self {
        match predicate {
            Some(p) => self.where_clause(p),
            None => self,
        }
    }

    pub fn order(mut self, column: impl Into<String>, sort: SortDirection) -> Self {
        self.order_data.push(FilterOrderInfo::new(column, sort));
        self
    }

    pub fn limit(mut self, limit: i64) -> Result<Self, FilterError> {
        if limit < 0 { return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())); }
        self.limit = Some(limit);
        Ok(self)
    }

    pub fn offset(mut self, offset: i64) -> Result<Self, FilterError> {
        if offset < 0 { return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())); }
        self.offset = Some(offset);
        Ok(self)
    }

    /// Same predicate and table, without ordering or window. Used for totals.
    pub fn without_window(&self) -> Self {
        Self {
            table_name: self.table_name.clone(),
            where_data: self.where_data.clone(),
            order_data: vec![],
            limit: None,
            offset: None,
        }
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let order_clause = FilterOrder::generate(&self.order_data)?;
        let limit_clause = self.build_limit_clause();

        let query = [
            "SELECT *".to_string(),
            format!("FROM \"{}\"", self.table_name),
            if where_result.query.is_empty() { String::new() } else { format!("WHERE {}", where_result.query) },
            order_clause,
            limit_clause,
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        Ok(SqlResult { query, params: where_result.params })
    }

    pub fn to_where_sql(&self) -> Result<SqlResult, FilterError> {
        match self.where_data {
            Some(ref predicate) => {
                let (query, params) = FilterWhere::generate(predicate, 0)?;
                Ok(SqlResult { query, params })
            }
            None => Ok(SqlResult { query: String::new(), params: vec![] }),
        }
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let query = if where_result.query.is_empty() {
            format!("SELECT COUNT(*) AS count FROM \"{}\"", self.table_name)
        } else {
            format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", self.table_name, where_result.query)
        };
        Ok(SqlResult { query, params: where_result.params })
    }

    /// Apply the filter to rows already in memory: predicate, ordering, then offset/limit.
    pub fn apply<R: FieldAccess + Clone>(&self, rows: &[R]) -> Vec<R> {
        let mut matched: Vec<R> = rows
            .iter()
            .filter(|row| self.where_data.as_ref().map_or(true, |p| p.matches(*row)))
            .cloned()
            .collect();
        matched.sort_by(|a, b| FilterOrder::compare(&self.order_data, a, b));

        let offset = self.offset.unwrap_or(0).max(0) as usize;
        let iter = matched.into_iter().skip(offset);
        match self.limit {
            Some(limit) => iter.take(limit.max(0) as usize).collect(),
            None => iter.collect(),
        }
    }

    /// Number of rows the predicate selects, ignoring the window.
    pub fn count_matches<R: FieldAccess>(&self, rows: &[R]) -> usize {
        rows.iter()
            .filter(|row| self.where_data.as_ref().map_or(true, |p| p.matches(*row)))
            .count()
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        if name.is_empty() { return Err(FilterError::InvalidTableName("Table name cannot be empty".to_string())); }
        FilterWhere::validate_column(name)
            .map_err(|_| FilterError::InvalidTableName(format!("Invalid table name format: {}", name)))
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::FilterValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_full_select() {
        let filter = Filter::new("members").unwrap()
            .where_clause(Predicate::eq("active", true))
            .order("name", SortDirection::Asc)
            .order("id", SortDirection::Desc)
            .limit(11).unwrap();

        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"members\" WHERE \"active\" = $1 ORDER BY \"name\" ASC, \"id\" DESC LIMIT 11"
        );
        assert_eq!(sql.params, vec![FilterValue::Bool(true)]);
    }

    #[test]
    fn renders_offset_window() {
        let filter = Filter::new("members").unwrap().limit(10).unwrap().offset(20).unwrap();
        assert_eq!(filter.to_sql().unwrap().query, "SELECT * FROM \"members\" LIMIT 10 OFFSET 20");
    }

    #[test]
    fn count_ignores_window_and_order() {
        let filter = Filter::new("members").unwrap()
            .where_clause(Predicate::contains("name", "a"))
            .order("name", SortDirection::Asc)
            .limit(5).unwrap();

        let count = filter.without_window().to_count_sql().unwrap();
        assert_eq!(count.query, "SELECT COUNT(*) AS count FROM \"members\" WHERE \"name\" ILIKE $1");
    }

    #[test]
    fn repeated_where_clauses_are_conjoined() {
        let filter = Filter::new("members").unwrap()
            .where_clause(Predicate::eq("active", true))
            .where_clause(Predicate::gt("id", 3));
        assert_eq!(
            filter.to_where_sql().unwrap().query,
            "\"active\" = $1 AND \"id\" > $2"
        );
    }

    #[test]
    fn rejects_bad_table_and_negative_window() {
        assert!(Filter::new("").is_err());
        assert!(Filter::new("members; drop").is_err());
        assert!(Filter::new("members").unwrap().limit(-1).is_err());
        assert!(Filter::new("members").unwrap().offset(-1).is_err());
    }
}
