use super::error::FilterError;
use super::types::{FilterOp, FilterValue, FilterWhereInfo, Predicate};

/// Renders a [`Predicate`] tree into a parameterised Postgres WHERE body.
pub struct FilterWhere {
    param_values: Vec<FilterValue>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Render `predicate`, numbering placeholders after `starting_param_index`.
    pub fn generate(predicate: &Predicate, starting_param_index: usize) -> Result<(String, Vec<FilterValue>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        let sql = filter_where.build(predicate)?;
        Ok((sql, filter_where.param_values))
    }

    pub fn validate_column(column: &str) -> Result<(), FilterError> {
        let mut chars = column.chars();
        let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(FilterError::InvalidColumn(column.to_string()));
        }
        Ok(())
    }

    fn build(&mut self, predicate: &Predicate) -> Result<String, FilterError> {
        match predicate {
            Predicate::Compare(info) => self.build_sql_condition(info),
            Predicate::And(parts) => self.build_group(parts, " AND ", "1=1"),
            Predicate::Or(parts) => self.build_group(parts, " OR ", "1=0"),
        }
    }

    fn build_group(&mut self, parts: &[Predicate], joiner: &str, empty: &str) -> Result<String, FilterError> {
        if parts.is_empty() {
            return Ok(empty.to_string());
        }
        if parts.len() == 1 {
            return self.build(&parts[0]);
        }
        let mut sql_parts = Vec::with_capacity(parts.len());
        for part in parts {
            let sql = self.build(part)?;
            // Leaves never need wrapping; nested groups always do
            if matches!(part, Predicate::Compare(_)) {
                sql_parts.push(sql);
            } else {
                sql_parts.push(format!("({})", sql));
            }
        }
        Ok(sql_parts.join(joiner))
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        Self::validate_column(&condition.column)?;
        let quoted_column = format!("\"{}\"", condition.column);

        let sql = match condition.operator {
            FilterOp::Eq if condition.data.is_null() => format!("{} IS NULL", quoted_column),
            FilterOp::Eq => format!("{} = {}", quoted_column, self.param(condition.data.clone())),
            FilterOp::Gt => format!("{} > {}", quoted_column, self.param(condition.data.clone())),
            FilterOp::Lt => format!("{} < {}", quoted_column, self.param(condition.data.clone())),
            FilterOp::Contains => {
                let needle = match &condition.data {
                    FilterValue::Text(s) => s.clone(),
                    FilterValue::Null => return Ok("1=0".to_string()),
                    other => format!("{:?}", other),
                };
                let pattern = format!("%{}%", escape_like(&needle));
                format!("{} ILIKE {}", quoted_column, self.param(FilterValue::Text(pattern)))
            }
        };
        Ok(sql)
    }

    fn param(&mut self, value: FilterValue) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

/// Escape LIKE metacharacters so user input only ever matches literally.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
