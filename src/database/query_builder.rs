use sqlx::{self, postgres::PgArguments, FromRow, PgPool, Row};
use tracing::trace;

use crate::database::manager::DatabaseError;
use crate::filter::{Filter, FilterValue, SqlResult};

/// Executes a [`Filter`] against Postgres, binding its parameters in order.
pub struct QueryBuilder<T> {
    filter: Filter,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    pub fn new(filter: Filter) -> Self {
        Self { filter, _phantom: std::marker::PhantomData }
    }

    pub async fn select_all(&self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let sql_result = self.filter.to_sql()?;
        trace!(query = %sql_result.query, params = sql_result.params.len(), "select");
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let rows = q.fetch_all(pool).await?;
        Ok(rows)
    }

    pub async fn count(&self, pool: &PgPool) -> Result<i64, DatabaseError> {
        let sql_result: SqlResult = self.filter.without_window().to_count_sql()?;
        trace!(query = %sql_result.query, params = sql_result.params.len(), "count");
        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query(q, p);
        }
        let row = q.fetch_one(pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q FilterValue,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        FilterValue::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        FilterValue::Bool(b) => q.bind(*b),
        FilterValue::Int(i) => q.bind(*i),
        FilterValue::Text(s) => q.bind(s.as_str()),
        FilterValue::Date(d) => q.bind(*d),
        FilterValue::Timestamp(t) => q.bind(*t),
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q FilterValue,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match v {
        FilterValue::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        FilterValue::Bool(b) => q.bind(*b),
        FilterValue::Int(i) => q.bind(*i),
        FilterValue::Text(s) => q.bind(s.as_str()),
        FilterValue::Date(d) => q.bind(*d),
        FilterValue::Timestamp(t) => q.bind(*t),
    }
}
