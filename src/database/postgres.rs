use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{trace, warn};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Member, MemberChanges, NewMember, MEMBERS_TABLE};
use crate::database::query_builder::QueryBuilder;
use crate::database::repository::{conflict_column, MemberStore};
use crate::filter::{Filter, Predicate};

/// Postgres-backed member store.
pub struct PgMemberStore {
    manager: DatabaseManager,
    slow_query_threshold: Duration,
}

impl PgMemberStore {
    pub fn new(manager: DatabaseManager, slow_query_threshold_ms: u64) -> Self {
        Self {
            manager,
            slow_query_threshold: Duration::from_millis(slow_query_threshold_ms),
        }
    }

    fn pool(&self) -> &PgPool {
        self.manager.pool()
    }

    async fn timed<T, F>(&self, operation: &'static str, fut: F) -> Result<T, DatabaseError>
    where
        F: Future<Output = Result<T, DatabaseError>>,
    {
        let started = Instant::now();
        let result = fut.await;
        let elapsed = started.elapsed();
        if elapsed >= self.slow_query_threshold {
            warn!(operation, elapsed_ms = elapsed.as_millis() as u64, "Slow query");
        } else {
            trace!(operation, elapsed_ms = elapsed.as_millis() as u64, "Query finished");
        }
        result
    }

    async fn find_one(&self, operation: &'static str, predicate: Predicate) -> Result<Option<Member>, DatabaseError> {
        let filter = Filter::new(MEMBERS_TABLE)?.where_clause(predicate).limit(1)?;
        let rows = self.timed(operation, QueryBuilder::<Member>::new(filter).select_all(self.pool())).await?;
        Ok(rows.into_iter().next())
    }
}

/// Unique violations become `Conflict`; everything else stays a driver error.
fn map_write_error(err: sqlx::Error) -> DatabaseError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some("23505") {
            let constraint = db.constraint().unwrap_or("unique");
            return DatabaseError::Conflict(conflict_column(constraint).to_string());
        }
    }
    DatabaseError::Sqlx(err)
}

#[async_trait]
impl MemberStore for PgMemberStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.manager.health_check().await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Member>, DatabaseError> {
        self.find_one("find_by_id", Predicate::eq("id", id)).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Member>, DatabaseError> {
        self.find_one("find_by_username", Predicate::eq("username", username)).await
    }

    async fn find_by_user_id(&self, user_id: i64) -> Result<Option<Member>, DatabaseError> {
        self.find_one("find_by_user_id", Predicate::eq("user_id", user_id)).await
    }

    async fn select(&self, filter: &Filter) -> Result<Vec<Member>, DatabaseError> {
        let builder = QueryBuilder::<Member>::new(filter.clone());
        self.timed("select", builder.select_all(self.pool())).await
    }

    async fn count(&self, filter: &Filter) -> Result<i64, DatabaseError> {
        let builder = QueryBuilder::<Member>::new(filter.clone());
        self.timed("count", builder.count(self.pool())).await
    }

    async fn insert(&self, member: NewMember) -> Result<Member, DatabaseError> {
        let query = sqlx::query_as::<_, Member>(
            "INSERT INTO members \
             (user_id, name, username, gender, birthdate, address, phone, photo, active, created_by, updated_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NULL) \
             RETURNING *",
        )
        .bind(member.user_id)
        .bind(member.name)
        .bind(member.username)
        .bind(member.gender)
        .bind(member.birthdate)
        .bind(member.address)
        .bind(member.phone)
        .bind(member.photo)
        .bind(member.active)
        .bind(member.created_by);

        self.timed("insert", async { query.fetch_one(self.pool()).await.map_err(map_write_error) }).await
    }

    async fn update(&self, id: i64, changes: MemberChanges) -> Result<Member, DatabaseError> {
        let query = sqlx::query_as::<_, Member>(
            "UPDATE members SET \
             user_id = $2, name = $3, username = $4, gender = $5, birthdate = $6, address = $7, \
             phone = $8, photo = $9, active = $10, updated_by = $11, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING *",
        )
        .bind(id)
        .bind(changes.user_id)
        .bind(changes.name)
        .bind(changes.username)
        .bind(changes.gender)
        .bind(changes.birthdate)
        .bind(changes.address)
        .bind(changes.phone)
        .bind(changes.photo)
        .bind(changes.active)
        .bind(changes.updated_by);

        let row = self
            .timed("update", async { query.fetch_optional(self.pool()).await.map_err(map_write_error) })
            .await?;
        row.ok_or_else(|| DatabaseError::NotFound(format!("member {}", id)))
    }

    async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let result = self
            .timed("delete", async {
                sqlx::query("DELETE FROM members WHERE id = $1")
                    .bind(id)
                    .execute(self.pool())
                    .await
                    .map_err(DatabaseError::from)
            })
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("member {}", id)));
        }
        Ok(())
    }
}
