use std::sync::Arc;

use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::models::{Member, MemberChanges, NewMember};
use crate::filter::Filter;
use crate::pagination::{Cursor, KeysetSource};

/// Storage contract for members.
///
/// `update` and `delete` report a missing row as [`DatabaseError::NotFound`]; unique
/// violations on `username` or `user_id` surface as [`DatabaseError::Conflict`] naming
/// the column.
#[async_trait]
pub trait MemberStore: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Member>, DatabaseError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Member>, DatabaseError>;

    async fn find_by_user_id(&self, user_id: i64) -> Result<Option<Member>, DatabaseError>;

    /// Rows selected by the filter, including its ordering and window.
    async fn select(&self, filter: &Filter) -> Result<Vec<Member>, DatabaseError>;

    /// Rows matching the filter's predicate; ordering and window are ignored.
    async fn count(&self, filter: &Filter) -> Result<i64, DatabaseError>;

    async fn insert(&self, member: NewMember) -> Result<Member, DatabaseError>;

    async fn update(&self, id: i64, changes: MemberChanges) -> Result<Member, DatabaseError>;

    async fn delete(&self, id: i64) -> Result<(), DatabaseError>;
}

pub type MemberStoreHandle = Arc<dyn MemberStore>;

/// Keyset view over a member store: cursors resolve to member ids.
#[derive(Clone)]
pub struct MemberKeyset(pub MemberStoreHandle);

#[async_trait]
impl KeysetSource for MemberKeyset {
    type Row = Member;

    async fn find_anchor(&self, cursor: Cursor) -> Result<Option<Member>, DatabaseError> {
        self.0.find_by_id(cursor.id()).await
    }

    async fn fetch(&self, filter: Filter) -> Result<Vec<Member>, DatabaseError> {
        self.0.select(&filter).await
    }
}

/// Column named by a unique-violation constraint, e.g. `members_username_key` -> `username`.
pub(crate) fn conflict_column(constraint: &str) -> &str {
    ["user_id", "username"]
        .into_iter()
        .find(|column| constraint.contains(column))
        .unwrap_or(constraint)
}
