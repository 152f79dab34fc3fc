use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::{Member, MemberChanges, NewMember};
use crate::database::repository::MemberStore;
use crate::filter::Filter;

/// Process-local member store that evaluates filters in memory.
///
/// Mirrors the Postgres store's unique constraints so services behave the same on both.
#[derive(Debug, Default)]
pub struct MemoryMemberStore {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<Member>,
    last_id: i64,
}

impl MemoryState {
    fn check_unique(&self, id: Option<i64>, username: &str, user_id: Option<i64>) -> Result<(), DatabaseError> {
        let others = self.rows.iter().filter(|m| Some(m.id) != id);
        for other in others {
            if other.username == username {
                return Err(DatabaseError::Conflict("username".to_string()));
            }
            if user_id.is_some() && other.user_id == user_id {
                return Err(DatabaseError::Conflict("user_id".to_string()));
            }
        }
        Ok(())
    }
}

impl MemoryMemberStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemberStore for MemoryMemberStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Member>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.rows.iter().find(|m| m.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Member>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.rows.iter().find(|m| m.username == username).cloned())
    }

    async fn find_by_user_id(&self, user_id: i64) -> Result<Option<Member>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.rows.iter().find(|m| m.user_id == Some(user_id)).cloned())
    }

    async fn select(&self, filter: &Filter) -> Result<Vec<Member>, DatabaseError> {
        let state = self.state.read().await;
        Ok(filter.apply(&state.rows))
    }

    async fn count(&self, filter: &Filter) -> Result<i64, DatabaseError> {
        let state = self.state.read().await;
        Ok(filter.count_matches(&state.rows) as i64)
    }

    async fn insert(&self, member: NewMember) -> Result<Member, DatabaseError> {
        let mut state = self.state.write().await;
        state.check_unique(None, &member.username, member.user_id)?;

        state.last_id += 1;
        let now = Utc::now();
        let row = Member {
            id: state.last_id,
            user_id: member.user_id,
            name: member.name,
            username: member.username,
            gender: member.gender,
            birthdate: member.birthdate,
            address: member.address,
            phone: member.phone,
            photo: member.photo,
            active: member.active,
            created_by: member.created_by,
            created_at: now,
            updated_by: None,
            updated_at: now,
        };
        state.rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: i64, changes: MemberChanges) -> Result<Member, DatabaseError> {
        let mut state = self.state.write().await;
        state.check_unique(Some(id), &changes.username, changes.user_id)?;

        let row = state
            .rows
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| DatabaseError::NotFound(format!("member {}", id)))?;

        row.user_id = changes.user_id;
        row.name = changes.name;
        row.username = changes.username;
        row.gender = changes.gender;
        row.birthdate = changes.birthdate;
        row.address = changes.address;
        row.phone = changes.phone;
        row.photo = changes.photo;
        row.active = changes.active;
        row.updated_by = Some(changes.updated_by);
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let mut state = self.state.write().await;
        let before = state.rows.len();
        state.rows.retain(|m| m.id != id);
        if state.rows.len() == before {
            return Err(DatabaseError::NotFound(format!("member {}", id)));
        }
        Ok(())
    }
}
