use chrono::NaiveDate;
use tracing::{info, instrument};

use crate::config::PaginationConfig;
use crate::database::models::{Gender, Member, MemberChanges, NewMember, MEMBERS_TABLE, MEMBER_KEYSET};
use crate::database::{DatabaseError, MemberKeyset, MemberStoreHandle};
use crate::filter::{Filter, FilterError, Predicate, SortDirection};
use crate::pagination::{offset_for, KeysetPaginator, KeysetQuery, ListPage, PageInfo};

/// Audit id recorded for writes; requests are not authenticated.
pub const UNAUTHENTICATED_ACTOR: i64 = 0;

#[derive(Debug, thiserror::Error)]
pub enum MemberError {
    #[error("Invalid member ID")]
    InvalidId,
    #[error("Member not found")]
    NotFound,
    #[error("This username is already taken")]
    UsernameTaken,
    #[error("This user is already registered as a member")]
    UserAlreadyRegistered,
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl MemberError {
    /// Store errors that carry a member rule meaning.
    fn from_store(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(_) => MemberError::NotFound,
            DatabaseError::Conflict(ref column) if column == "username" => MemberError::UsernameTaken,
            DatabaseError::Conflict(ref column) if column == "user_id" => MemberError::UserAlreadyRegistered,
            other => MemberError::Database(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveFilter {
    Active,
    Inactive,
    All,
}

/// Validated offset-listing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub page: i64,
    pub limit: i64,
    pub search: Option<String>,
    /// Applied only when both the column and the direction were supplied.
    pub order: Option<(String, SortDirection)>,
    pub active: ActiveFilter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberInput {
    pub user_id: Option<i64>,
    pub name: String,
    pub username: String,
    pub gender: Gender,
    pub birthdate: NaiveDate,
    pub address: String,
    pub phone: String,
    pub photo: Option<String>,
    pub active: bool,
}

/// Replacement values for an update. `None` for `photo` or `active` keeps the stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberUpdate {
    pub user_id: Option<i64>,
    pub name: String,
    pub username: String,
    pub gender: Gender,
    pub birthdate: NaiveDate,
    pub address: String,
    pub phone: String,
    pub photo: Option<Option<String>>,
    pub active: Option<bool>,
}

/// Member business rules on top of an injected store.
#[derive(Clone)]
pub struct MemberService {
    store: MemberStoreHandle,
    pagination: PaginationConfig,
}

impl MemberService {
    pub fn new(store: MemberStoreHandle, pagination: PaginationConfig) -> Self {
        Self { store, pagination }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Member, MemberError> {
        if id <= 0 {
            return Err(MemberError::InvalidId);
        }
        self.store.find_by_id(id).await?.ok_or(MemberError::NotFound)
    }

    /// One page of the offset listing plus totals; rows and count are read concurrently.
    #[instrument(skip(self))]
    pub async fn list(&self, params: &ListParams) -> Result<(Vec<Member>, PageInfo), MemberError> {
        let filter = Self::list_filter(params).map_err(DatabaseError::from)?;
        let (rows, total) = futures::try_join!(self.store.select(&filter), self.store.count(&filter))?;
        Ok((rows, PageInfo::new(params.page, params.limit, total)))
    }

    fn list_filter(params: &ListParams) -> Result<Filter, FilterError> {
        let active = match params.active {
            ActiveFilter::Active => Some(Predicate::eq("active", true)),
            ActiveFilter::Inactive => Some(Predicate::eq("active", false)),
            ActiveFilter::All => None,
        };
        let predicate = Predicate::and_opt(MEMBER_KEYSET.search_predicate(params.search.as_deref()), active);

        let mut filter = Filter::new(MEMBERS_TABLE)?.where_opt(predicate);
        if let Some((column, direction)) = &params.order {
            filter = filter.order(column.as_str(), *direction);
        }
        filter
            .order("id", SortDirection::Desc)
            .limit(params.limit)?
            .offset(
                offset_for(params.page, params.limit)
                    .ok_or_else(|| FilterError::InvalidOffset("Page is too large".to_string()))?,
            )
    }

    /// Keyset page ordered by `name ASC, id DESC`.
    #[instrument(skip(self))]
    pub async fn load_more(&self, query: &KeysetQuery) -> Result<ListPage<Member>, MemberError> {
        let source = MemberKeyset(self.store.clone());
        let paginator = KeysetPaginator::new(source, MEMBER_KEYSET, self.pagination.stale_cursor);
        Ok(paginator.page(query).await?)
    }

    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn create(&self, input: MemberInput) -> Result<Member, MemberError> {
        if self.store.find_by_username(&input.username).await?.is_some() {
            return Err(MemberError::UsernameTaken);
        }
        if let Some(user_id) = input.user_id {
            if self.store.find_by_user_id(user_id).await?.is_some() {
                return Err(MemberError::UserAlreadyRegistered);
            }
        }

        let member = self
            .store
            .insert(NewMember {
                user_id: input.user_id,
                name: input.name,
                username: input.username,
                gender: input.gender,
                birthdate: input.birthdate,
                address: input.address,
                phone: input.phone,
                photo: input.photo,
                active: input.active,
                created_by: UNAUTHENTICATED_ACTOR,
            })
            .await
            .map_err(MemberError::from_store)?;

        info!(id = member.id, "Member created");
        Ok(member)
    }

    #[instrument(skip(self, update), fields(username = %update.username))]
    pub async fn update(&self, id: i64, update: MemberUpdate) -> Result<Member, MemberError> {
        let existing = self.get(id).await?;

        if update.username != existing.username && self.store.find_by_username(&update.username).await?.is_some() {
            return Err(MemberError::UsernameTaken);
        }
        if let Some(user_id) = update.user_id.filter(|uid| Some(*uid) != existing.user_id) {
            if self.store.find_by_user_id(user_id).await?.is_some() {
                return Err(MemberError::UserAlreadyRegistered);
            }
        }

        let changes = MemberChanges {
            user_id: update.user_id,
            name: update.name,
            username: update.username,
            gender: update.gender,
            birthdate: update.birthdate,
            address: update.address,
            phone: update.phone,
            photo: update.photo.unwrap_or(existing.photo),
            active: update.active.unwrap_or(existing.active),
            updated_by: UNAUTHENTICATED_ACTOR,
        };

        let member = self.store.update(id, changes).await.map_err(MemberError::from_store)?;
        info!(id, "Member updated");
        Ok(member)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), MemberError> {
        if id <= 0 {
            return Err(MemberError::InvalidId);
        }
        self.store.delete(id).await.map_err(MemberError::from_store)?;
        info!(id, "Member deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::Cursor;
    use crate::testing::{input, TestContext};
    use pretty_assertions::assert_eq;

    fn params(page: i64, limit: i64) -> ListParams {
        ListParams { page, limit, search: None, order: None, active: ActiveFilter::All }
    }

    fn update_from(member: &Member) -> MemberUpdate {
        MemberUpdate {
            user_id: member.user_id,
            name: member.name.clone(),
            username: member.username.clone(),
            gender: member.gender,
            birthdate: member.birthdate,
            address: member.address.clone(),
            phone: member.phone.clone(),
            photo: None,
            active: None,
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_username_and_user() {
        let ctx = TestContext::new();
        let mut first = input("Ani", "ani");
        first.user_id = Some(5);
        ctx.service.create(first).await.unwrap();

        let err = ctx.service.create(input("Another Ani", "ani")).await.unwrap_err();
        assert!(matches!(err, MemberError::UsernameTaken));

        let mut same_user = input("Budi", "budi");
        same_user.user_id = Some(5);
        let err = ctx.service.create(same_user).await.unwrap_err();
        assert!(matches!(err, MemberError::UserAlreadyRegistered));
    }

    #[tokio::test]
    async fn create_records_unauthenticated_actor() {
        let ctx = TestContext::new();
        let member = ctx.service.create(input("Ani", "ani")).await.unwrap();
        assert_eq!(member.created_by, UNAUTHENTICATED_ACTOR);
        assert_eq!(member.updated_by, None);
    }

    #[tokio::test]
    async fn get_validates_id_and_existence() {
        let ctx = TestContext::new();
        assert!(matches!(ctx.service.get(0).await, Err(MemberError::InvalidId)));
        assert!(matches!(ctx.service.get(9).await, Err(MemberError::NotFound)));
    }

    #[tokio::test]
    async fn update_keeps_photo_and_active_when_absent() {
        let ctx = TestContext::new();
        let mut seed = input("Ani", "ani");
        seed.photo = Some("https://cdn.example/ani.jpg".into());
        seed.active = false;
        let member = ctx.service.create(seed).await.unwrap();

        let mut update = update_from(&member);
        update.name = "Ani Lestari".into();
        let updated = ctx.service.update(member.id, update).await.unwrap();
        assert_eq!(updated.name, "Ani Lestari");
        assert_eq!(updated.photo.as_deref(), Some("https://cdn.example/ani.jpg"));
        assert!(!updated.active);
        assert_eq!(updated.updated_by, Some(UNAUTHENTICATED_ACTOR));

        let mut clear = update_from(&updated);
        clear.photo = Some(None);
        clear.active = Some(true);
        let cleared = ctx.service.update(member.id, clear).await.unwrap();
        assert_eq!(cleared.photo, None);
        assert!(cleared.active);
    }

    #[tokio::test]
    async fn update_allows_own_username_but_not_anothers() {
        let ctx = TestContext::new();
        let ani = ctx.service.create(input("Ani", "ani")).await.unwrap();
        ctx.service.create(input("Budi", "budi")).await.unwrap();

        ctx.service.update(ani.id, update_from(&ani)).await.unwrap();

        let mut steal = update_from(&ani);
        steal.username = "budi".into();
        assert!(matches!(ctx.service.update(ani.id, steal).await, Err(MemberError::UsernameTaken)));
    }

    #[tokio::test]
    async fn update_and_delete_missing_member() {
        let ctx = TestContext::new();
        let ghost = crate::testing::member(77, "Ghost", "ghost");
        assert!(matches!(ctx.service.update(77, update_from(&ghost)).await, Err(MemberError::NotFound)));
        assert!(matches!(ctx.service.delete(77).await, Err(MemberError::NotFound)));
    }

    #[tokio::test]
    async fn list_pages_with_totals() {
        let ctx = TestContext::new();
        ctx.seed_users(15).await;

        let (rows, info) = ctx.service.list(&params(2, 10)).await.unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(info, PageInfo { current_page: 2, total_pages: 2, total_items: 15, items_per_page: 10 });
        // Default order is newest id first.
        assert_eq!(rows.first().map(|m| m.id), Some(5));
    }

    #[tokio::test]
    async fn list_filters_active_and_orders_by_request() {
        let ctx = TestContext::new();
        ctx.seed_users(6).await;
        for id in [2, 4] {
            let m = ctx.service.get(id).await.unwrap();
            let mut u = update_from(&m);
            u.active = Some(false);
            ctx.service.update(id, u).await.unwrap();
        }

        let mut p = params(1, 10);
        p.active = ActiveFilter::Inactive;
        p.order = Some(("name".into(), SortDirection::Asc));
        let (rows, info) = ctx.service.list(&p).await.unwrap();
        assert_eq!(rows.iter().map(|m| m.id).collect::<Vec<_>>(), vec![2, 4]);
        assert_eq!(info.total_items, 2);
    }

    #[tokio::test]
    async fn load_more_walks_in_name_order() {
        let ctx = TestContext::new();
        ctx.seed_users(15).await;

        let first = ctx.service.load_more(&KeysetQuery::new(10).unwrap()).await.unwrap();
        assert_eq!(first.data.last().map(|m| m.name.as_str()), Some("User 4"));
        assert_eq!(first.next_cursor, Some(Cursor::new(4)));

        let second = ctx.service
            .load_more(&KeysetQuery::new(10).unwrap().after(first.next_cursor))
            .await
            .unwrap();
        assert_eq!(second.data.len(), 5);
        assert!(!second.has_more);
    }

    #[tokio::test]
    async fn list_rejects_unaddressable_page() {
        let ctx = TestContext::new();
        let err = ctx.service.list(&params(i64::MAX, 10)).await.unwrap_err();
        assert!(matches!(err, MemberError::Database(DatabaseError::QueryError(_))));
    }

    #[test]
    fn list_filter_appends_id_tie_break() {
        let mut p = params(3, 20);
        p.order = Some(("birthdate".into(), SortDirection::Asc));
        p.search = Some("ani".into());
        let sql = MemberService::list_filter(&p).unwrap().to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"members\" WHERE \"name\" ILIKE $1 OR \"username\" ILIKE $2 OR \"phone\" ILIKE $3 \
             ORDER BY \"birthdate\" ASC, \"id\" DESC LIMIT 20 OFFSET 40"
        );
    }
}
