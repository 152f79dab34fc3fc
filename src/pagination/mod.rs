//! Keyset ("load more") and offset pagination.
//!
//! A keyset page is one `limit + 1` read ordered by `(sort ASC, tie_break DESC)`; the
//! cursor names the last row a client saw and is resolved back to that row's sort key
//! before the next read. Pages are not a snapshot: writes between two fetches can
//! shift rows across the page boundary.

pub mod cursor;
pub mod keyset;
pub mod offset;
pub mod page;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::database::DatabaseError;
use crate::filter::Filter;

pub use cursor::{Cursor, CursorError};
pub use keyset::{KeysetQuery, KeysetRow, KeysetSpec};
pub use offset::{offset_for, PageInfo};
pub use page::{KeysetMeta, ListPage};

/// What to do when a cursor names a row that no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleCursorPolicy {
    /// Report an empty, final page.
    EndOfList,
    /// Ignore the cursor and serve the first page again.
    Restart,
}

impl FromStr for StaleCursorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "end" | "end_of_list" => Ok(Self::EndOfList),
            "restart" => Ok(Self::Restart),
            other => Err(format!("Unknown stale cursor policy: {}", other)),
        }
    }
}

impl fmt::Display for StaleCursorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfList => write!(f, "end"),
            Self::Restart => write!(f, "restart"),
        }
    }
}

/// Storage seam for keyset pagination.
#[async_trait]
pub trait KeysetSource: Send + Sync {
    type Row: KeysetRow + Send;

    /// Row the cursor points at, if it still exists.
    async fn find_anchor(&self, cursor: Cursor) -> Result<Option<Self::Row>, DatabaseError>;

    async fn fetch(&self, filter: Filter) -> Result<Vec<Self::Row>, DatabaseError>;
}

/// Serves keyset pages from an injected source.
pub struct KeysetPaginator<S> {
    source: S,
    spec: KeysetSpec,
    stale_cursor: StaleCursorPolicy,
}

impl<S: KeysetSource> KeysetPaginator<S> {
    pub fn new(source: S, spec: KeysetSpec, stale_cursor: StaleCursorPolicy) -> Self {
        Self { source, spec, stale_cursor }
    }

    pub async fn page(&self, query: &KeysetQuery) -> Result<ListPage<S::Row>, DatabaseError> {
        let anchor = match query.cursor() {
            Some(cursor) => match self.source.find_anchor(cursor).await? {
                Some(row) => Some(row),
                None => match self.stale_cursor {
                    StaleCursorPolicy::EndOfList => {
                        debug!(table = self.spec.table, %cursor, "Stale cursor; returning end of list");
                        return Ok(ListPage::empty());
                    }
                    StaleCursorPolicy::Restart => {
                        debug!(table = self.spec.table, %cursor, "Stale cursor; restarting from first page");
                        None
                    }
                },
            },
            None => None,
        };

        let filter = self.spec.filter(query, anchor.as_ref())?;
        let rows = self.source.fetch(filter).await?;
        Ok(ListPage::from_overfetch(rows, query.limit()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FieldAccess, FilterValue};
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: i64,
        name: String,
        phone: String,
    }

    impl FieldAccess for Row {
        fn field(&self, column: &str) -> Option<FilterValue> {
            match column {
                "id" => Some(FilterValue::Int(self.id)),
                "name" => Some(FilterValue::from(self.name.as_str())),
                "phone" => Some(FilterValue::from(self.phone.as_str())),
                _ => None,
            }
        }
    }

    impl KeysetRow for Row {
        fn cursor(&self) -> Cursor {
            Cursor::new(self.id)
        }
    }

    struct VecSource(Vec<Row>);

    #[async_trait]
    impl KeysetSource for VecSource {
        type Row = Row;

        async fn find_anchor(&self, cursor: Cursor) -> Result<Option<Row>, DatabaseError> {
            Ok(self.0.iter().find(|r| r.id == cursor.id()).cloned())
        }

        async fn fetch(&self, filter: Filter) -> Result<Vec<Row>, DatabaseError> {
            Ok(filter.apply(&self.0))
        }
    }

    const KEYSET: KeysetSpec = KeysetSpec {
        table: "members",
        sort_column: "name",
        tie_break_column: "id",
        search_columns: &["name", "phone"],
    };

    fn row(id: i64, name: &str) -> Row {
        Row { id, name: name.to_string(), phone: format!("0812{:04}", id) }
    }

    fn users(n: i64) -> Vec<Row> {
        (1..=n).map(|i| row(i, &format!("User {}", i))).collect()
    }

    fn paginator(rows: Vec<Row>, policy: StaleCursorPolicy) -> KeysetPaginator<VecSource> {
        KeysetPaginator::new(VecSource(rows), KEYSET, policy)
    }

    fn names(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r.name.as_str()).collect()
    }

    async fn drain(p: &KeysetPaginator<VecSource>, limit: i64, search: Option<&str>) -> Vec<Row> {
        let mut all = vec![];
        let mut cursor = None;
        loop {
            let query = KeysetQuery::new(limit).unwrap().search(search).after(cursor);
            let page = p.page(&query).await.unwrap();
            all.extend(page.data);
            if !page.has_more {
                assert_eq!(page.next_cursor, None);
                break;
            }
            cursor = page.next_cursor;
        }
        all
    }

    #[tokio::test]
    async fn fifteen_users_split_lexically() {
        let p = paginator(users(15), StaleCursorPolicy::EndOfList);

        let first = p.page(&KeysetQuery::new(10).unwrap()).await.unwrap();
        assert_eq!(first.data.len(), 10);
        assert!(first.has_more);
        assert_eq!(first.data.first().unwrap().name, "User 1");
        assert_eq!(first.data.last().unwrap().name, "User 4");
        assert_eq!(first.next_cursor, Some(Cursor::new(4)));

        let second = p.page(&KeysetQuery::new(10).unwrap().after(first.next_cursor)).await.unwrap();
        assert_eq!(names(&second.data), vec!["User 5", "User 6", "User 7", "User 8", "User 9"]);
        assert!(!second.has_more);
        assert_eq!(second.next_cursor, None);
    }

    #[tokio::test]
    async fn first_page_is_idempotent() {
        let p = paginator(users(12), StaleCursorPolicy::EndOfList);
        let query = KeysetQuery::new(4).unwrap();
        let a = p.page(&query).await.unwrap();
        let b = p.page(&query).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn pages_have_no_gaps_or_duplicates() {
        let mut rows = users(23);
        rows.push(row(24, "User 3"));
        rows.push(row(25, "User 3"));
        let p = paginator(rows.clone(), StaleCursorPolicy::EndOfList);

        let mut expected = rows;
        expected.sort_by(|a, b| a.name.cmp(&b.name).then(b.id.cmp(&a.id)));

        for limit in [1, 3, 7, 23, 50] {
            assert_eq!(drain(&p, limit, None).await, expected, "limit {}", limit);
        }
    }

    #[tokio::test]
    async fn has_more_is_exact() {
        let p = paginator(users(4), StaleCursorPolicy::EndOfList);
        let page = p.page(&KeysetQuery::new(3).unwrap()).await.unwrap();
        assert_eq!(page.data.len(), 3);
        assert!(page.has_more);

        let p = paginator(users(3), StaleCursorPolicy::EndOfList);
        let page = p.page(&KeysetQuery::new(3).unwrap()).await.unwrap();
        assert_eq!(page.data.len(), 3);
        assert!(!page.has_more);
        assert_eq!(page.next_cursor, None);
    }

    #[tokio::test]
    async fn equal_names_resume_by_descending_id() {
        let rows = vec![row(1, "Sam"), row(2, "Sam"), row(3, "Sam"), row(4, "Alex")];
        let p = paginator(rows, StaleCursorPolicy::EndOfList);

        let first = p.page(&KeysetQuery::new(2).unwrap()).await.unwrap();
        assert_eq!(first.data.iter().map(|r| r.id).collect::<Vec<_>>(), vec![4, 3]);

        let second = p.page(&KeysetQuery::new(2).unwrap().after(first.next_cursor)).await.unwrap();
        assert_eq!(second.data.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 1]);
        assert!(!second.has_more);
    }

    #[tokio::test]
    async fn search_narrows_and_paginates_within_subset() {
        let mut rows = users(15);
        rows.push(row(16, "Alice"));
        let p = paginator(rows, StaleCursorPolicy::EndOfList);

        let all = drain(&p, 2, Some("user 1")).await;
        assert_eq!(
            names(&all),
            vec!["User 1", "User 10", "User 11", "User 12", "User 13", "User 14", "User 15"]
        );
    }

    #[tokio::test]
    async fn stale_cursor_ends_list_by_default() {
        let p = paginator(users(5), StaleCursorPolicy::EndOfList);
        let page = p.page(&KeysetQuery::new(2).unwrap().after(Some(Cursor::new(999)))).await.unwrap();
        assert_eq!(page, ListPage::empty());
    }

    #[tokio::test]
    async fn stale_cursor_can_restart() {
        let p = paginator(users(5), StaleCursorPolicy::Restart);
        let stale = p.page(&KeysetQuery::new(2).unwrap().after(Some(Cursor::new(999)))).await.unwrap();
        let first = p.page(&KeysetQuery::new(2).unwrap()).await.unwrap();
        assert_eq!(stale, first);
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!("end".parse::<StaleCursorPolicy>(), Ok(StaleCursorPolicy::EndOfList));
        assert_eq!("RESTART".parse::<StaleCursorPolicy>(), Ok(StaleCursorPolicy::Restart));
        assert!("explode".parse::<StaleCursorPolicy>().is_err());
    }
}
