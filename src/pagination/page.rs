use serde::Serialize;

use super::cursor::Cursor;
use super::keyset::KeysetRow;

/// One page of keyset results.
///
/// `next_cursor` is set only when `has_more` is true; it is the cursor of the last row
/// in `data`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    pub data: Vec<T>,
    pub next_cursor: Option<Cursor>,
    pub has_more: bool,
}

/// Metadata block returned next to a keyset page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeysetMeta {
    pub next_cursor: Option<Cursor>,
    pub has_more: bool,
    pub limit: i64,
}

impl<T> ListPage<T> {
    pub fn empty() -> Self {
        Self { data: vec![], next_cursor: None, has_more: false }
    }

    pub fn meta(&self, limit: i64) -> KeysetMeta {
        KeysetMeta { next_cursor: self.next_cursor, has_more: self.has_more, limit }
    }
}

impl<T: KeysetRow> ListPage<T> {
    /// Builds a page from a `limit + 1` fetch: the extra row only signals that more exist.
    pub fn from_overfetch(mut rows: Vec<T>, limit: i64) -> Self {
        let limit = limit.max(0) as usize;
        let has_more = rows.len() > limit;
        rows.truncate(limit);

        let next_cursor = if has_more { rows.last().map(KeysetRow::cursor) } else { None };
        Self { data: rows, next_cursor, has_more }
    }
}
