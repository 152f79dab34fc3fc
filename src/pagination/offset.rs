use serde::Serialize;

/// Pagination block for the classic page/limit listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub items_per_page: i64,
}

impl PageInfo {
    pub fn new(page: i64, limit: i64, total_items: i64) -> Self {
        let total_pages = if limit > 0 { (total_items + limit - 1) / limit } else { 0 };
        Self {
            current_page: page,
            total_pages,
            total_items,
            items_per_page: limit,
        }
    }
}

/// Rows to skip for a 1-based page number; `None` when the offset does not fit in an `i64`.
pub fn offset_for(page: i64, limit: i64) -> Option<i64> {
    (page.max(1) - 1).checked_mul(limit.max(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_round_up() {
        assert_eq!(PageInfo::new(1, 10, 0).total_pages, 0);
        assert_eq!(PageInfo::new(1, 10, 10).total_pages, 1);
        assert_eq!(PageInfo::new(2, 10, 11).total_pages, 2);
    }

    #[test]
    fn offsets_are_page_based() {
        assert_eq!(offset_for(1, 10), Some(0));
        assert_eq!(offset_for(3, 25), Some(50));
        assert_eq!(offset_for(0, 10), Some(0));
    }

    #[test]
    fn offset_overflow_is_none() {
        assert_eq!(offset_for(i64::MAX, 10), None);
        assert_eq!(offset_for(i64::MAX, 1), Some(i64::MAX - 1));
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(PageInfo::new(2, 5, 12)).unwrap();
        assert_eq!(json, serde_json::json!({
            "currentPage": 2,
            "totalPages": 3,
            "totalItems": 12,
            "itemsPerPage": 5
        }));
    }
}
