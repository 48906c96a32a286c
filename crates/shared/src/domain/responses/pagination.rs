use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
pub struct Pagination {
    pub page: i32,
    pub page_size: i32,
    pub total_items: i32,
    pub total_pages: i32,
}

impl Pagination {
    pub fn new(page: i32, page_size: i32, total_items: i64) -> Self {
        let total_items = total_items.max(0);
        let total_pages = if page_size > 0 {
            let size = i64::from(page_size);
            total_items / size + i64::from(total_items % size != 0)
        } else {
            0
        };

        Self {
            page,
            page_size,
            total_items: i32::try_from(total_items).unwrap_or(i32::MAX),
            total_pages: i32::try_from(total_pages).unwrap_or(i32::MAX),
        }
    }

    /// Normalizes a 1-based page request into `(page, page_size, offset)`.
    pub fn normalize(page: i32, page_size: i32) -> (i32, i32, i64) {
        let page = if page > 0 { page } else { 1 };
        let page_size = if page_size > 0 { page_size.min(100) } else { 10 };
        let offset = i64::from(page - 1) * i64::from(page_size);
        (page, page_size, offset)
    }
}
