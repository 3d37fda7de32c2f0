//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Pagination parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl Pagination {
    /// Row offset for the current page
    pub fn offset(&self) -> i64 {
        (self.page.max(1) as i64 - 1) * self.limit()
    }

    /// Row limit, capped to keep list endpoints bounded
    pub fn limit(&self) -> i64 {
        self.per_page.clamp(1, 100) as i64
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PaginationMeta {
    pub fn new(pagination: Pagination, total_items: u64) -> Self {
        let per_page = pagination.limit() as u32;
        let total_pages = ((total_items + per_page as u64 - 1) / per_page as u64) as u32;
        Self {
            page: pagination.page.max(1),
            per_page,
            total_items,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_offset_starts_at_zero() {
        let p = Pagination {
            page: 1,
            per_page: 20,
        };
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 20);
    }

    #[test]
    fn pagination_clamps_page_and_size() {
        let p = Pagination {
            page: 0,
            per_page: 1000,
        };
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 100);

        let p = Pagination {
            page: 3,
            per_page: 10,
        };
        assert_eq!(p.offset(), 20);
    }

    #[test]
    fn pagination_meta_rounds_pages_up() {
        let meta = PaginationMeta::new(
            Pagination {
                page: 1,
                per_page: 20,
            },
            41,
        );
        assert_eq!(meta.total_pages, 3);
    }
}
