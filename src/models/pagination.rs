//! Listing query parameters and the paginated response wrapper.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Query parameters shared by every list endpoint: optional search term,
/// sort field (whitelisted per endpoint), direction and paging.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct PaginationParams {
    pub q: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl PaginationParams {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u64 {
        self.page_size.unwrap_or(10).clamp(1, 100)
    }

    pub fn offset(&self) -> u64 {
        (self.page() - 1) * self.page_size()
    }

    /// Trimmed search term, `None` when empty.
    pub fn search(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string)
    }

    pub fn sort_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.sort.as_deref().unwrap_or(default)
    }

    /// True when the direction parameter requests ascending order.
    pub fn is_ascending(&self, default_asc: bool) -> bool {
        match self.dir.as_deref().map(str::to_lowercase).as_deref() {
            Some("asc") => true,
            Some("desc") => false,
            _ => default_asc,
        }
    }

    /// Endpoints that serve an unpaged view when no paging was requested.
    pub fn is_paged(&self) -> bool {
        self.page.is_some() || self.page_size.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: u64, page_size: u64, total: u64) -> Self {
        let total_pages = (total + page_size - 1) / page_size;
        Self {
            data,
            page,
            page_size,
            total,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_clamping() {
        let params = PaginationParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.page_size(), 10);
        assert_eq!(params.offset(), 0);
        assert!(!params.is_paged());

        let params = PaginationParams {
            page: Some(0),
            page_size: Some(1000),
            ..Default::default()
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.page_size(), 100);
    }

    #[test]
    fn test_search_trims_and_drops_empty() {
        let params = PaginationParams {
            q: Some("  netflix  ".to_string()),
            ..Default::default()
        };
        assert_eq!(params.search().as_deref(), Some("netflix"));

        let params = PaginationParams {
            q: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(params.search(), None);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let resp = PaginatedResponse::new(vec![1, 2, 3], 1, 10, 21);
        assert_eq!(resp.total_pages, 3);
    }
}
