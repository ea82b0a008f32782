use serde::{Deserialize, Serialize};
use validator::Validate;

/// Envelope for list endpoints.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub total: i64,
    pub results: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(total: i64, results: Vec<T>) -> Self {
        Self { total, results }
    }
}

/// `?search=&page=&limit=` for recipe listings. Pages are 1-indexed.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecipeQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[validate(range(min = 1, max = 1_000_000))]
    pub page: i64,
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,
}

impl RecipeQuery {
    pub fn new(search: Option<&str>, page: i64, limit: i64) -> Self {
        Self {
            search: search.map(str::to_string),
            page,
            limit,
        }
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).max(0).saturating_mul(self.limit)
    }

    /// Trimmed search term, empty when absent.
    pub fn term(&self) -> &str {
        self.search.as_deref().map(str::trim).unwrap_or("")
    }
}
