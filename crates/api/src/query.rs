//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Largest page a listing returns.
pub const MAX_PAGE_SIZE: usize = 500;

/// Pagination parameters (`?limit=&offset=`).
///
/// Both are optional; the limit is capped at [`MAX_PAGE_SIZE`].
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl PaginationParams {
    /// The requested window of `items`.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = self.offset.unwrap_or(0);
        let limit = self.limit.unwrap_or(MAX_PAGE_SIZE).min(MAX_PAGE_SIZE);
        items.into_iter().skip(offset).take(limit).collect()
    }
}
