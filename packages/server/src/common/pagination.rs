//! Offset pagination types
//!
//! Listing endpoints take `page` / `per_page` and answer with a page envelope:
//!
//! ```json
//! { "data": [...], "current_page": 1, "last_page": 4, "per_page": 10, "total": 37 }
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let request = PageRequest::new(body.page, body.per_page, 10);
//! let (items, total) = store.list(..., request.limit(), request.offset()).await?;
//! let page = Paginated::new(items, total, &request);
//! ```

use serde::{Deserialize, Serialize};

/// Hard cap on page size to keep listing queries bounded.
pub const MAX_PER_PAGE: i64 = 100;

/// Highest page number accepted; keeps `offset` within i64 at any page size.
pub const MAX_PAGE: i64 = i64::MAX / MAX_PER_PAGE;

// ============================================================================
// PageRequest
// ============================================================================

/// Validated page request (1-based page number).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    per_page: i64,
}

impl PageRequest {
    /// Build a request from optional client input, falling back to
    /// `default_per_page`. Out-of-range values are clamped rather than rejected.
    pub fn new(page: Option<i64>, per_page: Option<i64>, default_per_page: i64) -> Self {
        let per_page = per_page
            .unwrap_or(default_per_page)
            .clamp(1, MAX_PER_PAGE);
        let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
        Self { page, per_page }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
    }

    /// SQL LIMIT
    pub fn limit(&self) -> i64 {
        self.per_page
    }

    /// SQL OFFSET
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

// ============================================================================
// Paginated
// ============================================================================

/// One page of results plus totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub current_page: i64,
    pub last_page: i64,
    pub per_page: i64,
    pub total: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, request: &PageRequest) -> Self {
        let last_page = if total == 0 {
            1
        } else {
            (total + request.per_page - 1) / request.per_page
        };

        Self {
            data,
            current_page: request.page,
            last_page,
            per_page: request.per_page,
            total,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
