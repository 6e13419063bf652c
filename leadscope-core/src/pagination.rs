//! Pagination metadata and result pages.

use crate::entities::LeadWithContacts;
use crate::PageNumber;
use serde::{Deserialize, Serialize};

/// Pagination metadata reported by the remote source.
///
/// The source is responsible for keeping the fields consistent; nothing in
/// this workspace recomputes them from a received value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub page: PageNumber,
    pub limit: u32,
    pub total_count: u64,
    pub total_pages: PageNumber,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationInfo {
    /// Build consistent metadata for `page` of a result set of `total_count`
    /// items split into pages of `limit`.
    pub fn from_counts(page: PageNumber, limit: u32, total_count: u64) -> Self {
        let total_pages = if limit == 0 || total_count == 0 {
            0
        } else {
            total_count.div_ceil(u64::from(limit)) as PageNumber
        };
        Self {
            page,
            limit,
            total_count,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    /// Whether the flags and page count agree with each other.
    ///
    /// An empty result set may report either 0 or 1 total pages.
    pub fn is_consistent(&self) -> bool {
        if self.limit == 0 {
            return false;
        }
        let expected_pages = self.total_count.div_ceil(u64::from(self.limit));
        let pages_ok = u64::from(self.total_pages) == expected_pages
            || (self.total_count == 0 && self.total_pages <= 1);
        pages_ok
            && self.has_next == (self.page < self.total_pages)
            && self.has_prev == (self.page > 1)
    }

    /// Offset of the first item on this page.
    pub fn skip(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One fetched page of leads. Immutable once cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultPage {
    pub items: Vec<LeadWithContacts>,
    pub pagination: PaginationInfo,
}

impl ResultPage {
    pub fn new(items: Vec<LeadWithContacts>, pagination: PaginationInfo) -> Self {
        Self { items, pagination }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn page(&self) -> PageNumber {
        self.pagination.page
    }
}
