//! Contract of the remote search/filter API.

use crate::error::FetchError;
use crate::filter::SelectionTriple;
use crate::key::CacheKey;
use crate::pagination::ResultPage;
use crate::PageNumber;
use async_trait::async_trait;
use std::fmt;

/// Whether a fetch is awaited by the user or issued speculatively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchMode {
    Foreground,
    Background,
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMode::Foreground => f.write_str("foreground"),
            FetchMode::Background => f.write_str("background"),
        }
    }
}

/// Everything needed to request one page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageQuery {
    pub page: PageNumber,
    pub limit: u32,
    pub triple: SelectionTriple,
}

impl PageQuery {
    pub fn new(page: PageNumber, limit: u32, triple: SelectionTriple) -> Self {
        Self {
            page,
            limit,
            triple,
        }
    }

    /// Offset of the first requested item: `(page - 1) * limit`.
    pub fn skip(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.page, self.triple.clone())
    }
}

/// Source of result pages, typically the HTTP API.
///
/// Implementations must uphold the [`PaginationInfo`](crate::PaginationInfo)
/// invariants in what they return and report every failure as a
/// [`FetchError`]. The `mode` is informational (logging, metrics); it must
/// not change the result.
#[async_trait]
pub trait RemoteResultSource: Send + Sync {
    async fn fetch(&self, query: &PageQuery, mode: FetchMode) -> Result<ResultPage, FetchError>;
}
