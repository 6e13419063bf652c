//! Status/category filters and the selection triple they form with the
//! search text.

use crate::error::FilterParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scrape status filter offered by the list UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    /// Leads that have not been scraped yet.
    New,
    Scraped,
}

impl StatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::New => "new",
            StatusFilter::Scraped => "scraped",
        }
    }

    /// Value of the `scraped` query parameter, `None` when unfiltered.
    pub fn scraped_param(self) -> Option<&'static str> {
        match self {
            StatusFilter::All => None,
            StatusFilter::New => Some("false"),
            StatusFilter::Scraped => Some("true"),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "new" => Ok(StatusFilter::New),
            "scraped" => Ok(StatusFilter::Scraped),
            other => Err(FilterParseError::UnknownStatus(other.to_string())),
        }
    }
}

/// Industry filter: either every industry or one industry id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum CategoryFilter {
    #[default]
    All,
    Industry(String),
}

impl CategoryFilter {
    /// Value of the `industry_id` query parameter, `None` when unfiltered.
    pub fn industry_id(&self) -> Option<&str> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Industry(id) => Some(id),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Industry(id) => f.write_str(id),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(FilterParseError::EmptyCategory);
        }
        if s == "all" {
            Ok(CategoryFilter::All)
        } else {
            Ok(CategoryFilter::Industry(s.to_string()))
        }
    }
}

/// The (search, status, category) combination that defines one result set,
/// independent of the page number.
///
/// Search text is compared exactly; no trimming or case folding happens here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SelectionTriple {
    pub search: String,
    pub status: StatusFilter,
    pub category: CategoryFilter,
}

impl SelectionTriple {
    pub fn new(search: impl Into<String>, status: StatusFilter, category: CategoryFilter) -> Self {
        Self {
            search: search.into(),
            status,
            category,
        }
    }

    pub fn with_search(&self, search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..self.clone()
        }
    }

    pub fn with_status(&self, status: StatusFilter) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    pub fn with_category(&self, category: CategoryFilter) -> Self {
        Self {
            category,
            ..self.clone()
        }
    }

    /// Search text as a query parameter, `None` when empty.
    pub fn search_param(&self) -> Option<&str> {
        if self.search.is_empty() {
            None
        } else {
            Some(&self.search)
        }
    }
}

impl fmt::Display for SelectionTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "search={:?} status={} category={}", self.search, self.status, self.category)
    }
}
