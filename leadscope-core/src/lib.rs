//! Leadscope Core - Data Types
//!
//! Pure data structures shared by the cache, the coordinator and the remote
//! source, plus the [`RemoteResultSource`] contract. This crate contains no
//! I/O.

mod entities;
mod error;
mod filter;
mod key;
mod pagination;
mod source;

pub use entities::{Email, Industry, Lead, LeadWithContacts, Phone, Social};
pub use error::{FetchError, FetchErrorKind, FilterParseError};
pub use filter::{CategoryFilter, SelectionTriple, StatusFilter};
pub use key::CacheKey;
pub use pagination::{PaginationInfo, ResultPage};
pub use source::{FetchMode, PageQuery, RemoteResultSource};

/// Page numbers are 1-based everywhere in this workspace.
pub type PageNumber = u32;
