//! Page cache and prefetch bookkeeping for one list-view session.
//!
//! [`CacheStore`] maps a [`CacheKey`](leadscope_core::CacheKey) to a fetched
//! [`ResultPage`](leadscope_core::ResultPage). It is unbounded unless a
//! capacity is configured, in which case the least-recently used page is
//! evicted first.
//!
//! [`PrefetchRegistry`] tracks which pages of the active selection triple are
//! being fetched speculatively. Every reset starts a new epoch so that a
//! completion issued under an older triple can be recognised and dropped.

pub mod registry;
pub mod store;

pub use registry::{PrefetchEpoch, PrefetchRegistry};
pub use store::{CacheConfig, CacheStats, CacheStore, InvalidationPolicy};
