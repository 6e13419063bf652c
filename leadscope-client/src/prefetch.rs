//! Bounded lookahead prefetching.
//!
//! Planning and completion are pure over the cache and registry so they can
//! run under the coordinator's state lock; the coordinator performs the
//! actual fetches.

use leadscope_cache::{CacheStore, PrefetchEpoch, PrefetchRegistry};
use leadscope_core::{
    CacheKey, FetchError, PageNumber, PageQuery, PaginationInfo, ResultPage, SelectionTriple,
};

/// Default number of pages fetched ahead of the displayed one.
pub const DEFAULT_PREFETCH_DEPTH: u32 = 2;

/// A background fetch the scheduler has registered and wants issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefetchJob {
    pub query: PageQuery,
    pub epoch: PrefetchEpoch,
}

/// What happened to a finished background fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchOutcome {
    /// The page was written to the cache.
    Stored,
    /// The fetch failed; the page was released for a later foreground fetch.
    Failed,
    /// The registry moved on (selection changed); the result was dropped.
    Abandoned,
}

#[derive(Debug, Clone)]
pub struct PrefetchScheduler {
    depth: u32,
    page_size: u32,
}

impl PrefetchScheduler {
    pub fn new(depth: u32, page_size: u32) -> Self {
        Self { depth, page_size }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Register and return the pages after `after_page` worth fetching.
    ///
    /// A candidate is skipped when it lies past `pagination.total_pages`, is
    /// already cached for `triple`, or is already in flight. Nothing is
    /// planned for a triple the registry is not scoped to.
    pub fn plan(
        &self,
        after_page: PageNumber,
        triple: &SelectionTriple,
        pagination: &PaginationInfo,
        cache: &CacheStore,
        registry: &mut PrefetchRegistry,
    ) -> Vec<PrefetchJob> {
        if registry.triple() != triple {
            return Vec::new();
        }

        let mut jobs = Vec::new();
        for i in 1..=self.depth {
            let Some(candidate) = after_page.checked_add(i) else {
                break;
            };
            if candidate > pagination.total_pages {
                continue;
            }
            if cache.contains(&CacheKey::new(candidate, triple.clone())) {
                continue;
            }
            if !registry.insert(candidate) {
                continue;
            }
            jobs.push(PrefetchJob {
                query: PageQuery::new(candidate, self.page_size, triple.clone()),
                epoch: registry.epoch(),
            });
        }
        jobs
    }

    /// Apply the result of a finished background fetch.
    ///
    /// Results for an abandoned epoch never reach the cache.
    pub fn complete(
        &self,
        job: &PrefetchJob,
        result: Result<ResultPage, FetchError>,
        cache: &mut CacheStore,
        registry: &mut PrefetchRegistry,
    ) -> PrefetchOutcome {
        if !registry.complete(job.epoch, job.query.page) {
            return PrefetchOutcome::Abandoned;
        }
        match result {
            Ok(page) => {
                cache.put(job.query.cache_key(), page);
                PrefetchOutcome::Stored
            }
            Err(_) => PrefetchOutcome::Failed,
        }
    }
}

impl Default for PrefetchScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_PREFETCH_DEPTH, 50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadscope_core::StatusFilter;
    use proptest::prelude::*;

    fn pagination(page: u32, total: u64) -> PaginationInfo {
        PaginationInfo::from_counts(page, 50, total)
    }

    fn empty_page(page: u32) -> ResultPage {
        ResultPage::new(Vec::new(), pagination(page, 500))
    }

    #[test]
    fn test_plans_next_two_pages() {
        let scheduler = PrefetchScheduler::default();
        let triple = SelectionTriple::default();
        let cache = CacheStore::unbounded();
        let mut registry = PrefetchRegistry::new(triple.clone());

        let jobs = scheduler.plan(1, &triple, &pagination(1, 120), &cache, &mut registry);
        let pages: Vec<_> = jobs.iter().map(|job| job.query.page).collect();
        assert_eq!(pages, vec![2, 3]);
        assert_eq!(registry.pages(), vec![2, 3]);
        assert!(jobs.iter().all(|job| job.query.limit == 50));
    }

    #[test]
    fn test_skips_past_last_page_cached_and_in_flight() {
        let scheduler = PrefetchScheduler::default();
        let triple = SelectionTriple::default();
        let mut cache = CacheStore::unbounded();
        let mut registry = PrefetchRegistry::new(triple.clone());

        // last page: nothing to do
        assert!(scheduler
            .plan(3, &triple, &pagination(3, 120), &cache, &mut registry)
            .is_empty());

        cache.put(CacheKey::new(2, triple.clone()), empty_page(2));
        registry.insert(3);
        assert!(scheduler
            .plan(1, &triple, &pagination(1, 500), &cache, &mut registry)
            .is_empty());
    }

    #[test]
    fn test_no_plan_for_inactive_triple() {
        let scheduler = PrefetchScheduler::default();
        let active = SelectionTriple::default();
        let other = active.with_status(StatusFilter::New);
        let cache = CacheStore::unbounded();
        let mut registry = PrefetchRegistry::new(active);

        assert!(scheduler
            .plan(1, &other, &pagination(1, 500), &cache, &mut registry)
            .is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_complete_stores_fails_or_abandons() {
        let scheduler = PrefetchScheduler::default();
        let triple = SelectionTriple::default();
        let mut cache = CacheStore::unbounded();
        let mut registry = PrefetchRegistry::new(triple.clone());
        let jobs = scheduler.plan(1, &triple, &pagination(1, 500), &cache, &mut registry);

        let stored = scheduler.complete(&jobs[0], Ok(empty_page(2)), &mut cache, &mut registry);
        assert_eq!(stored, PrefetchOutcome::Stored);
        assert!(cache.contains(&CacheKey::new(2, triple.clone())));

        let failed = scheduler.complete(
            &jobs[1],
            Err(FetchError::network("down")),
            &mut cache,
            &mut registry,
        );
        assert_eq!(failed, PrefetchOutcome::Failed);
        assert!(registry.is_empty());
        assert!(!cache.contains(&CacheKey::new(3, triple.clone())));

        let jobs = scheduler.plan(3, &triple, &pagination(3, 500), &cache, &mut registry);
        registry.reset(triple.with_search("x"));
        let abandoned = scheduler.complete(&jobs[0], Ok(empty_page(4)), &mut cache, &mut registry);
        assert_eq!(abandoned, PrefetchOutcome::Abandoned);
        assert!(!cache.contains(&CacheKey::new(4, triple)));
    }

    #[test]
    fn test_zero_depth_disables_prefetch() {
        let scheduler = PrefetchScheduler::new(0, 50);
        let triple = SelectionTriple::default();
        let cache = CacheStore::unbounded();
        let mut registry = PrefetchRegistry::new(triple.clone());
        assert!(scheduler
            .plan(1, &triple, &pagination(1, 500), &cache, &mut registry)
            .is_empty());
    }

    proptest! {
        #[test]
        fn registry_stays_within_bound(
            total in 0u64..2_000,
            visits in prop::collection::vec(1u32..50, 1..20),
        ) {
            let scheduler = PrefetchScheduler::default();
            let triple = SelectionTriple::default();
            let cache = CacheStore::unbounded();
            let mut registry = PrefetchRegistry::new(triple.clone());
            let total_pages = PaginationInfo::from_counts(1, 50, total).total_pages;

            for page in visits {
                // each visit abandons whatever was in flight before
                registry.reset(triple.clone());
                scheduler.plan(page, &triple, &pagination(page, total), &cache, &mut registry);
                prop_assert!(registry.len() <= 2);
                prop_assert!(registry.pages().iter().all(|p| *p <= total_pages));
            }
        }
    }
}
