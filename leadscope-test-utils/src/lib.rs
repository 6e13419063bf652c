//! Leadscope Test Utilities
//!
//! Shared test infrastructure for the Leadscope workspace:
//! - A scripted [`MockResultSource`] with per-page gates and failure injection
//! - Fixtures for leads and result pages
//! - Proptest strategies for filters and selection triples

pub use leadscope_core::{
    CacheKey, CategoryFilter, FetchError, FetchMode, LeadWithContacts, PageQuery,
    PaginationInfo, RemoteResultSource, ResultPage, SelectionTriple, StatusFilter,
};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Notify};

// ============================================================================
// MOCK RESULT SOURCE
// ============================================================================

/// One call observed by [`MockResultSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub query: PageQuery,
    pub mode: FetchMode,
}

/// Handle that lets a held fetch complete.
#[derive(Debug, Clone)]
pub struct Gate {
    notify: Arc<Notify>,
}

impl Gate {
    /// Let the held fetch continue. Calling this before the fetch starts
    /// waiting is fine; the permit is kept.
    pub fn release(&self) {
        self.notify.notify_one();
    }
}

/// In-memory stand-in for the remote API.
///
/// Every result set has `default_total` items unless overridden with
/// [`with_total`](Self::with_total). Fetches for a key passed to
/// [`hold`](Self::hold) park until the returned [`Gate`] is released, which
/// is how tests produce out-of-order completions. A gate applies to the next
/// fetch of its key only.
pub struct MockResultSource {
    default_total: u64,
    totals: Mutex<HashMap<SelectionTriple, u64>>,
    gates: Mutex<HashMap<CacheKey, Arc<Notify>>>,
    failures: Mutex<HashMap<CacheKey, FetchError>>,
    calls: Mutex<Vec<RecordedCall>>,
    call_count: watch::Sender<usize>,
}

impl MockResultSource {
    pub fn new(default_total: u64) -> Self {
        let (call_count, _) = watch::channel(0);
        Self {
            default_total,
            totals: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            call_count,
        }
    }

    /// Override the number of items matching `triple`.
    pub fn with_total(self, triple: SelectionTriple, total: u64) -> Self {
        self.totals.lock().unwrap().insert(triple, total);
        self
    }

    /// Park the next fetch for `key` until the returned gate is released.
    pub fn hold(&self, key: CacheKey) -> Gate {
        let notify = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(key, Arc::clone(&notify));
        Gate { notify }
    }

    /// Make every fetch for `key` fail with `error` until cleared.
    pub fn fail(&self, key: CacheKey, error: FetchError) {
        self.failures.lock().unwrap().insert(key, error);
    }

    pub fn clear_failure(&self, key: &CacheKey) {
        self.failures.lock().unwrap().remove(key);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of calls made for `key` in the given mode.
    pub fn calls_for(&self, key: &CacheKey, mode: FetchMode) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| &call.query.cache_key() == key && call.mode == mode)
            .count()
    }

    /// Wait until at least `n` calls have been made in total.
    pub async fn wait_for_calls(&self, n: usize) {
        let mut rx = self.call_count.subscribe();
        let _ = rx.wait_for(|count| *count >= n).await;
    }

    fn total_for(&self, triple: &SelectionTriple) -> u64 {
        self.totals
            .lock()
            .unwrap()
            .get(triple)
            .copied()
            .unwrap_or(self.default_total)
    }
}

#[async_trait]
impl RemoteResultSource for MockResultSource {
    async fn fetch(&self, query: &PageQuery, mode: FetchMode) -> Result<ResultPage, FetchError> {
        let key = query.cache_key();
        self.calls.lock().unwrap().push(RecordedCall {
            query: query.clone(),
            mode,
        });
        self.call_count.send_modify(|count| *count += 1);

        let gate = self.gates.lock().unwrap().remove(&key);
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(error) = self.failures.lock().unwrap().get(&key).cloned() {
            return Err(error);
        }

        let total = self.total_for(&query.triple);
        Ok(fixtures::result_page_for(query, total))
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    use leadscope_core::{Lead, LeadWithContacts, PageQuery, PaginationInfo, ResultPage};

    /// A contact-less lead with a predictable id and domain.
    pub fn lead(id: impl Into<String>) -> LeadWithContacts {
        let id = id.into();
        LeadWithContacts::bare(Lead {
            domain: format!("{id}.example.com"),
            title: format!("Lead {id}"),
            description: String::new(),
            scraper_progress_id: String::new(),
            scraped: false,
            google_done: false,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
            id,
        })
    }

    /// Page `page` of an anonymous result set of `total` items.
    pub fn result_page(page: u32, limit: u32, total: u64) -> ResultPage {
        build_page("lead", page, limit, total)
    }

    /// The page a well-behaved source returns for `query` when the result
    /// set has `total` items. Lead ids embed the query so pages of different
    /// selections never compare equal.
    pub fn result_page_for(query: &PageQuery, total: u64) -> ResultPage {
        let prefix = format!(
            "{}-{}-{}",
            query.triple.search, query.triple.status, query.triple.category
        );
        build_page(&prefix, query.page, query.limit, total)
    }

    fn build_page(prefix: &str, page: u32, limit: u32, total: u64) -> ResultPage {
        let pagination = PaginationInfo::from_counts(page, limit, total);
        let skip = pagination.skip();
        let count = total.saturating_sub(skip).min(u64::from(limit));
        let items = (0..count)
            .map(|i| lead(format!("{prefix}-{}", skip + i + 1)))
            .collect();
        ResultPage::new(items, pagination)
    }
}

// ============================================================================
// PROPTEST STRATEGIES
// ============================================================================

pub mod strategies {
    use leadscope_core::{CategoryFilter, SelectionTriple, StatusFilter};
    use proptest::prelude::*;

    pub fn status_filter() -> impl Strategy<Value = StatusFilter> {
        prop_oneof![
            Just(StatusFilter::All),
            Just(StatusFilter::New),
            Just(StatusFilter::Scraped),
        ]
    }

    pub fn category_filter() -> impl Strategy<Value = CategoryFilter> {
        prop_oneof![
            Just(CategoryFilter::All),
            "ind-[0-9]{1,3}".prop_map(CategoryFilter::Industry),
        ]
    }

    pub fn selection_triple() -> impl Strategy<Value = SelectionTriple> {
        ("[a-z ]{0,6}", status_filter(), category_filter())
            .prop_map(|(search, status, category)| SelectionTriple::new(search, status, category))
    }
}
