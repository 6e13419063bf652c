//! The query coordinator: selection state, cache arbitration and the
//! foreground loading state machine.

use crate::debounce::SearchDebouncer;
use crate::prefetch::{PrefetchJob, PrefetchOutcome, PrefetchScheduler, DEFAULT_PREFETCH_DEPTH};
use leadscope_cache::{CacheConfig, CacheStats, CacheStore, InvalidationPolicy, PrefetchRegistry};
use leadscope_core::{
    CacheKey, CategoryFilter, FetchError, FetchMode, PageNumber, PageQuery, RemoteResultSource,
    ResultPage, SelectionTriple, StatusFilter,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Runtime settings for a [`QueryCoordinator`].
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Items per page (`limit`).
    pub page_size: u32,
    /// Upper bound on every fetch, foreground and background.
    pub request_timeout: Duration,
    /// Quiet period before a search edit is committed.
    pub debounce: Duration,
    /// Pages fetched ahead of the displayed one.
    pub prefetch_depth: u32,
    pub cache: CacheConfig,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            request_timeout: Duration::from_secs(10),
            debounce: Duration::from_millis(300),
            prefetch_depth: DEFAULT_PREFETCH_DEPTH,
            cache: CacheConfig::default(),
        }
    }
}

impl CoordinatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_debounce(mut self, quiet: Duration) -> Self {
        self.debounce = quiet;
        self
    }

    pub fn with_prefetch_depth(mut self, depth: u32) -> Self {
        self.prefetch_depth = depth;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}

// ============================================================================
// STATE
// ============================================================================

/// Why the coordinator is loading in the foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadReason {
    InitialLoad,
    Search,
    Filter,
    PageChange,
}

impl LoadReason {
    /// The indicator the UI shows for this reason.
    pub fn loading_kind(self) -> LoadingKind {
        match self {
            LoadReason::InitialLoad | LoadReason::PageChange => LoadingKind::Page,
            LoadReason::Search => LoadingKind::Search,
            LoadReason::Filter => LoadingKind::Filter,
        }
    }
}

/// Foreground loading state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    LoadingForeground(LoadReason),
    Error(String),
}

/// The three loading indicators exposed to the UI. At most one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingKind {
    Search,
    Filter,
    Page,
}

/// Current page plus the selection triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub page: PageNumber,
    pub triple: SelectionTriple,
}

impl Selection {
    pub fn key(&self) -> CacheKey {
        CacheKey::new(self.page, self.triple.clone())
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            page: 1,
            triple: SelectionTriple::default(),
        }
    }
}

/// What a coordinator operation ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The requested page is now the rendered one.
    Rendered { from_cache: bool },
    /// The foreground fetch failed; the state is [`LoadState::Error`].
    Failed,
    /// A newer request was issued before this one completed.
    Superseded,
    /// The request was a no-op (page out of range, nothing to retry).
    Ignored,
    /// The coordinator has been shut down.
    ShutDown,
}

/// Everything the UI needs to render one frame.
#[derive(Debug, Clone)]
pub struct ViewSnapshot {
    pub selection: Selection,
    pub state: LoadState,
    pub page: Option<Arc<ResultPage>>,
    pub loading: Option<LoadingKind>,
    pub error: Option<String>,
    pub search_pending: bool,
}

struct CoordinatorState {
    selection: Selection,
    phase: LoadState,
    last_reason: LoadReason,
    rendered: Option<Arc<ResultPage>>,
    /// Page count of the current triple, once a page of it was adopted.
    total_pages: Option<PageNumber>,
    cache: CacheStore,
    registry: PrefetchRegistry,
    /// Tag of the authoritative foreground fetch.
    sequence: u64,
}

/// Where a foreground transition wants to go.
enum Target {
    Current,
    Page(PageNumber),
    Search(String),
    Status(StatusFilter),
    Category(CategoryFilter),
}

enum Step {
    Done(Outcome),
    Rendered(Vec<PrefetchJob>),
    Fetch { query: PageQuery, sequence: u64 },
}

// ============================================================================
// COORDINATOR
// ============================================================================

struct Inner {
    source: Arc<dyn RemoteResultSource>,
    config: CoordinatorConfig,
    scheduler: PrefetchScheduler,
    state: Mutex<CoordinatorState>,
    debouncer: SearchDebouncer,
    /// Prefetch and debounced-commit tasks, awaited by `settle`.
    tasks: Mutex<Vec<JoinHandle<()>>>,
    shutdown: CancellationToken,
}

/// Single source of truth for the lead list.
///
/// A cheap clonable handle. Every state change happens under a short,
/// synchronous lock; fetches run outside it, so operations may be issued
/// concurrently. Only the most recently issued foreground fetch may change
/// what is rendered.
///
/// The coordinator spawns tokio tasks for prefetching and debounced search
/// commits, so it must be used from within a tokio runtime.
#[derive(Clone)]
pub struct QueryCoordinator {
    inner: Arc<Inner>,
}

impl QueryCoordinator {
    pub fn new(source: Arc<dyn RemoteResultSource>, config: CoordinatorConfig) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let weak = weak.clone();
            let debouncer = SearchDebouncer::new(config.debounce, move |text| {
                if let Some(inner) = weak.upgrade() {
                    QueryCoordinator { inner }.spawn_commit(text);
                }
            });
            let state = CoordinatorState {
                selection: Selection::default(),
                phase: LoadState::Idle,
                last_reason: LoadReason::InitialLoad,
                rendered: None,
                total_pages: None,
                cache: CacheStore::new(&config.cache),
                registry: PrefetchRegistry::new(SelectionTriple::default()),
                sequence: 0,
            };
            Inner {
                source,
                scheduler: PrefetchScheduler::new(config.prefetch_depth, config.page_size),
                config,
                state: Mutex::new(state),
                debouncer,
                tasks: Mutex::new(Vec::new()),
                shutdown: CancellationToken::new(),
            }
        });
        Self { inner }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Load page 1 of the current selection.
    pub async fn load_initial(&self) -> Outcome {
        self.run(LoadReason::InitialLoad, Target::Page(1)).await
    }

    /// Keystroke entry point. Raises the search indicator immediately and
    /// commits the last text after the quiet period.
    pub fn set_search_text(&self, text: impl Into<String>) {
        if self.inner.shutdown.is_cancelled() {
            return;
        }
        self.inner.debouncer.on_input(text);
    }

    /// Commit `text` as the search immediately, discarding a pending
    /// debounced commit.
    pub async fn commit_search(&self, text: impl Into<String>) -> Outcome {
        self.inner.debouncer.cancel();
        self.run(LoadReason::Search, Target::Search(text.into()))
            .await
    }

    pub async fn set_status_filter(&self, status: StatusFilter) -> Outcome {
        self.run(LoadReason::Filter, Target::Status(status)).await
    }

    pub async fn set_category_filter(&self, category: CategoryFilter) -> Outcome {
        self.run(LoadReason::Filter, Target::Category(category))
            .await
    }

    /// Show `page` of the current selection. Page 0 and pages past the known
    /// page count are ignored.
    pub async fn go_to_page(&self, page: PageNumber) -> Outcome {
        self.run(LoadReason::PageChange, Target::Page(page)).await
    }

    pub async fn next_page(&self) -> Outcome {
        let page = self.selection().page;
        match page.checked_add(1) {
            Some(next) => self.go_to_page(next).await,
            None => Outcome::Ignored,
        }
    }

    pub async fn prev_page(&self) -> Outcome {
        let page = self.selection().page;
        if page <= 1 {
            return Outcome::Ignored;
        }
        self.go_to_page(page - 1).await
    }

    /// Re-issue the current selection after a failure.
    pub async fn retry(&self) -> Outcome {
        let reason = {
            let state = self.inner.lock_state();
            if !matches!(state.phase, LoadState::Error(_)) {
                return Outcome::Ignored;
            }
            state.last_reason
        };
        self.run(reason, Target::Current).await
    }

    /// Stop all activity. In-flight completions are ignored afterwards and
    /// every operation returns [`Outcome::ShutDown`].
    pub fn shutdown(&self) {
        info!("query coordinator shutting down");
        self.inner.shutdown.cancel();
        self.inner.debouncer.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Wait for every outstanding prefetch and debounced commit, including
    /// the ones they spawn.
    pub async fn settle(&self) {
        loop {
            let pending = std::mem::take(&mut *self.inner.lock_tasks());
            if pending.is_empty() {
                break;
            }
            for handle in pending {
                let _ = handle.await;
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn selection(&self) -> Selection {
        self.inner.lock_state().selection.clone()
    }

    pub fn state(&self) -> LoadState {
        self.inner.lock_state().phase.clone()
    }

    pub fn current_result_page(&self) -> Option<Arc<ResultPage>> {
        self.inner.lock_state().rendered.clone()
    }

    /// The active loading indicator. A pending search wins over any
    /// foreground load.
    pub fn loading_kind(&self) -> Option<LoadingKind> {
        if self.inner.debouncer.is_pending() {
            return Some(LoadingKind::Search);
        }
        match self.inner.lock_state().phase {
            LoadState::LoadingForeground(reason) => Some(reason.loading_kind()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<String> {
        match &self.inner.lock_state().phase {
            LoadState::Error(message) => Some(message.clone()),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        let search_pending = self.inner.debouncer.is_pending();
        let state = self.inner.lock_state();
        let loading = if search_pending {
            Some(LoadingKind::Search)
        } else {
            match state.phase {
                LoadState::LoadingForeground(reason) => Some(reason.loading_kind()),
                _ => None,
            }
        };
        let error = match &state.phase {
            LoadState::Error(message) => Some(message.clone()),
            _ => None,
        };
        ViewSnapshot {
            selection: state.selection.clone(),
            state: state.phase.clone(),
            page: state.rendered.clone(),
            loading,
            error,
            search_pending,
        }
    }

    pub fn is_cached(&self, key: &CacheKey) -> bool {
        self.inner.lock_state().cache.contains(key)
    }

    pub fn cache_size(&self) -> usize {
        self.inner.lock_state().cache.size()
    }

    /// Number of cached pages belonging to `triple`.
    pub fn cached_pages_for(&self, triple: &SelectionTriple) -> usize {
        self.inner.lock_state().cache.count_for(triple)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.lock_state().cache.stats()
    }

    /// Pages currently being prefetched, ascending.
    pub fn prefetch_in_flight(&self) -> Vec<PageNumber> {
        self.inner.lock_state().registry.pages()
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    async fn run(&self, reason: LoadReason, target: Target) -> Outcome {
        let (query, sequence) = match self.begin(reason, target) {
            Step::Done(outcome) => return outcome,
            Step::Rendered(jobs) => {
                self.dispatch(jobs);
                return Outcome::Rendered { from_cache: true };
            }
            Step::Fetch { query, sequence } => (query, sequence),
        };

        let inner = &self.inner;
        let result = tokio::select! {
            _ = inner.shutdown.cancelled() => return Outcome::ShutDown,
            result = fetch_with_timeout(
                inner.source.as_ref(),
                &query,
                FetchMode::Foreground,
                inner.config.request_timeout,
            ) => result,
        };

        let (outcome, jobs) = self.finish(query, sequence, result);
        self.dispatch(jobs);
        outcome
    }

    /// Apply the event and enter `LoadingForeground`, answering from the
    /// cache when possible.
    fn begin(&self, reason: LoadReason, target: Target) -> Step {
        if self.inner.shutdown.is_cancelled() {
            return Step::Done(Outcome::ShutDown);
        }
        let mut guard = self.inner.lock_state();
        let state = &mut *guard;

        let next_triple = match target {
            Target::Current => None,
            Target::Page(page) => {
                let beyond_end = state.total_pages.is_some_and(|total| page > total.max(1));
                if page == 0 || beyond_end {
                    debug!(page, total_pages = ?state.total_pages, "page out of range");
                    return Step::Done(Outcome::Ignored);
                }
                state.selection.page = page;
                None
            }
            Target::Search(text) => Some(state.selection.triple.with_search(text)),
            Target::Status(status) => Some(state.selection.triple.with_status(status)),
            Target::Category(category) => Some(state.selection.triple.with_category(category)),
        };
        if let Some(triple) = next_triple {
            if triple != state.selection.triple {
                self.change_triple(state, triple);
            }
        }

        state.sequence += 1;
        state.last_reason = reason;
        state.phase = LoadState::LoadingForeground(reason);

        let key = state.selection.key();
        if let Some(page) = state.cache.get(&key) {
            debug!(%key, "cache hit");
            return Step::Rendered(self.adopt(state, page));
        }
        debug!(%key, sequence = state.sequence, ?reason, "cache miss, fetching");
        Step::Fetch {
            query: PageQuery::new(key.page(), self.inner.config.page_size, key.triple().clone()),
            sequence: state.sequence,
        }
    }

    fn change_triple(&self, state: &mut CoordinatorState, triple: SelectionTriple) {
        info!(from = %state.selection.triple, to = %triple, "selection changed");
        if self.inner.config.cache.invalidation == InvalidationPolicy::ClearAll {
            state.cache.clear();
        }
        let epoch = state.registry.reset(triple.clone());
        debug!(epoch = epoch.value(), "prefetch registry reset");
        state.selection = Selection { page: 1, triple };
        state.total_pages = None;
    }

    /// Handle the completion of the foreground fetch tagged `sequence`.
    fn finish(
        &self,
        query: PageQuery,
        sequence: u64,
        result: Result<ResultPage, FetchError>,
    ) -> (Outcome, Vec<PrefetchJob>) {
        let mut guard = self.inner.lock_state();
        let state = &mut *guard;
        if self.inner.shutdown.is_cancelled() {
            return (Outcome::ShutDown, Vec::new());
        }

        let key = query.cache_key();
        if sequence != state.sequence {
            debug!(%key, sequence, current = state.sequence, "stale response discarded");
            if let Ok(page) = result {
                if query.triple == state.selection.triple {
                    state.cache.put(key, page);
                }
            }
            return (Outcome::Superseded, Vec::new());
        }

        match result {
            Ok(page) => {
                if !page.pagination.is_consistent() {
                    warn!(%key, pagination = ?page.pagination, "inconsistent pagination from source");
                }
                let page = Arc::new(page);
                state.cache.put(key, Arc::clone(&page));
                let jobs = self.adopt(state, page);
                (Outcome::Rendered { from_cache: false }, jobs)
            }
            Err(err) => {
                warn!(%key, error = %err, kind = ?err.kind(), "foreground fetch failed");
                state.phase = LoadState::Error(err.to_string());
                (Outcome::Failed, Vec::new())
            }
        }
    }

    /// Make `page` the rendered one and plan the lookahead after it.
    fn adopt(&self, state: &mut CoordinatorState, page: Arc<ResultPage>) -> Vec<PrefetchJob> {
        state.total_pages = Some(page.pagination.total_pages);
        state.phase = LoadState::Idle;
        let jobs = self.inner.scheduler.plan(
            state.selection.page,
            &state.selection.triple,
            &page.pagination,
            &state.cache,
            &mut state.registry,
        );
        state.rendered = Some(page);
        debug!(stats = ?state.cache.stats(), "page adopted");
        jobs
    }

    fn dispatch(&self, jobs: Vec<PrefetchJob>) {
        if jobs.is_empty() {
            return;
        }
        for job in jobs {
            debug!(key = %job.query.cache_key(), epoch = job.epoch.value(), "prefetch dispatched");
            let inner = Arc::clone(&self.inner);
            let handle = tokio::spawn(async move {
                let result = tokio::select! {
                    _ = inner.shutdown.cancelled() => return,
                    result = fetch_with_timeout(
                        inner.source.as_ref(),
                        &job.query,
                        FetchMode::Background,
                        inner.config.request_timeout,
                    ) => result,
                };
                inner.complete_prefetch(&job, result);
            });
            self.track(handle);
        }
    }

    fn spawn_commit(&self, text: String) {
        let coordinator = self.clone();
        let handle = tokio::spawn(async move {
            coordinator
                .run(LoadReason::Search, Target::Search(text))
                .await;
        });
        self.track(handle);
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut tasks = self.inner.lock_tasks();
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn complete_prefetch(&self, job: &PrefetchJob, result: Result<ResultPage, FetchError>) {
        let error = result.as_ref().err().map(ToString::to_string);
        let mut guard = self.lock_state();
        let state = &mut *guard;
        if self.shutdown.is_cancelled() {
            return;
        }
        let key = job.query.cache_key();
        match self
            .scheduler
            .complete(job, result, &mut state.cache, &mut state.registry)
        {
            PrefetchOutcome::Stored => debug!(%key, "prefetched page stored"),
            PrefetchOutcome::Failed => {
                warn!(%key, error = error.as_deref().unwrap_or_default(), "prefetch failed")
            }
            PrefetchOutcome::Abandoned => debug!(%key, "prefetch result abandoned"),
        }
    }
}

/// Run one fetch, bounded by `timeout`.
async fn fetch_with_timeout(
    source: &dyn RemoteResultSource,
    query: &PageQuery,
    mode: FetchMode,
    timeout: Duration,
) -> Result<ResultPage, FetchError> {
    match tokio::time::timeout(timeout, source.fetch(query, mode)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout { elapsed: timeout }),
    }
}
