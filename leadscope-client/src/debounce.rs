//! Trailing-edge debouncing of search input.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::trace;

/// Callback invoked with the committed search text.
pub type CommitFn = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Default)]
struct TimerState {
    /// Bumped on every input; a timer only fires if it still holds the
    /// latest generation.
    generation: u64,
    pending: bool,
    timer: Option<JoinHandle<()>>,
}

/// Coalesces a burst of search edits into one commit of the last text.
///
/// [`on_input`](Self::on_input) raises the pending flag immediately and
/// (re)starts the quiet-period timer. When the timer elapses without further
/// input, the commit callback runs once with the most recent text. Dropping
/// the debouncer or calling [`cancel`](Self::cancel) discards a scheduled
/// commit.
///
/// Timers are tokio tasks, so `on_input` must be called from within a tokio
/// runtime.
pub struct SearchDebouncer {
    quiet: Duration,
    commit: CommitFn,
    state: Arc<Mutex<TimerState>>,
}

impl SearchDebouncer {
    pub fn new<F>(quiet: Duration, commit: F) -> Self
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        Self {
            quiet,
            commit: Arc::new(commit),
            state: Arc::new(Mutex::new(TimerState::default())),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Record a search edit and reschedule the commit.
    pub fn on_input(&self, text: impl Into<String>) {
        let text = text.into();
        let mut state = lock(&self.state);
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.generation += 1;
        state.pending = true;

        let generation = state.generation;
        let quiet = self.quiet;
        let commit = Arc::clone(&self.commit);
        let shared = Arc::clone(&self.state);
        trace!(generation, "search input, commit rescheduled");
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            let fire = {
                let mut state = lock(&shared);
                if state.generation == generation && state.pending {
                    state.pending = false;
                    state.timer = None;
                    true
                } else {
                    false
                }
            };
            if fire {
                commit(text);
            }
        }));
    }

    /// Whether a commit is scheduled and has not fired yet.
    pub fn is_pending(&self) -> bool {
        lock(&self.state).pending
    }

    /// Discard any scheduled commit.
    pub fn cancel(&self) {
        let mut state = lock(&self.state);
        state.generation += 1;
        state.pending = false;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn lock(state: &Mutex<TimerState>) -> MutexGuard<'_, TimerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
