//! In-flight speculative fetch bookkeeping.

use leadscope_core::{PageNumber, SelectionTriple};
use std::collections::BTreeSet;

/// Generation counter for a [`PrefetchRegistry`]. Bumped on every reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrefetchEpoch(u64);

impl PrefetchEpoch {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Pages currently being fetched in the background for one selection
/// triple.
///
/// Background fetches are never aborted. Instead, a reset moves the registry
/// to a new epoch and completions still carrying the old epoch are refused
/// by [`complete`](Self::complete).
#[derive(Debug, Clone, Default)]
pub struct PrefetchRegistry {
    triple: SelectionTriple,
    epoch: u64,
    in_flight: BTreeSet<PageNumber>,
}

impl PrefetchRegistry {
    pub fn new(triple: SelectionTriple) -> Self {
        Self {
            triple,
            epoch: 0,
            in_flight: BTreeSet::new(),
        }
    }

    pub fn triple(&self) -> &SelectionTriple {
        &self.triple
    }

    pub fn epoch(&self) -> PrefetchEpoch {
        PrefetchEpoch(self.epoch)
    }

    pub fn is_current(&self, epoch: PrefetchEpoch) -> bool {
        epoch.0 == self.epoch
    }

    /// Abandon every in-flight page and rescope to `triple`.
    pub fn reset(&mut self, triple: SelectionTriple) -> PrefetchEpoch {
        self.triple = triple;
        self.epoch += 1;
        self.in_flight.clear();
        self.epoch()
    }

    pub fn contains(&self, page: PageNumber) -> bool {
        self.in_flight.contains(&page)
    }

    /// Mark `page` as in flight. Returns `false` if it already was.
    pub fn insert(&mut self, page: PageNumber) -> bool {
        self.in_flight.insert(page)
    }

    /// Record the completion of a fetch registered under `epoch`.
    ///
    /// Returns `true` only when the epoch is still current and the page was
    /// in flight, i.e. when the caller may act on the result.
    pub fn complete(&mut self, epoch: PrefetchEpoch, page: PageNumber) -> bool {
        self.is_current(epoch) && self.in_flight.remove(&page)
    }

    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// In-flight pages in ascending order.
    pub fn pages(&self) -> Vec<PageNumber> {
        self.in_flight.iter().copied().collect()
    }
}
