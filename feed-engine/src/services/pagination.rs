//! Pagination cursor and request staleness tracking.
//!
//! The cursor serializes page fetches through the `has_more && !is_loading`
//! gate: at most one page fetch is in flight, pages are never fetched out
//! of order, and the page number never decreases except on an explicit
//! reset. `RequestSequence` tags every fetch with a monotonic id so a
//! response superseded by a newer filter change can be discarded.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

/// Page cursor state machine.
///
/// `current_page` is the next page to fetch, starting at 1 after a reset.
/// A successful fetch records `total_pages`, recomputes `has_more` from the
/// page just fetched, and advances. A failed fetch keeps the page so
/// `retry()` re-issues the identical request.
#[derive(Debug, Clone)]
pub struct PaginationCursor {
    current_page: u32,
    total_pages: u32,
    has_more: bool,
    is_loading: bool,
}

impl Default for PaginationCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginationCursor {
    pub fn new() -> Self {
        Self {
            current_page: 1,
            total_pages: 0,
            has_more: true,
            is_loading: false,
        }
    }

    /// Gate a fetch. Returns the page to request, or `None` when the call
    /// must be a no-op (already loading, or nothing more to load).
    pub fn begin_fetch(&mut self) -> Option<u32> {
        if !self.has_more || self.is_loading {
            debug!(
                has_more = self.has_more,
                is_loading = self.is_loading,
                "page fetch gated; no-op"
            );
            return None;
        }
        self.is_loading = true;
        Some(self.current_page)
    }

    /// Record a successful response for the in-flight page
    pub fn complete_fetch(&mut self, total_pages: u32) {
        self.is_loading = false;
        self.total_pages = total_pages;
        self.has_more = self.current_page < total_pages;
        self.current_page = self.current_page.saturating_add(1);
    }

    /// Record a failed response; the page stays put for retry
    pub fn fail_fetch(&mut self) {
        self.is_loading = false;
    }

    /// Back to page 1 with everything to load. Invoked on mount and on
    /// every filter change.
    pub fn reset(&mut self) {
        self.current_page = 1;
        self.total_pages = 0;
        self.has_more = true;
        self.is_loading = false;
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }
}

/// Monotonic fetch ids. A response whose id is no longer the latest issued
/// is stale and must be discarded.
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: AtomicU64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next id, superseding all earlier ones
    pub fn next(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_latest(&self, id: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == id
    }
}
