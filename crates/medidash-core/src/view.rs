//! Table state and the derived view built from cached rows.
//!
//! The visible page is always
//! `paginate(category_filter(search_filter(rows, term), category), page, size)`,
//! evaluated over read-only cache data. [`TableState`] owns the interactive
//! inputs and enforces the page-reset rule; [`ViewComposer`] memoizes the
//! filter pass so unrelated state changes only re-slice.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::debounce::{DEFAULT_SEARCH_DEBOUNCE, Debounce};
use crate::filter::{Categorized, Searchable, StatusFilter, search_needle};
use crate::pagination::{PageSize, page_count, paginate};

/// Synthetic row identity: ordinal position in the fetched payload.
///
/// Stable while filtering and paging the same payload; not stable across
/// refetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey(pub usize);

impl std::fmt::Display for RowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Interactive inputs of one table.
#[derive(Debug, Clone)]
pub struct TableState {
    search: Debounce<String>,
    category: StatusFilter,
    page_index: usize,
    page_size: PageSize,
}

impl Default for TableState {
    fn default() -> Self {
        Self::new()
    }
}

impl TableState {
    pub fn new() -> Self {
        Self::with_debounce(DEFAULT_SEARCH_DEBOUNCE)
    }

    pub fn with_debounce(delay: Duration) -> Self {
        Self {
            search: Debounce::new(String::new(), delay),
            category: StatusFilter::All,
            page_index: 0,
            page_size: PageSize::default(),
        }
    }

    /// A keystroke in the search box. Takes effect once it settles.
    pub fn type_search(&mut self, raw: impl Into<String>, now: Instant) {
        self.search.input(raw.into(), now);
    }

    /// Commits the search term immediately, bypassing the debounce.
    pub fn apply_search(&mut self, term: impl Into<String>) {
        let term = term.into();
        let changed = *self.search.current() != term;
        self.search = Debounce::new(term, self.search.delay());
        if changed {
            self.page_index = 0;
        }
    }

    /// Lets a pending search settle. Returns `true` when the effective term
    /// changed, in which case the page is back at 0.
    pub fn settle(&mut self, now: Instant) -> bool {
        match self.search.poll(now) {
            Some(term) => {
                tracing::trace!(term = %term, "Search term settled");
                self.page_index = 0;
                true
            }
            None => false,
        }
    }

    /// When a pending keystroke will settle.
    pub fn search_deadline(&self) -> Option<Instant> {
        self.search.deadline()
    }

    /// Switches tab. Returns `true` if it changed, resetting the page.
    pub fn set_category(&mut self, category: StatusFilter) -> bool {
        if self.category == category {
            return false;
        }
        self.category = category;
        self.page_index = 0;
        true
    }

    pub fn set_page(&mut self, page_index: usize) {
        self.page_index = page_index;
    }

    pub fn next_page(&mut self, page_count: usize) {
        if self.page_index + 1 < page_count {
            self.page_index += 1;
        }
    }

    pub fn prev_page(&mut self) {
        self.page_index = self.page_index.saturating_sub(1);
    }

    /// Changes rows per page and goes back to the first page.
    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.page_size = page_size;
        self.page_index = 0;
    }

    pub fn raw_search(&self) -> &str {
        self.search.raw()
    }

    /// The settled term the filter actually uses.
    pub fn search_term(&self) -> &str {
        self.search.current()
    }

    pub fn category(&self) -> StatusFilter {
        self.category
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }
}

/// One rendered page.
#[derive(Debug)]
pub struct ViewPage<'a, R> {
    pub rows: Vec<(RowKey, &'a R)>,
    /// Rows in the payload before filtering.
    pub total_rows: usize,
    /// Rows that survived both filters.
    pub total_matches: usize,
    pub page_index: usize,
    pub page_size: PageSize,
    pub page_count: usize,
}

impl<R> ViewPage<'_, R> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `"11–12 of 12"`
    pub fn range_label(&self) -> String {
        if self.rows.is_empty() {
            return format!("0–0 of {}", self.total_matches);
        }
        let from = self.page_index * self.page_size.get() + 1;
        let to = from + self.rows.len() - 1;
        format!("{from}–{to} of {}", self.total_matches)
    }
}

/// Indices of rows matching `term` and `category`, in payload order.
fn matching_indices<R: Searchable + Categorized>(
    rows: &[R],
    term: &str,
    category: StatusFilter,
) -> Vec<usize> {
    let needle = search_needle(term);
    rows.iter()
        .enumerate()
        .filter(|(_, row)| needle.as_deref().is_none_or(|n| row.matches_search(n)))
        .filter(|(_, row)| category.matches(row.category()))
        .map(|(index, _)| index)
        .collect()
}

fn page_from_indices<'a, R>(
    rows: &'a [R],
    matches: &[usize],
    page_index: usize,
    page_size: PageSize,
) -> ViewPage<'a, R> {
    ViewPage {
        rows: paginate(matches, page_index, page_size)
            .iter()
            .map(|&index| (RowKey(index), &rows[index]))
            .collect(),
        total_rows: rows.len(),
        total_matches: matches.len(),
        page_index,
        page_size,
        page_count: page_count(matches.len(), page_size),
    }
}

/// Unmemoized composition of search, category and pagination.
pub fn compose_view<'a, R: Searchable + Categorized>(
    rows: &'a [R],
    term: &str,
    category: StatusFilter,
    page_index: usize,
    page_size: PageSize,
) -> ViewPage<'a, R> {
    let matches = matching_indices(rows, term, category);
    page_from_indices(rows, &matches, page_index, page_size)
}

struct Memo<R> {
    data: Arc<Vec<R>>,
    term: String,
    category: StatusFilter,
    matches: Vec<usize>,
}

/// Memoizing composer for one table.
///
/// The filter pass is keyed on the payload's `Arc` identity, the settled
/// term and the category; page changes reuse the previous match list.
pub struct ViewComposer<R> {
    memo: Option<Memo<R>>,
    computations: u64,
}

impl<R> Default for ViewComposer<R> {
    fn default() -> Self {
        Self {
            memo: None,
            computations: 0,
        }
    }
}

impl<R: Searchable + Categorized> ViewComposer<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compose<'a>(&mut self, data: &'a Arc<Vec<R>>, state: &TableState) -> ViewPage<'a, R> {
        let term = state.search_term();
        let category = state.category();

        let fresh = self.memo.as_ref().is_some_and(|memo| {
            Arc::ptr_eq(&memo.data, data) && memo.term == term && memo.category == category
        });

        if !fresh {
            self.computations += 1;
            self.memo = Some(Memo {
                data: Arc::clone(data),
                term: term.to_string(),
                category,
                matches: matching_indices(data, term, category),
            });
        }

        let matches = self
            .memo
            .as_ref()
            .map(|memo| memo.matches.as_slice())
            .unwrap_or_default();
        page_from_indices(data, matches, state.page_index(), state.page_size())
    }

    /// Number of full filter passes run so far.
    pub fn computations(&self) -> u64 {
        self.computations
    }
}
