//! Full-text search across a notes tree.
//!
//! Queries are trimmed and matched as case-insensitive literal substrings
//! against every note whose extension is recognised. [`search`] returns a lazy
//! [`NoteSearch`] iterator; [`run_search`] drives one to completion and reports
//! each hit to a [`SearchObserver`]. Both stop early once their
//! [`CancellationToken`] is cancelled.

use std::path::Path;

use jihou_core::{NoteSource, StoreError};
use thiserror::Error;

mod matcher;
mod note_search;

pub use matcher::{QueryMatcher, TextMatch};
pub use note_search::{search, CancellationToken, NoteSearch, SearchResult, SearchSummary};

/// Error conditions raised by a search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("cannot enumerate search root: {0}")]
    Root(#[source] StoreError),
}

/// Receives results as a search produces them.
pub trait SearchObserver {
    fn on_search_result(&mut self, result: &SearchResult);

    /// Called exactly once, after the last result or after cancellation.
    fn on_search_complete(&mut self, _summary: &SearchSummary) {}
}

impl SearchObserver for Vec<SearchResult> {
    fn on_search_result(&mut self, result: &SearchResult) {
        self.push(result.clone());
    }
}

/// Runs a search to completion, streaming each result to `observer`.
pub fn run_search<S, O>(
    source: &S,
    root: impl AsRef<Path>,
    query: &str,
    cancel: &CancellationToken,
    observer: &mut O,
) -> Result<SearchSummary, SearchError>
where
    S: NoteSource + ?Sized,
    O: SearchObserver + ?Sized,
{
    let mut search = search(source, root, query)?.with_cancellation(cancel.clone());
    for result in search.by_ref() {
        observer.on_search_result(&result);
    }
    let summary = search.summary();
    log::debug!(
        "search for {query:?} visited {} notes, {} matched",
        summary.files_visited,
        summary.files_matched
    );
    observer.on_search_complete(&summary);
    Ok(summary)
}

/// Collects every result of a search into a vector.
pub fn search_all<S>(
    source: &S,
    root: impl AsRef<Path>,
    query: &str,
) -> Result<Vec<SearchResult>, SearchError>
where
    S: NoteSource + ?Sized,
{
    Ok(search(source, root, query)?.collect())
}
